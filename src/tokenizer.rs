//! src/tokenizer.rs

/// Normalization policy applied to each whitespace-separated token.
///
/// `TrimEdges` strips leading and trailing characters that are neither
/// alphabetic nor an apostrophe, so interior punctuation survives
/// ("don't" stays intact). `StripAll` removes every non-alphabetic
/// character anywhere in the token.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenPolicy {
    #[default]
    #[serde(rename = "trim-edges")]
    TrimEdges,
    #[serde(rename = "strip-all")]
    StripAll,
}

/// Splits a line into normalized tokens: whitespace-separated, lowercased,
/// stripped per `policy`. Tokens that normalize to the empty string are
/// discarded. Total over any input, no error conditions.
pub fn tokenize(line: &str, policy: TokenPolicy) -> impl Iterator<Item = String> + '_ {
    line.split_whitespace().filter_map(move |raw| {
        let lowered = raw.to_lowercase();
        let token = match policy {
            TokenPolicy::TrimEdges => lowered
                .trim_matches(|c: char| !(c.is_alphabetic() || c == '\''))
                .to_string(),
            TokenPolicy::StripAll => lowered.chars().filter(|c| c.is_alphabetic()).collect(),
        };
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    })
}
