//! src/reducer.rs
use crate::error::EngineError;
use crate::mapper::PartialCount;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Final index entry for one word: the complete per-file occurrence totals.
/// `BTreeMap` keeps filenames sorted, which makes the formatted output
/// reproducible across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordIndexEntry {
    pub word: String,
    pub per_file: BTreeMap<String, u64>,
}

impl WordIndexEntry {
    /// Renders `word<TAB>filename1:count1<TAB>filename2:count2`, fields
    /// tab-separated with no trailing separator; filenames appear in
    /// lexicographic order.
    pub fn format(&self) -> String {
        let mut line = self.word.clone();
        for (filename, count) in &self.per_file {
            write!(line, "\t{filename}:{count}").expect("writing to a String cannot fail");
        }
        line
    }
}

/// Merges one word's group of partial counts: counts sharing a filename are
/// summed, each filename appears at most once.
pub fn reduce_group(
    word: String,
    counts: impl IntoIterator<Item = PartialCount>,
) -> WordIndexEntry {
    let mut per_file: BTreeMap<String, u64> = BTreeMap::new();
    for partial in counts {
        *per_file.entry(partial.filename).or_insert(0) += partial.count;
    }
    WordIndexEntry { word, per_file }
}

/// Writes one formatted line per entry to the partition's output file.
pub fn write_partition(entries: &[WordIndexEntry], path: &Path) -> Result<(), EngineError> {
    let file = std::fs::File::create(path).map_err(|source| EngineError::OutputIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}", entry.format()).map_err(|source| EngineError::OutputIo {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.flush().map_err(|source| EngineError::OutputIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
