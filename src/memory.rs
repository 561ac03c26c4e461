//! src/memory.rs
use anyhow::Context;

/// Samples the current memory pressure as a used-to-total ratio in `[0, 1]`.
/// Injected into the combining mapper so spill decisions can be driven by a
/// deterministic fake in tests.
pub trait MemoryProbe {
    fn usage_ratio(&mut self) -> Result<f64, anyhow::Error>;
}

/// Reads the resident set size of this process (`VmRSS` in
/// `/proc/self/status`) against the machine total (`MemTotal` in
/// `/proc/meminfo`). Only available on Linux; elsewhere every sample fails
/// and the caller skips its spill check.
pub struct SystemMemoryProbe;

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self
    }

    fn read_kb(path: &str, key: &str) -> Result<u64, anyhow::Error> {
        let contents = std::fs::read_to_string(path).context(format!("Failed to read {path}"))?;
        for line in contents.lines() {
            if let Some(rest) = line.strip_prefix(key) {
                let value = rest
                    .trim_start_matches(':')
                    .split_whitespace()
                    .next()
                    .context(format!("Missing value for {key} in {path}"))?;
                return value
                    .parse::<u64>()
                    .context(format!("Failed to parse {key} from {path}"));
            }
        }
        anyhow::bail!("{key} not found in {path}")
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn usage_ratio(&mut self) -> Result<f64, anyhow::Error> {
        let rss_kb = Self::read_kb("/proc/self/status", "VmRSS")?;
        let total_kb = Self::read_kb("/proc/meminfo", "MemTotal")?;
        Ok(rss_kb as f64 / total_kb as f64)
    }
}

/// Always reports the same ratio.
pub struct FixedMemoryProbe(pub f64);

impl MemoryProbe for FixedMemoryProbe {
    fn usage_ratio(&mut self) -> Result<f64, anyhow::Error> {
        Ok(self.0)
    }
}

/// Replays a scripted sequence of ratios, repeating the last one once the
/// script runs out.
pub struct ScriptedMemoryProbe {
    ratios: Vec<f64>,
    next: usize,
}

impl ScriptedMemoryProbe {
    pub fn new(ratios: Vec<f64>) -> Self {
        Self { ratios, next: 0 }
    }
}

impl MemoryProbe for ScriptedMemoryProbe {
    fn usage_ratio(&mut self) -> Result<f64, anyhow::Error> {
        let index = self.next.min(self.ratios.len().saturating_sub(1));
        let ratio = *self
            .ratios
            .get(index)
            .context("ScriptedMemoryProbe has no ratios")?;
        self.next += 1;
        Ok(ratio)
    }
}

/// Fails every sample, for exercising the skip-on-error path.
pub struct FailingMemoryProbe;

impl MemoryProbe for FailingMemoryProbe {
    fn usage_ratio(&mut self) -> Result<f64, anyhow::Error> {
        anyhow::bail!("memory statistics unavailable")
    }
}
