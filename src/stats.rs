//! Lineage count series recorded during counting runs.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-step totals of the two lineages, appended after each counted step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Stem-like cell totals, one entry per counted step.
    pub stc: Vec<usize>,
    /// Regular cell totals, one entry per counted step.
    pub rtc: Vec<usize>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the totals for one step.
    pub fn record(&mut self, stc: usize, rtc: usize) {
        self.stc.push(stc);
        self.rtc.push(rtc);
    }

    /// Number of counted steps.
    pub fn len(&self) -> usize {
        self.stc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stc.is_empty()
    }

    pub fn clear(&mut self) {
        self.stc.clear();
        self.rtc.clear();
    }

    /// Totals from the most recent counted step.
    pub fn latest(&self) -> Option<(usize, usize)> {
        match (self.stc.last(), self.rtc.last()) {
            (Some(&stc), Some(&rtc)) => Some((stc, rtc)),
            _ => None,
        }
    }

    /// Save the series to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load series from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_latest() {
        let mut counters = Counters::new();
        assert!(counters.is_empty());
        assert_eq!(counters.latest(), None);

        counters.record(1, 0);
        counters.record(2, 13);

        assert_eq!(counters.len(), 2);
        assert_eq!(counters.latest(), Some((2, 13)));
        assert_eq!(counters.stc, vec![1, 2]);
        assert_eq!(counters.rtc, vec![0, 13]);
    }

    #[test]
    fn json_roundtrip() {
        let mut counters = Counters::new();
        for i in 0..5 {
            counters.record(i, i * 10);
        }

        let path = std::env::temp_dir().join("oncogrid_counters_test.json");
        counters.save_json(&path).unwrap();
        let loaded = Counters::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(counters, loaded);
    }
}
