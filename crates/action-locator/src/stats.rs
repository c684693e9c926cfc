use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::Serialize;

/// Counters for one (logical name, candidate) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CandidateStats {
    pub success_count: u64,
    pub failure_count: u64,
}

impl CandidateStats {
    pub fn attempts(&self) -> u64 {
        self.success_count + self.failure_count
    }
}

/// Monotonic per-candidate probe counters.
#[derive(Debug, Default)]
pub struct AttemptStats {
    counters: DashMap<(String, String), CandidateStats>,
}

impl AttemptStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, logical_name: &str, candidate: &str) {
        self.counters
            .entry((logical_name.to_string(), candidate.to_string()))
            .or_default()
            .success_count += 1;
    }

    pub fn record_failure(&self, logical_name: &str, candidate: &str) {
        self.counters
            .entry((logical_name.to_string(), candidate.to_string()))
            .or_default()
            .failure_count += 1;
    }

    /// `None` means the candidate was never probed under this name.
    pub fn get(&self, logical_name: &str, candidate: &str) -> Option<CandidateStats> {
        self.counters
            .get(&(logical_name.to_string(), candidate.to_string()))
            .map(|entry| *entry.value())
    }

    pub fn for_name(&self, logical_name: &str) -> BTreeMap<String, CandidateStats> {
        self.counters
            .iter()
            .filter(|entry| entry.key().0 == logical_name)
            .map(|entry| (entry.key().1.clone(), *entry.value()))
            .collect()
    }

    /// Nested view keyed by logical name, then candidate.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, CandidateStats>> {
        let mut out: BTreeMap<String, BTreeMap<String, CandidateStats>> = BTreeMap::new();
        for entry in self.counters.iter() {
            let (name, candidate) = entry.key();
            out.entry(name.clone())
                .or_default()
                .insert(candidate.clone(), *entry.value());
        }
        out
    }

    pub fn total_attempts(&self) -> u64 {
        self.counters.iter().map(|entry| entry.value().attempts()).sum()
    }
}
