//! Session-scoped cache of cleaning plans keyed by dataset content.

use crate::export::to_csv_string;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Content fingerprint of a dataset.
///
/// Two frames with the same column names, dtypes and values (in the same
/// order) share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetKey([u8; 32]);

impl DatasetKey {
    pub fn of(df: &DataFrame) -> PolarsResult<Self> {
        let mut hasher = blake3::Hasher::new();
        for column in df.get_columns() {
            hasher.update(column.name().as_bytes());
            hasher.update(b"\x1f");
            hasher.update(column.dtype().to_string().as_bytes());
            hasher.update(b"\x1e");
        }
        hasher.update(to_csv_string(df)?.as_bytes());
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Short hex form for logs.
    pub fn short(&self) -> String {
        self.0[..6].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Plans already obtained during this session.
///
/// The cache is created with the session and dropped with it; nothing is
/// persisted.
#[derive(Debug, Default)]
pub struct PlanCache {
    entries: HashMap<DatasetKey, String>,
    stats: CacheStats,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a plan, counting the hit or miss.
    pub fn get(&mut self, key: &DatasetKey) -> Option<&str> {
        match self.entries.get(key) {
            Some(plan) => {
                self.stats.hits += 1;
                debug!(key = %key.short(), "Plan cache hit");
                Some(plan.as_str())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: DatasetKey, plan: impl Into<String>) {
        self.entries.insert(key, plan.into());
    }

    pub fn contains(&self, key: &DatasetKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
