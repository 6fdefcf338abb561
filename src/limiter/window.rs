use std::collections::HashMap;
use std::hash::Hash;

/// Admission count for one fixed window.
#[derive(Debug, Clone)]
pub struct WindowCounter {
    limit: u32,
    count: u32,
}

impl WindowCounter {
    pub fn new(limit: u32) -> Self {
        Self { limit, count: 0 }
    }

    pub fn has_capacity(&self) -> bool {
        self.count < self.limit
    }

    pub fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// One fixed-window counter per key. Keys are forgotten on reset.
#[derive(Debug, Clone)]
pub struct KeyedWindowCounter<K> {
    limit: u32,
    counts: HashMap<K, u32>,
}

impl<K: Eq + Hash + Clone> KeyedWindowCounter<K> {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: HashMap::new(),
        }
    }

    pub fn has_capacity(&self, key: &K) -> bool {
        self.count(key) < self.limit
    }

    pub fn increment(&mut self, key: &K) {
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }

    pub fn count(&self, key: &K) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn tracked_keys(&self) -> usize {
        self.counts.len()
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
