//! Named counter registry.
//!
//! Counters are created at zero on first reference and only ever
//! incremented. Increments are lock-free atomics; the name table is
//! behind a read-mostly lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

/// Where check instrumentation lands.
pub trait InstrumentationSink: Send + Sync {
    /// Get the counter called `name`, creating it at zero if needed.
    fn counter(&self, name: &str) -> Arc<Counter>;
}

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Process-lifetime counter table. Cheap to clone; clones share counters.
#[derive(Debug, Clone, Default)]
pub struct CounterRegistry {
    counters: Arc<RwLock<HashMap<String, Arc<Counter>>>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, if it has ever been referenced.
    pub fn get(&self, name: &str) -> Option<u64> {
        let counters = self.counters.read().expect("counter registry lock");
        counters.get(name).map(|c| c.get())
    }

    /// All counters sorted by name.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let counters = self.counters.read().expect("counter registry lock");
        let mut out: Vec<(String, u64)> = counters
            .iter()
            .map(|(name, c)| (name.clone(), c.get()))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn len(&self) -> usize {
        self.counters.read().expect("counter registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InstrumentationSink for CounterRegistry {
    fn counter(&self, name: &str) -> Arc<Counter> {
        {
            let counters = self.counters.read().expect("counter registry lock");
            if let Some(c) = counters.get(name) {
                return c.clone();
            }
        }

        let mut counters = self.counters.write().expect("counter registry lock");
        counters
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(counter = %name, "registered counter");
                Arc::new(Counter::default())
            })
            .clone()
    }
}
