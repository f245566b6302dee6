//! Built-in stats collectors and the name table used to select them.

mod channels;
mod clients;
mod topics;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use channels::ChannelStats;
pub use clients::ClientStats;
pub use topics::TopicStats;

use crate::stats_collector::StatsCollector;

/// Builds a collector for the given metric namespace.
pub type CollectorConstructor = fn(&str) -> Arc<dyn StatsCollector>;

/// Maps collector names (the `<name>` in `stats.<name>`) to constructors.
///
/// Built once during startup wiring and handed to whatever selects the
/// enabled collectors; nothing reads it after the executor is assembled.
#[derive(Clone)]
pub struct CollectorTable {
    constructors: BTreeMap<&'static str, CollectorConstructor>,
}

impl CollectorTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// The table of built-in collectors: `topics`, `channels` and `clients`.
    pub fn builtin() -> Self {
        Self::new()
            .with("topics", |ns| Arc::new(TopicStats::new(ns)))
            .with("channels", |ns| Arc::new(ChannelStats::new(ns)))
            .with("clients", |ns| Arc::new(ClientStats::new(ns)))
    }

    /// Adds or replaces the constructor registered under `name`.
    pub fn with(mut self, name: &'static str, constructor: CollectorConstructor) -> Self {
        self.constructors.insert(name, constructor);
        self
    }

    /// Constructs the collector registered under `name`.
    pub fn build(&self, name: &str, namespace: &str) -> Option<Arc<dyn StatsCollector>> {
        self.constructors.get(name).map(|ctor| ctor(namespace))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }
}

impl Default for CollectorTable {
    fn default() -> Self {
        Self::builtin()
    }
}
