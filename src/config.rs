//! Store configuration

/// Settings for the memory-resident sale store.
///
/// The backing sled database is always opened as temporary, so nothing set
/// here makes the store durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub cache_capacity: u64, // bytes
    pub id_prefix: String,   // bech32 human readable part for sale ids
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 64 * 1024 * 1024,
            id_prefix: "sale_".into(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }
    pub fn set_id_prefix(mut self, prefix: &str) -> Self {
        self.id_prefix = prefix.to_string();
        self
    }

    pub(crate) fn to_sled(&self) -> sled::Config {
        sled::Config::new()
            .temporary(true)
            .cache_capacity(self.cache_capacity)
            .flush_every_ms(None)
    }
}
