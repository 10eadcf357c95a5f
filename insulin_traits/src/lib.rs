pub mod clock;

pub use clock::{Clock, FixedClock, LocalClock, MINUTES_PER_DAY};

/// Flat, string-keyed durable storage. Values are opaque strings (JSON in practice).
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(
        &mut self,
        key: &str,
        value: String,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn remove(&mut self, key: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
