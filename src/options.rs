//! Tuning knobs shared by all result variants.

use chrono::{FixedOffset, Offset, Utc};

/// Default rows per driver fetch round-trip.
pub const DEFAULT_FETCH_SIZE: u32 = 100;
/// Default read size for LOBs whose locator advertises none.
pub const DEFAULT_LOB_CHUNK_SIZE: u32 = 8192;
/// Default capacity of the async row stream channel.
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// Options for a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultOptions {
    /// Rows requested per fetch from a driver backend.
    pub fetch_size: u32,
    /// Zone treated as the process default when decoding temporal values.
    pub default_zone: FixedOffset,
    /// LOB read size when the backend does not advertise a chunk size.
    pub lob_chunk_size: u32,
    /// Rows buffered ahead by the async row stream adapter.
    pub stream_buffer: usize,
}

impl ResultOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self {
            fetch_size: DEFAULT_FETCH_SIZE,
            default_zone: Utc.fix(),
            lob_chunk_size: DEFAULT_LOB_CHUNK_SIZE,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Set the fetch size. Zero is treated as one.
    ///
    /// # Example
    ///
    /// ```
    /// use shard_query_result::ResultOptions;
    ///
    /// let options = ResultOptions::new().with_fetch_size(500);
    /// assert_eq!(options.fetch_size, 500);
    /// ```
    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = fetch_size.max(1);
        self
    }

    pub fn with_default_zone(mut self, zone: FixedOffset) -> Self {
        self.default_zone = zone;
        self
    }

    pub fn with_lob_chunk_size(mut self, chunk_size: u32) -> Self {
        self.lob_chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }
}

impl Default for ResultOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ResultOptions::default();
        assert_eq!(options.fetch_size, 100);
        assert_eq!(options.default_zone.local_minus_utc(), 0);
        assert_eq!(options.lob_chunk_size, 8192);
        assert_eq!(options.stream_buffer, 16);
    }

    #[test]
    fn test_zero_is_clamped() {
        let options = ResultOptions::new()
            .with_fetch_size(0)
            .with_lob_chunk_size(0)
            .with_stream_buffer(0);
        assert_eq!(options.fetch_size, 1);
        assert_eq!(options.lob_chunk_size, 1);
        assert_eq!(options.stream_buffer, 1);
    }
}
