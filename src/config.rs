//! Configuration of the packet ingestion loop.
//!
//! The read size is a tuning knob only: partial packets are buffered across
//! reads, so any size of one byte or more yields the same book.

use crate::error::{Error, Result};
use crate::types::PACKET_SIZE;

/// Packet streams are read with this chunk size by default.
pub const DEFAULT_READ_SIZE: usize = 4096;

/// Settings for a [`Book`](crate::engine::Book).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookConfig {
    /// Maximum number of bytes requested from the stream per `load()`
    pub read_size: usize,

    /// Buy orders to preallocate tree storage for
    pub order_capacity: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            order_capacity: 0,
        }
    }
}

impl BookConfig {
    /// Set the read chunk size
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size;
        self
    }

    /// Set the preallocated order capacity
    pub fn with_order_capacity(mut self, order_capacity: usize) -> Self {
        self.order_capacity = order_capacity;
        self
    }

    /// Check the settings before a book is built on them.
    ///
    /// # Example
    ///
    /// ```
    /// use clob_index::BookConfig;
    ///
    /// assert!(BookConfig::default().validate().is_ok());
    /// assert!(BookConfig::default().with_read_size(0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.read_size == 0 {
            return Err(Error::InvalidReadSize {
                size: self.read_size,
            });
        }
        Ok(())
    }

    /// Buffer bytes needed: a pending partial packet plus one read chunk.
    pub(crate) fn buffer_len(&self) -> usize {
        PACKET_SIZE - 1 + self.read_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BookConfig::default();

        assert_eq!(config.read_size, DEFAULT_READ_SIZE);
        assert_eq!(config.order_capacity, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_read_size_is_whole_packets() {
        assert_eq!(DEFAULT_READ_SIZE % PACKET_SIZE, 0);
    }

    #[test]
    fn test_zero_read_size_rejected() {
        let err = BookConfig::default().with_read_size(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidReadSize { size: 0 }));
    }

    #[test]
    fn test_tiny_read_size_accepted() {
        let config = BookConfig::default().with_read_size(1);

        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_len(), PACKET_SIZE);
    }
}
