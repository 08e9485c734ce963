// Packetizer - fixed-size text chunking

use crate::domain::error::{DomainError, Result};

/// Splits text into ordered packets of `packet_size` characters.
///
/// Sizes are measured in `char`s so a packet never cuts a UTF-8 code point.
/// Concatenating the packets in order yields the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packetizer {
    packet_size: usize,
}

impl Packetizer {
    pub fn new(packet_size: usize) -> Result<Self> {
        if packet_size == 0 {
            return Err(DomainError::ValidationError(
                "packet size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { packet_size })
    }

    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    /// `ceil(len / packet_size)`, zero for empty text
    pub fn packet_count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.packet_size)
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut packets = Vec::with_capacity(self.packet_count(text));
        let mut current = String::new();
        let mut len = 0;

        for ch in text.chars() {
            current.push(ch);
            len += 1;
            if len == self.packet_size {
                packets.push(std::mem::take(&mut current));
                len = 0;
            }
        }
        if !current.is_empty() {
            packets.push(current);
        }

        packets
    }
}
