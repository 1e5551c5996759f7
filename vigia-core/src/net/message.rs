//! Outgoing broker messages

use heapless::String;

use crate::config::MAX_TOPIC_LEN;

/// Maximum payload length in bytes
pub const MAX_PAYLOAD_LEN: usize = 256;

/// A message waiting for transmission
///
/// Plain value, copied into the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutgoingMessage {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: String<MAX_PAYLOAD_LEN>,
}

impl OutgoingMessage {
    /// Build a message, truncating topic and payload to their bounds
    pub fn new(topic: &str, payload: &str) -> Self {
        Self {
            topic: truncated(topic),
            payload: truncated(payload),
        }
    }
}

/// Copy at most `N` bytes of `s`, cutting at a character boundary
pub fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Fits by construction
    let _ = out.push_str(&s[..end]);
    out
}
