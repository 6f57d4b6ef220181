//! Event types shared between the broker and its subscribers.

use serde::{Deserialize, Serialize};

/// Notification topic family. Each topic is served by its own broker
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// A user's clipboard contents changed.
    Clipboard,
    /// A user's stored files changed.
    Files,
}

impl Topic {
    /// SSE event name emitted for this topic.
    pub fn sse_event(&self) -> &'static str {
        match self {
            Topic::Clipboard => "clipboard-update",
            Topic::Files => "file-update",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Clipboard => write!(f, "clipboard"),
            Topic::Files => write!(f, "files"),
        }
    }
}

/// A single notification delivered over a session's private channel.
///
/// The payload is intentionally tiny: receivers re-fetch state over the
/// regular API, the notice only tells them something changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    /// Which topic family the notice belongs to.
    pub topic: Topic,
    /// Opaque value forwarded from the publisher.
    pub value: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_event_names_are_distinct() {
        assert_ne!(Topic::Clipboard.sse_event(), Topic::Files.sse_event());
    }
}
