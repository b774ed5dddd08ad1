//! Storage types shared across modules

use serde::{Deserialize, Serialize};

/// Outbound message counts by delivery status over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStatusCounts {
    pub sent: u64,
    pub failed: u64,
    pub pending: u64,
}

impl MessageStatusCounts {
    #[must_use]
    pub fn health(&self) -> outreach_core::PipelineHealth {
        outreach_core::PipelineHealth::from_counts(self.sent, self.failed, self.pending)
    }
}
