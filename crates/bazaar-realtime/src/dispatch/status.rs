//! Delivery status reported to message senders.

use serde::{Deserialize, Serialize};

/// Progress of a message from the sender's point of view.
///
/// Only ever appears on the wire. The store records `is_read`; everything
/// else is derived at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the server, not yet stored.
    Sending,
    /// Durably stored.
    Sent,
    /// Handed to at least one live recipient connection.
    Delivered,
    /// The recipient marked it read.
    Read,
    /// Rejected or could not be stored.
    Failed,
}

impl DeliveryStatus {
    /// Whether the status is terminal for the sender.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Read | Self::Failed)
    }
}
