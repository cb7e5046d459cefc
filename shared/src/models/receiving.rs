//! Receiving workflow models

use serde::{Deserialize, Serialize};

/// Receiving progress of one purchase line, as needed to derive the parent
/// purchase order's receiving status
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReceivingProgress {
    pub received_quantity: i32,
    pub is_received: bool,
}
