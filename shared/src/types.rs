//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Sales channel a day-closing checkpoint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingSource {
    Pos,
    Live,
}

impl ClosingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosingSource::Pos => "pos",
            ClosingSource::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pos" => Some(ClosingSource::Pos),
            "live" => Some(ClosingSource::Live),
            _ => None,
        }
    }
}

/// Ledger direction of a partner account entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "AR")]
    Ar,
    #[serde(rename = "AP")]
    Ap,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ar => "AR",
            Direction::Ap => "AP",
        }
    }
}

/// Counterparty kind for a partner account entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    Customer,
    Vendor,
}

impl PartnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerType::Customer => "customer",
            PartnerType::Vendor => "vendor",
        }
    }
}

/// Payment method buckets for day-closing aggregation
///
/// `cash`, `card` and `cod` match exactly; anything starting with
/// `transfer_` falls into the transfer bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentCategory {
    Cash,
    Card,
    Transfer,
    Cod,
}

/// Derived receiving progress of a purchase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceivingStatus {
    None,
    Partial,
    Completed,
}

impl ReceivingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceivingStatus::None => "none",
            ReceivingStatus::Partial => "partial",
            ReceivingStatus::Completed => "completed",
        }
    }
}

/// Document lifecycle status shared by sales and deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Confirmed,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Confirmed => "confirmed",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(DocumentStatus::Draft),
            "confirmed" => Some(DocumentStatus::Confirmed),
            "cancelled" => Some(DocumentStatus::Cancelled),
            _ => None,
        }
    }
}
