//! HTTP request handlers

pub mod ar;
pub mod closing;
pub mod deliveries;
pub mod expenses;
pub mod finance;
pub mod health;
pub mod purchases;
pub mod sales;
