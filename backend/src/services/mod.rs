//! Business logic services for the Retail Back-Office Platform

pub mod closing;
pub mod codes;
pub mod deliveries;
pub mod expenses;
pub mod finance;
pub mod inventory;
pub mod ledger;
pub mod purchases;
pub mod receiving;
pub mod sales;

pub use closing::DayClosingService;
pub use deliveries::DeliveryService;
pub use expenses::ExpenseService;
pub use finance::FinanceService;
pub use ledger::LedgerService;
pub use purchases::PurchaseService;
pub use receiving::ReceivingService;
pub use sales::SaleService;
