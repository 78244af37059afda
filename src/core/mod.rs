//! Business logic, independent of the web layer.

/// Password hashing and login checks
pub mod auth;

/// Expense ledger kept by administrators
pub mod ledger;

/// BRL parsing and formatting
pub mod money;

/// Calendar days and date ranges
pub mod period;

/// Opening, closing and history of daily registers
pub mod register;

/// Period report: terminal takings, fee table and ledger pivot
pub mod report;

/// Daily summary of a closed register
pub mod summary;

/// Card and PIX terminals and their register columns
pub mod terminal;

/// User management
pub mod user;
