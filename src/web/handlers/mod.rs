//! Request handlers, one module per area of the application.

pub mod auth;
pub mod ledger;
pub mod registers;
pub mod reports;
pub mod users;

use chrono::NaiveDate;

/// Current calendar day in the server's time zone.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
