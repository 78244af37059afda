//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod daily_register;
pub mod ledger_entry;
pub mod user;
pub mod withdrawal;

// Re-export specific types to avoid conflicts
pub use daily_register::{
    Column as DailyRegisterColumn, Entity as DailyRegister, Model as DailyRegisterModel,
    RegisterStatus,
};
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, EntryType, Model as LedgerEntryModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
pub use withdrawal::{Column as WithdrawalColumn, Entity as Withdrawal, Model as WithdrawalModel};
