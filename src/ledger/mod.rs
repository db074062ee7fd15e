mod store;
mod types;

pub use store::{IgnoreSet, Ledger};
pub use types::{
    IgnoreFile, LedgerEntry, LedgerFile, StateConfig, StoreError, STATE_VERSION,
};
