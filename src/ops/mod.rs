pub mod check;
pub mod entry_ops;
pub mod error;
pub mod month_ops;
pub mod navigate;
pub mod registry;
pub mod search;
pub mod task_ops;
pub mod txn;
pub mod validate;
pub mod year_ops;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::StoreError;
