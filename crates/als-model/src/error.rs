//! Errors raised by the factorization model at lookup time.

use thiserror::Error;

/// Failures of a single `recommend` call.
///
/// None of these are fatal for the process: the caller reports them and
/// moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("user index {index} out of range for {users} trained users")]
    UserIndexOutOfRange { index: usize, users: usize },

    #[error("item index {index} out of range for {items} trained items")]
    ItemIndexOutOfRange { index: usize, items: usize },

    #[error("user row has {indices} indices but {values} values")]
    MalformedRow { indices: usize, values: usize },

    #[error("user factor system is not positive definite")]
    Singular,
}

pub type Result<T> = std::result::Result<T, ModelError>;
