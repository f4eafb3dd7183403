//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`UnknownOwner`] thrown when a child references an owner that is not in
//!   the owner list.
//! - [`WeightExceedsInitial`] thrown when a bag holds more than it was bought
//!   with.
//! - [`InvalidAmount`] thrown when user input is not a valid amount.
//! - [`InsufficientStock`] thrown when consuming more than what is left.
//!
//!  [`UnknownOwner`]: EngineError::UnknownOwner
//!  [`WeightExceedsInitial`]: EngineError::WeightExceedsInitial
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InsufficientStock`]: EngineError::InsufficientStock
use api_types::Id;
use rust_decimal::Decimal;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("child {child} references unknown owner {owner}")]
    UnknownOwner { child: Id, owner: Id },
    #[error("coffee {id}: current weight {current}g exceeds initial weight {initial}g")]
    WeightExceedsInitial {
        id: Id,
        current: Decimal,
        initial: Decimal,
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient stock: requested {requested}g, available {available}g")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },
}
