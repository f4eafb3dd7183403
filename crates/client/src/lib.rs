//! REST client and state controller shared by the gift and coffee trackers.
//!
//! [`Client`] speaks to the backend; [`Controller`] holds the lists and
//! summary of one [`Tracker`] and reloads them after every change.

pub use api::{Client, DEFAULT_BASE_URL};
pub use controller::{
    Confirm, Controller, Notice, NoticeLevel, Outcome, Screen, TrackerState,
};
pub use error::{ClientError, Result};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use tracker::{BudgetParams, CoffeeTracker, GiftTracker, Tracker};

mod api;
mod controller;
mod error;
mod token;
mod tracker;
