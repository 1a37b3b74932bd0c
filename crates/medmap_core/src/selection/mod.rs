//! Selection state for one map session.
//!
//! The store is the single source of truth for "what is selected"; every
//! other component reads snapshots delivered through subscriptions.

pub mod store;

pub use store::{
    SelectionCommand, SelectionError, SelectionSnapshot, SelectionStore, SubscriptionId,
    ToggleOutcome,
};
