//! Application state store.
//!
//! # Responsibility
//! - Hold the authoritative in-memory collections for one running instance.
//! - Bridge memory state and the persistence adapter.
//!
//! # Invariants
//! - Consumers hold an `AppStore` value; there is no process-global store in
//!   core.

pub mod app_store;

pub use app_store::{
    AppState, AppStore, ChangeOrigin, DocumentState, StoreChange, StoreListener, SubscriptionId,
};
