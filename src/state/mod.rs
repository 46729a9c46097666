//! State management module
//!
//! Handles the contact model and the in-memory contact store

pub mod contact;
pub mod store;

pub use contact::Contact;
pub use store::{ContactStore, StoreError};
