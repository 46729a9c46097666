//! API module
//!
//! Contains HTTP request handlers for the contacts endpoint

pub mod contacts;

pub use contacts::{ContactService, SharedContactService};
