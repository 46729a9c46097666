//! Contacts Service Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod state;

use api::ContactService;
use app::App;
use state::StoreError;
use std::sync::Arc;

/// Path the contacts service is mounted on
pub const CONTACTS_PATH: &str = "/contacts";

/// Build an app with a freshly seeded contacts service mounted on `/contacts`
pub fn build_app(config: &config::ServerConfig) -> Result<App, StoreError> {
    let service = Arc::new(ContactService::new()?);
    Ok(App::new()
        .with_shutdown_grace(config.shutdown_grace)
        .handle(CONTACTS_PATH, service.into_method_router()))
}
