//! HTTP surface.
//!
//! Handlers are thin: they extract the caller, path and body, check the
//! caller's role, then hand off to a [`Database`] method.

pub mod custom_fields;
pub mod extract;
pub mod filter;
pub mod server;
pub mod tags;
pub mod views;

use crate::db::Database;
use std::sync::Arc;

pub use extract::{ApiJson, ApiQuery, CurrentUser, USER_HEADER};
pub use server::{ServerHandle, build_router, start_server};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}
