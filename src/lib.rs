//! Taskhub library
//!
//! Multi-tenant task hierarchy storage with a scoped filter-and-group query
//! engine, saved views, tags and custom fields, served over HTTP.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod types;
