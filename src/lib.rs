//! Wishwall: birthday wishes service
//!
//! Stores text wishes (with optional attachments) and video wishes for a
//! celebration website. Records live in SQLite, uploaded files in a blob
//! store that hands out public download URLs, and everything is exposed
//! over a small JSON/multipart HTTP API.

pub mod api;
pub mod blob_store;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod server;
pub mod wishes;
