//! # Scholia Common Library
//!
//! Shared code for the Scholia annotation services including:
//! - Database pool setup, schema bootstrap and row models
//! - Comment entry documents and per-text field schemes
//! - Snapshot differ for revision history review
//! - Privilege tier access gate
//! - Configuration loading
//! - Error taxonomy

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod diff;
pub mod entry;
pub mod error;

pub use access::{authorize, Action, Tier};
pub use error::{Error, Result};
