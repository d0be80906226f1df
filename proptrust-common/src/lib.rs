//! # PropTrust Common Library
//!
//! Shared code for the PropTrust verification services:
//! - Error taxonomy and result type
//! - Engine configuration (environment-driven)
//! - Core domain types (document type, risk level, fingerprint)
//! - Clock and id-generation capabilities

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
