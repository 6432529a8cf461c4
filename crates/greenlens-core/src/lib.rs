//! GreenLens Core Library
//!
//! This crate provides the core functionality for GreenLens, including:
//! - Crisis scenario simulation (text generation, per-year image prompts, images)
//! - Product sustainability scans
//! - Provider clients (OpenAI-compatible chat completions, OpenAI images)
//! - Storage (SQLite with versioned migrations)
//! - Bearer-token authentication
//! - The axum HTTP API

pub mod api;
pub mod auth;
pub mod config;
pub mod crisis;
pub mod error;
pub mod image;
pub mod llm;
pub mod scan;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::auth::{Authenticator, User};
    pub use crate::config::Config;
    pub use crate::crisis::{CrisisSimulator, ScenarioEntry, Scenarios, Simulation};
    pub use crate::error::{Error, Result};
    pub use crate::image::{GeneratedImage, ImageGenerator};
    pub use crate::llm::{TextCompletion, TextGenerator};
    pub use crate::scan::{ScanRequest, ScanResult, ScanService};
    pub use crate::storage::Database;
}
