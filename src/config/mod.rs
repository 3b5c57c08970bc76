//! # Configuration Module
//!
//! This module handles daemon configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scorelink::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Session endpoint: {}", settings.session.endpoint);
//! ```

mod settings;

pub use settings::*;
