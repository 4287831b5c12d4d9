// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use std::path::Path;
use thiserror::Error;

/// Result type for module loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while resolving or loading modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No base path or context directory yields a match for the specifier
    #[error("Unresolvable module '{specifier}' (resolving from '{context}')")]
    UnresolvableModule {
        /// Specifier as written by the caller
        specifier: String,
        /// Context directory that was active when resolution failed
        context: String,
    },

    /// Specifier uses a plugin prefix with no registered loader
    #[error("Unregistered plugin '{prefix}' (requested resource '{resource}')")]
    UnregisteredPlugin {
        /// Plugin prefix
        prefix: String,
        /// Resource path following the `!`
        resource: String,
    },

    /// A unit was required again while it was still executing
    #[error("Circular require detected: {chain}")]
    CircularRequire {
        /// Units on the loading chain, outermost first
        chain: String,
    },

    /// Plugin module did not export a resource loader
    #[error("Invalid plugin '{prefix}': {reason}")]
    InvalidPlugin {
        /// Plugin prefix
        prefix: String,
        /// Reason for failure
        reason: String,
    },

    /// Module body, definition factory or plugin loader failed
    #[error(transparent)]
    Execution(anyhow::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl LoaderError {
    /// Create an unresolvable module error
    pub fn unresolvable(specifier: impl Into<String>, context: Option<&Path>) -> Self {
        Self::UnresolvableModule {
            specifier: specifier.into(),
            context: context
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "<no base path>".to_string()),
        }
    }

    /// Create an unregistered plugin error
    pub fn unregistered_plugin(prefix: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::UnregisteredPlugin {
            prefix: prefix.into(),
            resource: resource.into(),
        }
    }

    /// Wrap a failure raised by user code.
    ///
    /// Loader errors raised by a nested `require` travel through user code as
    /// `anyhow::Error`; they come back out as themselves, not as `Execution`.
    pub fn from_execution(err: anyhow::Error) -> Self {
        match err.downcast::<LoaderError>() {
            Ok(inner) => inner,
            Err(err) => Self::Execution(err),
        }
    }

    /// Returns true if this is an unresolvable module error
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Self::UnresolvableModule { .. })
    }

    /// Returns true if this is an unregistered plugin error
    pub fn is_unregistered_plugin(&self) -> bool {
        matches!(self, Self::UnregisteredPlugin { .. })
    }
}
