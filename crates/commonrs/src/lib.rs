// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # commonrs
//!
//! A synchronous, file-backed module resolution and loading engine with
//! CommonJS/AMD semantics.
//!
//! - `require()` resolves relative, absolute and bare specifiers against an
//!   ordered list of base paths, with directory-as-module support
//! - every canonical module file executes at most once; its exports are cached
//! - `define()` registers factories that bypass the filesystem
//! - `prefix!resource` specifiers are routed to pluggable resource loaders
//!   (`json` and `text` are bundled)
//!
//! What "executing a module" means is up to the [`ModuleExecutor`]. The
//! bundled [`NativeExecutor`] runs Rust closures registered under module ids.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use commonrs::{Engine, EngineConfig, NativeExecutor, Value};
//!
//! let executor = NativeExecutor::new()
//!     .with_module("/services/logger", |scope| {
//!         scope.module_mut().set_exports("[Logger]");
//!         Ok(())
//!     })
//!     .with_module("/app", |scope| {
//!         let logger = scope.require("./services/logger")?;
//!         scope.export("logger", logger);
//!         Ok(())
//!     });
//!
//! let engine = Engine::new(EngineConfig::new("/srv/app"), executor);
//! engine.define("settings", |_scope| Ok(Some(Value::from(10))));
//!
//! let app = engine.require("app")?;
//! let settings = engine.require("settings")?;
//! let data = engine.require("json!resources/data.json")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod module_system;
pub mod plugins;
pub mod value;

// Re-exports
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use error::{LoaderError, Result};
pub use executor::{FnExecutor, ModuleExecutor, NativeExecutor, executor_fn};
pub use module_system::{ModuleDescriptor, ModuleRecord, ModuleScope, Require};
pub use plugins::{JsonLoader, ResourceLoader, TextLoader, loader_fn};
pub use value::{NativeValue, Object, Value};

/// Version of the commonrs crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
