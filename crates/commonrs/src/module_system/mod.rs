// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS-style module system
//!
//! ## Resolution
//! - `./x`, `../x` resolve against the directory of the executing module
//! - `/x` and `x` are searched through the configured base paths, in order
//! - a directory resolves to its index file
//! - `prefix!resource` is handed to a plugin loader
//!
//! ## Loading
//! - each canonical file executes at most once, its exports are memoized
//! - `define()` factories run at most once per registration
//! - `module.exports` wins over the `exports` container

pub(crate) mod cache;
pub(crate) mod context;
mod definitions;
mod loader;
mod require;
mod resolver;
mod scope;
mod searcher;
mod specifier;

pub use cache::OnceMap;
pub use context::ResolutionContext;
pub use definitions::{Definition, DefinitionFactory, DefinitionRegistry};
pub use loader::{ModuleLoader, ModuleRecord};
pub use require::Require;
pub use resolver::{ModuleResolver, module_id};
pub use scope::{ModuleDescriptor, ModuleScope};
pub use searcher::ResourceSearcher;
pub use specifier::{PluginSpecifier, SpecifierKind};
