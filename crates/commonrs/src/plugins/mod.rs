// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resource loader plugins
//!
//! A specifier of the form `prefix!resource` is routed to the loader
//! registered under `prefix`. The resource is resolved like a module path but
//! without an extension, and the loader's result is memoized per
//! `(prefix, canonical resource path)`, so `json!./data.json` and
//! `json!data.json` share one invocation when they name the same file.
//!
//! A loader is either native (any [`ResourceLoader`]) or a loader module: a
//! file executed once through the module loader whose exports must be a
//! [`Value::loader`].

mod builtin;

pub use builtin::{JsonLoader, TextLoader};

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{LoaderError, Result};
use crate::module_system::cache::OnceMap;
use crate::module_system::context::Unit;
use crate::module_system::{PluginSpecifier, Require};
use crate::value::Value;

/// Transforms a resolved resource into a value
pub trait ResourceLoader: Send + Sync {
    /// Load the resource at the canonical path `resource`
    fn load(&self, resource: &Path, require: Require<'_>) -> anyhow::Result<Value>;
}

impl<T: ResourceLoader + ?Sized> ResourceLoader for Arc<T> {
    fn load(&self, resource: &Path, require: Require<'_>) -> anyhow::Result<Value> {
        (**self).load(resource, require)
    }
}

/// Loader backed by a closure, see [`loader_fn`]
pub struct LoaderFn<F>(F);

/// Use a closure as a resource loader
pub fn loader_fn<F>(f: F) -> LoaderFn<F>
where
    F: Fn(&Path, Require<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    LoaderFn(f)
}

impl<F> ResourceLoader for LoaderFn<F>
where
    F: Fn(&Path, Require<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn load(&self, resource: &Path, require: Require<'_>) -> anyhow::Result<Value> {
        (self.0)(resource, require)
    }
}

/// Where a plugin's loader comes from
#[derive(Clone)]
pub enum PluginSource {
    /// Loader object living in the host program
    Native(Arc<dyn ResourceLoader>),
    /// Module file exporting a loader
    Module(PathBuf),
}

impl std::fmt::Debug for PluginSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginSource::Native(_) => write!(f, "Native(..)"),
            PluginSource::Module(path) => write!(f, "Module({})", path.display()),
        }
    }
}

/// Prefix → loader mapping plus the per-resource result cache
pub struct PluginRegistry {
    entries: DashMap<String, PluginSource>,
    results: OnceMap<(String, PathBuf), Value>,
}

impl PluginRegistry {
    /// Create a registry with no plugins
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            results: OnceMap::new(),
        }
    }

    /// Create a registry with the bundled `json` and `text` loaders
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("json", PluginSource::Native(Arc::new(JsonLoader)));
        registry.register("text", PluginSource::Native(Arc::new(TextLoader)));
        registry
    }

    /// Register a loader under `prefix`.
    ///
    /// Results cached for an earlier loader with the same prefix are dropped.
    pub fn register(&self, prefix: impl Into<String>, source: PluginSource) -> Option<PluginSource> {
        let prefix = prefix.into();
        debug!(prefix = %prefix, source = ?source, "registering plugin");
        let previous = self.entries.insert(prefix.clone(), source);
        if previous.is_some() {
            self.results.retain(|(cached, _)| *cached != prefix);
        }
        previous
    }

    /// Remove the loader registered under `prefix`
    pub fn unregister(&self, prefix: &str) -> Option<PluginSource> {
        let removed = self.entries.remove(prefix).map(|(_, source)| source);
        if removed.is_some() {
            self.results.retain(|(cached, _)| cached != prefix);
        }
        removed
    }

    /// Get the loader registered under `prefix`
    pub fn get(&self, prefix: &str) -> Option<PluginSource> {
        self.entries.get(prefix).map(|entry| entry.value().clone())
    }

    /// Registered prefixes, sorted
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        prefixes.sort();
        prefixes
    }

    /// Load `prefix!resource`
    pub fn dispatch(&self, plugin: PluginSpecifier<'_>, require: Require<'_>) -> Result<Value> {
        let source = self
            .get(plugin.prefix)
            .ok_or_else(|| LoaderError::unregistered_plugin(plugin.prefix, plugin.resource))?;

        let engine = require.engine();
        let context = require.context();
        let resource = engine
            .resolver()
            .resolve(plugin.resource, "", context)
            .ok_or_else(|| {
                LoaderError::unresolvable(plugin.resource, context.relative_root().as_deref())
            })?;

        let key = (plugin.prefix.to_string(), resource.clone());
        if let Some(value) = self.results.get(&key) {
            trace!(prefix = plugin.prefix, resource = %resource.display(), "plugin cache hit");
            return Ok(value);
        }

        let unit = Unit::Plugin(plugin.prefix.to_string(), resource.clone());
        context.ensure_not_loading(&unit)?;

        self.results.get_or_try_init(key, || {
            // The resource is loading from here on, loader module included
            let _loading = context.enter(None, unit);
            let loader = match source {
                PluginSource::Native(loader) => loader,
                PluginSource::Module(path) => load_loader_module(plugin.prefix, &path, require)?,
            };

            let _dir = context.within(resource.parent());
            debug!(prefix = plugin.prefix, resource = %resource.display(), "invoking plugin");
            loader
                .load(&resource, require)
                .map_err(LoaderError::from_execution)
        })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute a loader module (once, like any module) and take its loader export
fn load_loader_module(
    prefix: &str,
    path: &Path,
    require: Require<'_>,
) -> Result<Arc<dyn ResourceLoader>> {
    let uri = path.canonicalize().map_err(|_| {
        LoaderError::unresolvable(
            path.display().to_string(),
            require.context().relative_root().as_deref(),
        )
    })?;

    let exports = require.engine().load_module(uri, require)?;
    exports.as_loader().ok_or_else(|| LoaderError::InvalidPlugin {
        prefix: prefix.to_string(),
        reason: format!(
            "module '{}' exports a {} instead of a resource loader",
            path.display(),
            exports.type_of()
        ),
    })
}
