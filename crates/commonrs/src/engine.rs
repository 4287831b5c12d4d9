// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The engine - `define()` and `require()`

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::{LoaderError, Result};
use crate::executor::{ModuleExecutor, NativeExecutor};
use crate::module_system::{
    DefinitionRegistry, ModuleLoader, ModuleRecord, ModuleResolver, ModuleScope, PluginSpecifier,
    Require, ResolutionContext,
};
use crate::plugins::{PluginRegistry, PluginSource, ResourceLoader};
use crate::value::Value;

/// Module resolution and loading engine.
///
/// All registries and caches live as long as the engine. The engine is
/// `Send + Sync`; concurrent first requests for the same module, definition
/// or plugin resource execute it once.
///
/// ```rust,ignore
/// use commonrs::{Engine, EngineConfig, NativeExecutor};
///
/// let executor = NativeExecutor::new().with_module("/config", |scope| {
///     scope.export("port", 8080);
///     Ok(())
/// });
/// let engine = Engine::new(EngineConfig::new("app"), executor);
/// let config = engine.require("config")?;
/// ```
pub struct Engine {
    config: RwLock<Arc<EngineConfig>>,
    executor: Arc<dyn ModuleExecutor>,
    resolver: ModuleResolver,
    modules: ModuleLoader,
    definitions: DefinitionRegistry,
    plugins: PluginRegistry,
}

impl Engine {
    /// Create an engine with the bundled plugins registered
    pub fn new(config: EngineConfig, executor: impl ModuleExecutor + 'static) -> Self {
        Self::builder().config(config).executor(executor).build()
    }

    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Configuration snapshot
    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.read().clone()
    }

    /// Update the configuration.
    ///
    /// Takes effect for the next top-level call. Specifiers already resolved
    /// keep their old result for the same extension, including misses; a new
    /// base path or index name only applies to lookups not seen before.
    pub fn configure(&self, update: impl FnOnce(&mut EngineConfig)) {
        let mut guard = self.config.write();
        let mut config = (**guard).clone();
        update(&mut config);
        debug!(?config, "engine reconfigured");
        *guard = Arc::new(config);
    }

    /// Register a factory under `id`, replacing any earlier one and its result
    pub fn define<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn(&mut ModuleScope<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.definitions.define(id, Arc::new(factory));
    }

    /// Check if `id` has a `define()` registration
    pub fn is_defined(&self, id: &str) -> bool {
        self.definitions.contains(id)
    }

    /// Load a definition, plugin resource or module
    #[instrument(level = "debug", skip(self))]
    pub fn require(&self, specifier: &str) -> Result<Value> {
        let context = ResolutionContext::new(self.config());
        self.require_in(specifier, &context)
    }

    /// Resolve a specifier to a module path without executing anything
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let context = ResolutionContext::new(self.config());
        self.resolve_in(specifier, &context)
    }

    /// Check whether a specifier resolves to a module file
    pub fn exists(&self, specifier: &str) -> bool {
        self.resolve(specifier).is_some()
    }

    /// Register a native loader for `prefix!resource` specifiers
    pub fn register_plugin(&self, prefix: impl Into<String>, loader: impl ResourceLoader + 'static) {
        self.plugins
            .register(prefix, PluginSource::Native(Arc::new(loader)));
    }

    /// Register a loader module for `prefix!resource` specifiers.
    ///
    /// The file is executed once, on first use, and must export a
    /// [`Value::loader`].
    pub fn register_plugin_module(&self, prefix: impl Into<String>, path: impl Into<PathBuf>) {
        self.plugins
            .register(prefix, PluginSource::Module(path.into()));
    }

    /// Remove a plugin, returns true if it was registered
    pub fn unregister_plugin(&self, prefix: &str) -> bool {
        self.plugins.unregister(prefix).is_some()
    }

    /// Registered plugin prefixes, sorted
    pub fn plugin_prefixes(&self) -> Vec<String> {
        self.plugins.prefixes()
    }

    /// Modules executed so far, ordered by id; modules still executing are not listed
    pub fn modules(&self) -> Vec<ModuleRecord> {
        self.modules.records()
    }

    /// Check if the module at a canonical path has been executed
    pub fn is_loaded(&self, uri: &Path) -> bool {
        self.modules.has(uri)
    }

    /// `require()` within an in-flight resolution.
    ///
    /// Definitions take precedence over plugins, which take precedence over
    /// the filesystem.
    pub(crate) fn require_in(&self, specifier: &str, context: &ResolutionContext) -> Result<Value> {
        let require = Require::new(self, context);

        if let Some(definition) = self.definitions.get(specifier) {
            return self.definitions.resolve(specifier, &definition, require);
        }

        if let Some(plugin) = PluginSpecifier::parse(specifier) {
            return self.plugins.dispatch(plugin, require);
        }

        let uri = self.resolve_in(specifier, context).ok_or_else(|| {
            LoaderError::unresolvable(specifier, context.relative_root().as_deref())
        })?;
        self.load_module(uri, require)
    }

    /// Resolve with the configured module extension
    pub(crate) fn resolve_in(&self, specifier: &str, context: &ResolutionContext) -> Option<PathBuf> {
        let extension = &context.config().module_extension;
        self.resolver.resolve(specifier, extension, context)
    }

    pub(crate) fn load_module(&self, uri: PathBuf, require: Require<'_>) -> Result<Value> {
        self.modules
            .load(uri, require, self.executor.as_ref())
            .map(|record| record.exports)
    }

    pub(crate) fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }
}

/// Builder for [`Engine`]
pub struct EngineBuilder {
    config: EngineConfig,
    executor: Option<Arc<dyn ModuleExecutor>>,
    builtin_plugins: bool,
    plugins: Vec<(String, PluginSource)>,
}

impl EngineBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            executor: None,
            builtin_plugins: true,
            plugins: Vec::new(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the module executor, a [`NativeExecutor`] with no bodies by default
    pub fn executor(mut self, executor: impl ModuleExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Skip registering the bundled `json` and `text` plugins
    pub fn without_builtin_plugins(mut self) -> Self {
        self.builtin_plugins = false;
        self
    }

    /// Register a native plugin
    pub fn plugin(mut self, prefix: impl Into<String>, loader: impl ResourceLoader + 'static) -> Self {
        self.plugins
            .push((prefix.into(), PluginSource::Native(Arc::new(loader))));
        self
    }

    /// Register a loader module plugin
    pub fn plugin_module(mut self, prefix: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.plugins
            .push((prefix.into(), PluginSource::Module(path.into())));
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        let plugins = if self.builtin_plugins {
            PluginRegistry::with_builtins()
        } else {
            PluginRegistry::new()
        };
        for (prefix, source) in self.plugins {
            plugins.register(prefix, source);
        }

        Engine {
            config: RwLock::new(Arc::new(self.config)),
            executor: self
                .executor
                .unwrap_or_else(|| Arc::new(NativeExecutor::new())),
            resolver: ModuleResolver::new(),
            modules: ModuleLoader::new(),
            definitions: DefinitionRegistry::new(),
            plugins,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
