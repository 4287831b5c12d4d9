// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Definition registry for `define()`

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

use crate::error::{LoaderError, Result};
use crate::module_system::context::Unit;
use crate::module_system::require::Require;
use crate::module_system::scope::{ModuleDescriptor, ModuleScope};
use crate::value::Value;

/// Factory registered with `define()`.
///
/// It may fill the exports container, assign `module.exports`, or return a
/// value directly.
pub type DefinitionFactory =
    dyn Fn(&mut ModuleScope<'_>) -> anyhow::Result<Option<Value>> + Send + Sync;

/// One registration; re-registering replaces the whole entry, cached result included
pub struct Definition {
    factory: Arc<DefinitionFactory>,
    /// Held while the factory runs
    init: Mutex<()>,
    result: OnceLock<Value>,
}

impl Definition {
    fn new(factory: Arc<DefinitionFactory>) -> Self {
        Self {
            factory,
            init: Mutex::new(()),
            result: OnceLock::new(),
        }
    }

    /// Returns true once the factory has run successfully
    pub fn is_resolved(&self) -> bool {
        self.result.get().is_some()
    }

    fn cached(&self) -> Option<Value> {
        self.result.get().cloned()
    }
}

/// Specifier → factory, independent of the filesystem
pub struct DefinitionRegistry {
    entries: DashMap<String, Arc<Definition>>,
}

impl DefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register a factory, discarding any previous factory and its result.
    ///
    /// Returns true if an earlier registration was replaced.
    pub fn define(&self, id: impl Into<String>, factory: Arc<DefinitionFactory>) -> bool {
        let id = id.into();
        let replaced = self
            .entries
            .insert(id.clone(), Arc::new(Definition::new(factory)))
            .is_some();
        debug!(id = %id, replaced, "module defined");
        replaced
    }

    /// Look up the current registration for a specifier
    pub fn get(&self, id: &str) -> Option<Arc<Definition>> {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a specifier is defined
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Remove a registration
    pub fn undefine(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Registered specifiers, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Resolve a definition, invoking its factory at most once
    pub fn resolve(
        &self,
        id: &str,
        definition: &Definition,
        require: Require<'_>,
    ) -> Result<Value> {
        if let Some(value) = definition.cached() {
            trace!(id, "definition cache hit");
            return Ok(value);
        }

        let unit = Unit::Definition(id.to_string());
        let context = require.context();
        context.ensure_not_loading(&unit)?;

        let _init = definition.init.lock();
        if let Some(value) = definition.cached() {
            return Ok(value);
        }

        let _frame = context.enter(None, unit);
        let mut scope = ModuleScope::new(require, ModuleDescriptor::new(id, None));

        debug!(id, "resolving definition");
        let returned = (definition.factory)(&mut scope).map_err(LoaderError::from_execution)?;
        let value = scope.settle(returned);

        Ok(definition.result.get_or_init(|| value).clone())
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
