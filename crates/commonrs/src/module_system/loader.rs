// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - executes modules once and memoizes their exports

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{LoaderError, Result};
use crate::executor::ModuleExecutor;
use crate::module_system::cache::OnceMap;
use crate::module_system::context::Unit;
use crate::module_system::require::Require;
use crate::module_system::resolver::module_id;
use crate::module_system::scope::{ModuleDescriptor, ModuleScope};
use crate::value::Value;

/// A module that finished executing
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Root-relative, extension-less id
    pub id: String,
    /// Canonical absolute path
    pub uri: PathBuf,
    /// Value the module produced
    pub exports: Value,
}

/// Module registry, one record per canonical URI
pub struct ModuleLoader {
    modules: OnceMap<PathBuf, ModuleRecord>,
}

impl ModuleLoader {
    /// Create a new module loader
    pub fn new() -> Self {
        Self {
            modules: OnceMap::new(),
        }
    }

    /// Load the module at a canonical URI, executing it on first use
    pub fn load(
        &self,
        uri: PathBuf,
        require: Require<'_>,
        executor: &dyn ModuleExecutor,
    ) -> Result<ModuleRecord> {
        if let Some(record) = self.modules.get(&uri) {
            trace!(id = %record.id, "module cache hit");
            return Ok(record);
        }

        let unit = Unit::Module(uri.clone());
        require.context().ensure_not_loading(&unit)?;

        self.modules
            .get_or_try_init(uri.clone(), || trigger(&uri, unit, require, executor))
    }

    /// Get a loaded module by canonical URI
    pub fn get(&self, uri: &Path) -> Option<ModuleRecord> {
        self.modules.get(&uri.to_path_buf())
    }

    /// Check if a module has been loaded
    pub fn has(&self, uri: &Path) -> bool {
        self.get(uri).is_some()
    }

    /// All loaded modules, ordered by id
    pub fn records(&self) -> Vec<ModuleRecord> {
        let mut records = self.modules.values();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Get the number of loaded modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if no module has been loaded
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a module body with its directory as the execution context
fn trigger(
    uri: &Path,
    unit: Unit,
    require: Require<'_>,
    executor: &dyn ModuleExecutor,
) -> Result<ModuleRecord> {
    let context = require.context();
    let id = module_id(uri, context.config());

    let _frame = context.enter(uri.parent(), unit);
    let mut scope = ModuleScope::new(
        require,
        ModuleDescriptor::new(id.clone(), Some(uri.to_path_buf())),
    );

    debug!(id = %id, uri = %uri.display(), depth = context.depth(), "executing module");
    executor
        .execute(&mut scope)
        .map_err(LoaderError::from_execution)?;

    let exports = scope.settle(None);
    debug!(id = %id, kind = exports.type_of(), "module executed");

    Ok(ModuleRecord {
        id,
        uri: uri.to_path_buf(),
        exports,
    })
}
