// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bindings handed to executing module code

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::module_system::require::Require;
use crate::value::{Object, Value};

/// The `module` binding: identity plus a settable `exports` slot
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    id: String,
    uri: Option<PathBuf>,
    exports: Option<Value>,
}

impl ModuleDescriptor {
    pub(crate) fn new(id: impl Into<String>, uri: Option<PathBuf>) -> Self {
        Self {
            id: id.into(),
            uri,
            exports: None,
        }
    }

    /// Root-relative, extension-less id (`/module-dir/x`), or the definition
    /// specifier for `define()` factories
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical path of the module file, `None` for definitions
    pub fn uri(&self) -> Option<&Path> {
        self.uri.as_deref()
    }

    /// Value assigned to `module.exports`, if any
    pub fn exports(&self) -> Option<&Value> {
        self.exports.as_ref()
    }

    /// Assign `module.exports`; it takes precedence over the exports container
    pub fn set_exports(&mut self, value: impl Into<Value>) {
        self.exports = Some(value.into());
    }
}

/// Everything a module body can see while it runs
pub struct ModuleScope<'a> {
    require: Require<'a>,
    exports: Object,
    module: ModuleDescriptor,
}

impl<'a> ModuleScope<'a> {
    pub(crate) fn new(require: Require<'a>, module: ModuleDescriptor) -> Self {
        Self {
            require,
            exports: Object::new(),
            module,
        }
    }

    /// Require another module from this module's directory
    pub fn require(&self, specifier: &str) -> Result<Value> {
        self.require.require(specifier)
    }

    /// The `require` capability itself, e.g. to hand to a closure
    pub fn requirer(&self) -> Require<'a> {
        self.require
    }

    /// Resolve a specifier to a path without executing anything
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        self.require.resolve(specifier)
    }

    /// Check whether a specifier resolves, without executing anything
    pub fn exists(&self, specifier: &str) -> bool {
        self.require.exists(specifier)
    }

    /// The `module` binding
    pub fn module(&self) -> &ModuleDescriptor {
        &self.module
    }

    /// Mutable `module` binding
    pub fn module_mut(&mut self) -> &mut ModuleDescriptor {
        &mut self.module
    }

    /// The `exports` container
    pub fn exports(&self) -> &Object {
        &self.exports
    }

    /// Mutable `exports` container
    pub fn exports_mut(&mut self) -> &mut Object {
        &mut self.exports
    }

    /// Shorthand for `exports[key] = value`
    pub fn export(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.exports.insert(key.into(), value.into());
    }

    /// Pick the unit's result.
    ///
    /// `module.exports` wins; otherwise a non-empty exports container; otherwise
    /// the value a factory returned; otherwise the (empty) exports container.
    pub(crate) fn settle(self, returned: Option<Value>) -> Value {
        let ModuleScope {
            exports, module, ..
        } = self;

        if let Some(value) = module.exports {
            return value;
        }

        match returned {
            Some(value) if exports.is_empty() => value,
            _ => Value::Object(exports),
        }
    }
}
