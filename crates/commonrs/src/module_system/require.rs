// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `require` capability handed to module code

use std::path::PathBuf;

use crate::engine::Engine;
use crate::error::Result;
use crate::module_system::context::ResolutionContext;
use crate::value::Value;

/// `require()` bound to one engine and one in-flight resolution.
///
/// Nested requires go through the same [`ResolutionContext`] as the call that
/// triggered them, so relative specifiers resolve against the directory of the
/// module currently executing.
#[derive(Clone, Copy)]
pub struct Require<'a> {
    engine: &'a Engine,
    context: &'a ResolutionContext,
}

impl<'a> Require<'a> {
    pub(crate) fn new(engine: &'a Engine, context: &'a ResolutionContext) -> Self {
        Self { engine, context }
    }

    /// require() - load a definition, plugin resource or module
    pub fn require(&self, specifier: &str) -> Result<Value> {
        self.engine.require_in(specifier, self.context)
    }

    /// require.resolve() - get the resolved path without loading
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        self.engine.resolve_in(specifier, self.context)
    }

    /// Check whether a specifier resolves to a module file
    pub fn exists(&self, specifier: &str) -> bool {
        self.resolve(specifier).is_some()
    }

    /// Directory relative specifiers currently resolve against
    pub fn current_dir(&self) -> Option<PathBuf> {
        self.context.relative_root()
    }

    pub(crate) fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub(crate) fn context(&self) -> &'a ResolutionContext {
        self.context
    }
}
