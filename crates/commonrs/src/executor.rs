// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module executors
//!
//! The engine decides *which* file a specifier names and *whether* it still
//! has to run; an executor decides what running it means. Executors receive a
//! [`ModuleScope`] holding the module's `require`, `exports` and `module`
//! bindings and fill in its exports.
//!
//! [`NativeExecutor`] runs Rust closures registered under module ids, so each
//! module body is its own compilation unit while files on disk still drive
//! resolution, directory-as-module lookup and identity.

use anyhow::anyhow;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

use crate::module_system::ModuleScope;

/// Runs the body of a resolved module
pub trait ModuleExecutor: Send + Sync {
    /// Execute the module described by `scope.module()`
    fn execute(&self, scope: &mut ModuleScope<'_>) -> anyhow::Result<()>;
}

impl<T: ModuleExecutor + ?Sized> ModuleExecutor for Arc<T> {
    fn execute(&self, scope: &mut ModuleScope<'_>) -> anyhow::Result<()> {
        (**self).execute(scope)
    }
}

/// Body of a native module
pub type ModuleBody = dyn Fn(&mut ModuleScope<'_>) -> anyhow::Result<()> + Send + Sync;

/// Executor backed by a single closure, see [`executor_fn`]
pub struct FnExecutor<F>(F);

/// Use a closure as the executor for every module.
///
/// The closure typically reads the file at `scope.module().uri()` and
/// interprets it.
pub fn executor_fn<F>(f: F) -> FnExecutor<F>
where
    F: Fn(&mut ModuleScope<'_>) -> anyhow::Result<()> + Send + Sync,
{
    FnExecutor(f)
}

impl<F> ModuleExecutor for FnExecutor<F>
where
    F: Fn(&mut ModuleScope<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, scope: &mut ModuleScope<'_>) -> anyhow::Result<()> {
        (self.0)(scope)
    }
}

/// Executor running Rust closures keyed by module id
#[derive(Default)]
pub struct NativeExecutor {
    bodies: DashMap<String, Arc<ModuleBody>>,
}

impl NativeExecutor {
    /// Create an executor with no module bodies
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body and return the executor, for chained construction
    pub fn with_module<F>(self, id: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ModuleScope<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(id, body);
        self
    }

    /// Register (or replace) the body for module `id`
    pub fn register<F>(&self, id: impl Into<String>, body: F)
    where
        F: Fn(&mut ModuleScope<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bodies.insert(id.into(), Arc::new(body));
    }

    /// Check if a body is registered for `id`
    pub fn has_module(&self, id: &str) -> bool {
        self.bodies.contains_key(id)
    }

    /// Number of registered bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Check if no body is registered
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl ModuleExecutor for NativeExecutor {
    fn execute(&self, scope: &mut ModuleScope<'_>) -> anyhow::Result<()> {
        let id = scope.module().id();
        // Clone the body out so the map is not locked while it runs
        let body = self
            .bodies
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| anyhow!("no native body registered for module '{}'", id))?;
        trace!(id, "running native module body");
        body(scope)
    }
}
