// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution context stack
//!
//! One [`ResolutionContext`] lives for exactly one top-level `require` call and
//! is threaded through every nested require it triggers. It carries:
//!
//! - the configuration snapshot taken when the call started
//! - the stack of directories modules are currently executing from
//! - the chain of units currently executing, used to reject circular requires

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{LoaderError, Result};

/// A unit of execution that can appear on the loading chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Unit {
    /// File module, by canonical URI
    Module(PathBuf),
    /// `define()` registration, by specifier
    Definition(String),
    /// Plugin invocation, by prefix and canonical resource path
    Plugin(String, PathBuf),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Module(uri) => write!(f, "{}", uri.display()),
            Unit::Definition(id) => write!(f, "define('{}')", id),
            Unit::Plugin(prefix, resource) => write!(f, "{}!{}", prefix, resource.display()),
        }
    }
}

/// Per-call resolution state
pub struct ResolutionContext {
    config: Arc<EngineConfig>,
    directories: RefCell<Vec<PathBuf>>,
    loading: RefCell<Vec<Unit>>,
}

impl ResolutionContext {
    /// Start a new top-level call with a configuration snapshot
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            config,
            directories: RefCell::new(Vec::new()),
            loading: RefCell::new(Vec::new()),
        }
    }

    /// Configuration in effect for this call
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Directory of the innermost executing module, if any
    pub fn current(&self) -> Option<PathBuf> {
        self.directories.borrow().last().cloned()
    }

    /// Directory relative specifiers resolve against: the current directory,
    /// or the first base path at the top level
    pub fn relative_root(&self) -> Option<PathBuf> {
        self.current()
            .or_else(|| self.config.base_paths.first().cloned())
    }

    /// Number of directories on the stack
    pub fn depth(&self) -> usize {
        self.directories.borrow().len()
    }

    /// Push a directory
    pub fn push(&self, directory: PathBuf) {
        self.directories.borrow_mut().push(directory);
    }

    /// Pop the innermost directory
    pub fn pop(&self) -> Option<PathBuf> {
        self.directories.borrow_mut().pop()
    }

    /// Fail if `unit` is already executing further up this call
    pub(crate) fn ensure_not_loading(&self, unit: &Unit) -> Result<()> {
        let loading = self.loading.borrow();
        if !loading.contains(unit) {
            return Ok(());
        }
        let chain = loading
            .iter()
            .chain(std::iter::once(unit))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        Err(LoaderError::CircularRequire { chain })
    }

    /// Mark `unit` as executing, optionally from `directory`, until the
    /// returned frame is dropped
    pub(crate) fn enter(&self, directory: Option<&Path>, unit: Unit) -> Frame<'_> {
        let mut frame = self.within(directory);
        self.loading.borrow_mut().push(unit);
        frame.pushed_unit = true;
        frame
    }

    /// Make `directory` the current directory until the returned frame is
    /// dropped, without touching the loading chain
    pub(crate) fn within(&self, directory: Option<&Path>) -> Frame<'_> {
        let pushed_directory = match directory {
            Some(dir) => {
                self.push(dir.to_path_buf());
                true
            }
            None => false,
        };
        Frame {
            context: self,
            pushed_unit: false,
            pushed_directory,
        }
    }
}

/// Scoped execution frame, popped on drop even when the unit fails
pub(crate) struct Frame<'a> {
    context: &'a ResolutionContext,
    pushed_unit: bool,
    pushed_directory: bool,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        if self.pushed_unit {
            self.context.loading.borrow_mut().pop();
        }
        if self.pushed_directory {
            self.context.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ResolutionContext {
        ResolutionContext::new(Arc::new(EngineConfig::new("/srv/app")))
    }

    #[test]
    fn test_relative_root_defaults_to_first_base_path() {
        let ctx = context();
        assert_eq!(ctx.current(), None);
        assert_eq!(ctx.relative_root(), Some(PathBuf::from("/srv/app")));
    }

    #[test]
    fn test_frames_nest_and_unwind() {
        let ctx = context();
        {
            let _a = ctx.enter(Some(Path::new("/srv/app/a")), Unit::Module("/srv/app/a/x.js".into()));
            {
                let _b = ctx.enter(Some(Path::new("/srv/app/b")), Unit::Module("/srv/app/b/y.js".into()));
                assert_eq!(ctx.current(), Some(PathBuf::from("/srv/app/b")));
                assert_eq!(ctx.depth(), 2);
            }
            assert_eq!(ctx.current(), Some(PathBuf::from("/srv/app/a")));
            // definitions do not change the directory
            let _d = ctx.enter(None, Unit::Definition("config".into()));
            assert_eq!(ctx.current(), Some(PathBuf::from("/srv/app/a")));
        }
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_circular_unit_is_rejected() {
        let ctx = context();
        let a = Unit::Module("/srv/app/a.js".into());
        let b = Unit::Module("/srv/app/b.js".into());
        let _fa = ctx.enter(Some(Path::new("/srv/app")), a.clone());
        let _fb = ctx.enter(Some(Path::new("/srv/app")), b.clone());
        assert!(ctx.ensure_not_loading(&Unit::Module("/srv/app/c.js".into())).is_ok());
        match ctx.ensure_not_loading(&a) {
            Err(LoaderError::CircularRequire { chain }) => {
                assert_eq!(chain, "/srv/app/a.js -> /srv/app/b.js -> /srv/app/a.js");
            }
            other => panic!("expected circular require, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_frame_leaves_chain_alone() {
        let ctx = context();
        let unit = Unit::Plugin("json".into(), "/srv/app/data.json".into());
        let _loading = ctx.enter(None, unit.clone());
        {
            let _dir = ctx.within(Some(Path::new("/srv/app/resources")));
            assert_eq!(ctx.current(), Some(PathBuf::from("/srv/app/resources")));
            assert!(ctx.ensure_not_loading(&unit).is_err());
        }
        assert_eq!(ctx.depth(), 0);
        // still loading after the directory frame is gone
        assert!(ctx.ensure_not_loading(&unit).is_err());
    }
}
