// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Install a test subscriber once; `RUST_LOG=commonrs=trace` shows the engine's logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Temporary module tree
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Empty tree
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// The tree used by most tests:
    ///
    /// ```text
    /// module-dir/
    ///   direct-export.js
    ///   multiple-exports.js
    ///   relative-module.js
    ///   relative-module-consumer.js
    ///   incrementer-module.js
    ///   module-with-another-ext.inc
    ///   module-id-and-uri-exporter.js
    ///   package1/relative-upper-module-consumer.js
    ///   folder-as-module/index.js
    ///   custom-extensions/file-reverser.js
    ///   resources/data.json
    ///   resources/simple-text.txt
    /// ```
    pub fn module_dir() -> Self {
        let fixture = Self::new();
        for module in [
            "module-dir/direct-export.js",
            "module-dir/multiple-exports.js",
            "module-dir/relative-module.js",
            "module-dir/relative-module-consumer.js",
            "module-dir/incrementer-module.js",
            "module-dir/module-with-another-ext.inc",
            "module-dir/module-id-and-uri-exporter.js",
            "module-dir/package1/relative-upper-module-consumer.js",
            "module-dir/folder-as-module/index.js",
            "module-dir/custom-extensions/file-reverser.js",
        ] {
            fixture.file(module, "");
        }
        fixture.file(
            "module-dir/resources/data.json",
            r#"{ "key1": 100, "key2": 200 }"#,
        );
        fixture.file("module-dir/resources/simple-text.txt", "DrBenton");
        fixture
    }

    /// Root of the tree
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `relative` inside the tree
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Canonical path of an existing file inside the tree
    pub fn canonical(&self, relative: &str) -> PathBuf {
        self.path(relative).canonicalize().unwrap()
    }

    /// Write a file, creating parent directories
    pub fn file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }
}

/// Shared invocation counter for module bodies, factories and loaders
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new count
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
