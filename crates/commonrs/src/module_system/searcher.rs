// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resource searcher - decides whether a candidate path is a file module or a
//! directory-as-module

use dashmap::DashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Filesystem probe, memoized by `(candidate, extension, index name)` including misses
pub struct ResourceSearcher {
    cache: DashMap<(PathBuf, String, String), Option<PathBuf>>,
}

impl ResourceSearcher {
    /// Create a new searcher with an empty cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Find the resource `candidate` denotes.
    ///
    /// Tries `candidate + extension` as a regular file, then
    /// `candidate/<index_name>` when `candidate` is a directory. Returns the
    /// canonical path of the first hit.
    pub fn search(&self, candidate: &Path, extension: &str, index_name: &str) -> Option<PathBuf> {
        let key = (
            candidate.to_path_buf(),
            extension.to_string(),
            index_name.to_string(),
        );
        if let Some(hit) = self.cache.get(&key) {
            trace!(candidate = %candidate.display(), "resource search cache hit");
            return hit.value().clone();
        }

        let found = probe(candidate, extension, index_name);
        trace!(
            candidate = %candidate.display(),
            extension,
            found = ?found,
            "resource search"
        );
        self.cache.insert(key, found.clone());
        found
    }

    /// Number of memoized probes
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if nothing has been probed yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ResourceSearcher {
    fn default() -> Self {
        Self::new()
    }
}

fn probe(candidate: &Path, extension: &str, index_name: &str) -> Option<PathBuf> {
    let file = with_suffix(candidate, extension);
    if file.is_file() {
        return canonical(&file);
    }

    if candidate.is_dir() {
        let index = candidate.join(index_name);
        if index.is_file() {
            return canonical(&index);
        }
    }

    None
}

/// Append `suffix` to the last component, unlike `Path::with_extension`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

fn canonical(path: &Path) -> Option<PathBuf> {
    match path.canonicalize() {
        Ok(canonical) => Some(canonical),
        Err(err) => {
            trace!(path = %path.display(), error = %err, "canonicalize failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_with_suffix_keeps_dots() {
        assert_eq!(
            with_suffix(Path::new("/srv/app/jquery.min"), ".js"),
            PathBuf::from("/srv/app/jquery.min.js")
        );
        assert_eq!(
            with_suffix(Path::new("/srv/app/data.json"), ""),
            PathBuf::from("/srv/app/data.json")
        );
    }

    #[test]
    fn test_file_then_directory_index() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("logger.js"), "").unwrap();
        fs::create_dir(root.join("folder")).unwrap();
        fs::write(root.join("folder").join("index.js"), "").unwrap();

        let searcher = ResourceSearcher::new();
        assert_eq!(
            searcher.search(&root.join("logger"), ".js", "index.js"),
            Some(root.join("logger.js").canonicalize().unwrap())
        );
        assert_eq!(
            searcher.search(&root.join("folder"), ".js", "index.js"),
            Some(root.join("folder/index.js").canonicalize().unwrap())
        );
        assert_eq!(searcher.search(&root.join("missing"), ".js", "index.js"), None);
    }

    #[test]
    fn test_spellings_collapse_to_one_path() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("a")).unwrap();
        fs::write(root.join("a").join("x.js"), "").unwrap();

        let searcher = ResourceSearcher::new();
        let direct = searcher.search(&root.join("a/x"), ".js", "index.js");
        let dotted = searcher.search(&root.join("a/../a/./x"), ".js", "index.js");
        assert!(direct.is_some());
        assert_eq!(direct, dotted);
    }

    #[test]
    fn test_misses_are_cached() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let searcher = ResourceSearcher::new();

        assert_eq!(searcher.search(&root.join("late"), ".js", "index.js"), None);
        fs::write(root.join("late.js"), "").unwrap();
        // the negative result sticks for the lifetime of the searcher
        assert_eq!(searcher.search(&root.join("late"), ".js", "index.js"), None);
        assert_eq!(searcher.len(), 1);
    }

    #[test]
    fn test_index_name_is_part_of_the_key() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("pkg")).unwrap();
        fs::write(root.join("pkg").join("index.js"), "").unwrap();
        fs::write(root.join("pkg").join("main.js"), "").unwrap();

        let searcher = ResourceSearcher::new();
        assert_eq!(
            searcher.search(&root.join("pkg"), ".js", "index.js"),
            Some(root.join("pkg/index.js").canonicalize().unwrap())
        );
        assert_eq!(
            searcher.search(&root.join("pkg"), ".js", "main.js"),
            Some(root.join("pkg/main.js").canonicalize().unwrap())
        );
    }
}
