// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::module_system::context::ResolutionContext;
use crate::module_system::searcher::ResourceSearcher;
use crate::module_system::specifier::SpecifierKind;

/// Cache key for one resolution.
///
/// `context` is only set for relative specifiers: the same relative specifier
/// can resolve differently from two directories, bare and absolute ones cannot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolveKey {
    specifier: String,
    extension: String,
    context: Option<PathBuf>,
}

/// Turns specifiers into canonical paths
pub struct ModuleResolver {
    searcher: ResourceSearcher,
    cache: DashMap<ResolveKey, Option<PathBuf>>,
}

impl ModuleResolver {
    /// Create a new module resolver
    pub fn new() -> Self {
        Self {
            searcher: ResourceSearcher::new(),
            cache: DashMap::new(),
        }
    }

    /// Resolve a specifier to a canonical path, or `None` if nothing matches.
    ///
    /// `extension` is appended unless the specifier already ends with it;
    /// pass `""` to resolve the specifier exactly as written.
    pub fn resolve(
        &self,
        specifier: &str,
        extension: &str,
        context: &ResolutionContext,
    ) -> Option<PathBuf> {
        let extension = if !extension.is_empty() && specifier.ends_with(extension) {
            ""
        } else {
            extension
        };
        let kind = SpecifierKind::of(specifier);
        let key = ResolveKey {
            specifier: specifier.to_string(),
            extension: extension.to_string(),
            context: if kind.is_relative() {
                context.relative_root()
            } else {
                None
            },
        };

        if let Some(hit) = self.cache.get(&key) {
            trace!(specifier, "resolution cache hit");
            return hit.value().clone();
        }

        let config = context.config();
        let resolved = match kind {
            SpecifierKind::Relative => key
                .context
                .as_deref()
                .and_then(|dir| self.search(&dir.join(specifier), extension, config)),
            SpecifierKind::Absolute | SpecifierKind::Bare => {
                let rooted = specifier.trim_start_matches('/');
                config
                    .base_paths
                    .iter()
                    .find_map(|base| self.search(&base.join(rooted), extension, config))
            }
        };

        match &resolved {
            Some(path) => debug!(specifier, resolved = %path.display(), "resolved module path"),
            None => debug!(specifier, ?kind, "module path not found"),
        }

        self.cache.insert(key, resolved.clone());
        resolved
    }

    /// Number of memoized resolutions
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if nothing has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn search(&self, candidate: &Path, extension: &str, config: &EngineConfig) -> Option<PathBuf> {
        self.searcher
            .search(candidate, extension, &config.directory_index_name)
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the stable module id of a canonical URI.
///
/// Strips the longest matching base path, then the module extension, and
/// normalizes separators to `/`. A URI outside every base path keeps its full
/// path.
pub fn module_id(uri: &Path, config: &EngineConfig) -> String {
    let relative = config
        .base_paths
        .iter()
        .map(|base| base.canonicalize().unwrap_or_else(|_| base.clone()))
        .filter_map(|base| {
            uri.strip_prefix(&base)
                .ok()
                .map(|rest| (base.components().count(), rest.to_path_buf()))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| uri.to_path_buf());

    let mut id = relative
        .components()
        .filter_map(|component| match component {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    let extension = config.module_extension.as_str();
    if !extension.is_empty() && id.ends_with(extension) {
        id.truncate(id.len() - extension.len());
    }

    format!("/{}", id)
}
