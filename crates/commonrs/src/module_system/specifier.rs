// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Specifier grammar

use regex::Regex;
use std::sync::LazyLock;

/// `prefix!resource`, prefix is `\w+`, resource is a conservative path charset.
static PLUGIN_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)!([A-Za-z0-9_./\-]+)$").expect("plugin specifier pattern")
});

/// How a specifier is resolved against the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Starts with `./` or `../`, resolved against the current context directory
    Relative,
    /// Starts with `/`, resolved against each base path as a rooted path
    Absolute,
    /// Anything else, searched through each base path
    Bare,
}

impl SpecifierKind {
    /// Classify a specifier
    pub fn of(specifier: &str) -> Self {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            SpecifierKind::Relative
        } else if specifier.starts_with('/') {
            SpecifierKind::Absolute
        } else {
            SpecifierKind::Bare
        }
    }

    /// Returns true for relative specifiers
    pub fn is_relative(self) -> bool {
        self == SpecifierKind::Relative
    }
}

/// A parsed `prefix!resource` specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSpecifier<'a> {
    /// Loader prefix
    pub prefix: &'a str,
    /// Resource path handed to the loader after resolution
    pub resource: &'a str,
}

impl<'a> PluginSpecifier<'a> {
    /// Parse a plugin specifier, `None` if the specifier does not match the grammar
    pub fn parse(specifier: &'a str) -> Option<Self> {
        let captures = PLUGIN_SPECIFIER.captures(specifier)?;
        let prefix = captures.get(1)?.as_str();
        let resource = captures.get(2)?.as_str();
        Some(Self { prefix, resource })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(SpecifierKind::of("./foo"), SpecifierKind::Relative);
        assert_eq!(SpecifierKind::of("../foo/bar"), SpecifierKind::Relative);
        assert_eq!(SpecifierKind::of("/module-dir/x"), SpecifierKind::Absolute);
        assert_eq!(SpecifierKind::of("module-dir/x"), SpecifierKind::Bare);
        // a dot-prefixed name is not relative
        assert_eq!(SpecifierKind::of(".hidden"), SpecifierKind::Bare);
    }

    #[test]
    fn test_plugin_specifier() {
        assert_eq!(
            PluginSpecifier::parse("json!module-dir/resources/data.json"),
            Some(PluginSpecifier {
                prefix: "json",
                resource: "module-dir/resources/data.json",
            })
        );
        assert_eq!(
            PluginSpecifier::parse("fileRev!./module-dir/resources/simple-text.txt"),
            Some(PluginSpecifier {
                prefix: "fileRev",
                resource: "./module-dir/resources/simple-text.txt",
            })
        );
    }

    #[test]
    fn test_not_a_plugin_specifier() {
        assert_eq!(PluginSpecifier::parse("module-dir/x"), None);
        assert_eq!(PluginSpecifier::parse("!resource"), None);
        assert_eq!(PluginSpecifier::parse("json!"), None);
        assert_eq!(PluginSpecifier::parse("bad-prefix!x"), None);
        assert_eq!(PluginSpecifier::parse("json!with space"), None);
        assert_eq!(PluginSpecifier::parse("a!b!c"), None);
    }
}
