// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundled loaders

use anyhow::Context;
use std::path::Path;

use crate::module_system::Require;
use crate::plugins::ResourceLoader;
use crate::value::Value;

/// `json!path` - decodes the resource as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoader;

impl ResourceLoader for JsonLoader {
    fn load(&self, resource: &Path, _require: Require<'_>) -> anyhow::Result<Value> {
        let content = std::fs::read_to_string(resource)
            .with_context(|| format!("reading {}", resource.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("decoding {}", resource.display()))?;
        Ok(Value::from(json))
    }
}

/// `text!path` - the resource's contents as a string
#[derive(Debug, Default, Clone, Copy)]
pub struct TextLoader;

impl ResourceLoader for TextLoader {
    fn load(&self, resource: &Path, _require: Require<'_>) -> anyhow::Result<Value> {
        let content = std::fs::read_to_string(resource)
            .with_context(|| format!("reading {}", resource.display()))?;
        Ok(Value::String(content))
    }
}
