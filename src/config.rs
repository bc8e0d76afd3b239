// SPDX-License-Identifier: MIT
//! Writer and reader options

use serde::{Deserialize, Serialize};

use crate::compression_strategy::CompressionStrategy;

/// Options for [`BinaryCacheWriter`](crate::BinaryCacheWriter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Emit a Geometry section when geometry is supplied
    pub include_geometry: bool,
    /// Set the HasSpatial header flag; never adds or removes a section
    pub include_spatial_hierarchy: bool,
    pub compression: CompressionStrategy,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            include_geometry: true,
            include_spatial_hierarchy: true,
            compression: CompressionStrategy::Never,
        }
    }
}

impl WriteOptions {
    /// Defaults overridden by `IFC_CACHE_INCLUDE_GEOMETRY`,
    /// `IFC_CACHE_INCLUDE_SPATIAL` and `IFC_CACHE_COMPRESSION`
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            include_geometry: flag(&var, "IFC_CACHE_INCLUDE_GEOMETRY")
                .unwrap_or(defaults.include_geometry),
            include_spatial_hierarchy: flag(&var, "IFC_CACHE_INCLUDE_SPATIAL")
                .unwrap_or(defaults.include_spatial_hierarchy),
            compression: var("IFC_CACHE_COMPRESSION")
                .and_then(|s| CompressionStrategy::parse(&s))
                .unwrap_or(defaults.compression),
        }
    }

    pub fn without_geometry(mut self) -> Self {
        self.include_geometry = false;
        self
    }

    pub fn with_compression(mut self, compression: CompressionStrategy) -> Self {
        self.compression = compression;
        self
    }
}

/// Options for [`BinaryCacheReader`](crate::BinaryCacheReader)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Leave the Geometry section undecoded even when present
    pub skip_geometry: bool,
}

impl ReadOptions {
    /// Defaults overridden by `IFC_CACHE_SKIP_GEOMETRY`
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            skip_geometry: flag(&var, "IFC_CACHE_SKIP_GEOMETRY").unwrap_or_default(),
        }
    }

    pub fn skipping_geometry() -> Self {
        Self {
            skip_geometry: true,
        }
    }
}

fn flag(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    match var(name)?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
