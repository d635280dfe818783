// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Building Catalog: static metadata keyed by building identifier.
//!
//! The catalog is a TOML document with two sections:
//! 1. **`[buildings.<id>]`**: display names, descriptions, location, year,
//!    architect and feature tags for each building folder.
//! 2. **`[[dialogues]]`**: hand-authored multi-turn conversations that are
//!    appended verbatim to the generated samples.
//!
//! A default catalog is compiled into the binary so the pipeline runs
//! without any configuration file.

use crate::dataset::Turn;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../config/catalog.toml");
const BUILTIN_CATALOG_PATH: &str = "config/catalog.toml";
const INLINE_CATALOG_PATH: &str = "<inline>";

/// Metadata for one building. Every field is optional; template expansion
/// substitutes placeholders for whatever is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingInfo {
    pub en_name: Option<String>,
    pub cn_name: Option<String>,
    pub description_en: Option<String>,
    pub description_cn: Option<String>,
    pub location: Option<String>,
    pub year_built: Option<String>,
    pub architect: Option<String>,
    pub features: Option<Vec<String>>,
}

/// A hand-authored conversation about one specific image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    pub image: String,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCatalog {
    #[serde(default)]
    pub buildings: BTreeMap<String, BuildingInfo>,
    #[serde(default)]
    pub dialogues: Vec<Dialogue>,
}

impl BuildingCatalog {
    /// The catalog shipped with the binary (`config/catalog.toml`).
    pub fn builtin() -> Result<Self> {
        Self::parse_from(BUILTIN_CATALOG, Path::new(BUILTIN_CATALOG_PATH))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::parse_from(&content, path)
    }

    /// Parses a catalog held in memory. Errors report the path as `<inline>`.
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_from(s, Path::new(INLINE_CATALOG_PATH))
    }

    fn parse_from(s: &str, path: &Path) -> Result<Self> {
        toml::from_str(s).map_err(|e| PipelineError::catalog(path, e))
    }

    pub fn get(&self, building: &str) -> Option<&BuildingInfo> {
        self.buildings.get(building)
    }
}
