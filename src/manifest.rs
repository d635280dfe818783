// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Image manifest: the hand-off artifact between normalization and dataset
//! construction (`image_info.json`).
//!
//! Buildings are always held and iterated in sorted identifier order. A
//! hand-written manifest is re-sorted on load, so the order of its keys
//! in the file has no effect on sample ids.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const MANIFEST_FILE: &str = "image_info.json";

/// One successfully normalized image. Only `new_name` is required when
/// reading a manifest back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub original_name: String,
    pub new_name: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub original_path: String,
    #[serde(default)]
    pub processed_path: String,
}

/// Building identifier -> images of that building, in processing order.
/// Keys are sorted; images keep their listed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, Vec<ImageRecord>>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, building: impl Into<String>, images: Vec<ImageRecord>) {
        self.0.insert(building.into(), images);
    }

    pub fn buildings(&self) -> impl Iterator<Item = (&str, &[ImageRecord])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn images(&self, building: &str) -> Option<&[ImageRecord]> {
        self.0.get(building).map(Vec::as_slice)
    }

    pub fn building_count(&self) -> usize {
        self.0.len()
    }

    pub fn image_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Whether any building lists an image with this generated filename.
    pub fn contains_image(&self, new_name: &str) -> bool {
        self.0
            .values()
            .flatten()
            .any(|record| record.new_name == new_name)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::json(path, e))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

/// Writes `value` as UTF-8 JSON with 2-space indentation. Non-ASCII text is
/// emitted literally.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| PipelineError::json(path, e))?;
    writer.flush().map_err(|e| PipelineError::io(path, e))
}
