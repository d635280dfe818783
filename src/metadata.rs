// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Provenance card for a built dataset.
//!
//! Written next to the partitions as `<stem>_meta.json` and containing:
//! 1. **DCMI Terms**: title, description, type, format, provenance.
//! 2. **Statistics**: sample counts per split and language, image counts
//!    per building, template/dialogue origin of the samples.
//! 3. **Split Config**: the shuffle seed and train ratio, enough to
//!    reproduce the partition from the same manifest and catalog.
//! 4. **Integrity**: SHAKE256 (d=256) digests of the partition files.

use crate::dataset::{DatasetPaths, Sample};
use crate::error::{PipelineError, Result};
use crate::manifest::{write_json, Manifest};
use crate::split::{Partition, Split};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tiny_keccak::{Hasher, Shake};

pub const DIGEST_ALGORITHM: &str = "SHAKE256";
pub const DIGEST_BITS: usize = 256;

/// CRYPTO KERNEL: SHAKE256 with a 256-bit output, hex encoded.
pub fn shake256_d256(data: &[u8]) -> String {
    let mut hasher = Shake::v256();
    hasher.update(data);
    let mut output = [0u8; DIGEST_BITS / 8];
    hasher.finalize(&mut output);
    hex::encode(output)
}

pub fn file_digest(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(shake256_d256(&bytes))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitConfig {
    pub seed: u64,
    pub train_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    pub file: String,
    pub samples: usize,
    pub languages: BTreeMap<&'static str, usize>,
    pub digest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_samples: usize,
    pub template_samples: usize,
    pub dialogue_samples: usize,
    pub images: usize,
    pub buildings: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Integrity {
    pub algorithm: &'static str,
    pub bits: usize,
}

/// How many samples came from template expansion and how many from the
/// hand-authored dialogues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleOrigin {
    pub template: usize,
    pub dialogue: usize,
}

/// DCMI SCHEMA plus run statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetCard {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub format: &'static str,
    pub provenance: String,
    pub split: SplitConfig,
    pub statistics: Statistics,
    pub splits: BTreeMap<&'static str, SplitStats>,
    pub integrity: Integrity,
}

impl DatasetCard {
    /// Collects statistics for a partition whose files are already on disk.
    pub fn new(
        manifest: &Manifest,
        partition: &Partition<Sample>,
        paths: &DatasetPaths,
        origin: SampleOrigin,
        split: SplitConfig,
    ) -> Result<Self> {
        let mut splits = BTreeMap::new();
        for split in Split::ALL {
            let samples = partition.get(split);
            let path = paths.get(split);

            let mut languages = BTreeMap::new();
            for sample in samples {
                *languages.entry(sample.language().as_str()).or_insert(0) += 1;
            }

            splits.insert(
                split.as_str(),
                SplitStats {
                    file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    samples: samples.len(),
                    languages,
                    digest: file_digest(path)?,
                },
            );
        }

        let buildings = manifest
            .buildings()
            .map(|(building, images)| (building.to_string(), images.len()))
            .collect();

        Ok(Self {
            title: "HKU Campus Buildings VQA".to_string(),
            description: "Bilingual question-answer conversations about campus building photographs."
                .to_string(),
            kind: "Dataset",
            format: "application/json",
            provenance: "Template expansion of the building catalog over normalized images, plus hand-authored dialogues."
                .to_string(),
            split,
            statistics: Statistics {
                total_samples: partition.len(),
                template_samples: origin.template,
                dialogue_samples: origin.dialogue,
                images: manifest.image_count(),
                buildings,
            },
            splits,
            integrity: Integrity {
                algorithm: DIGEST_ALGORITHM,
                bits: DIGEST_BITS,
            },
        })
    }
}

/// GENERATOR: writes the card as pretty JSON.
pub fn write_metadata(path: &Path, card: &DatasetCard) -> Result<()> {
    write_json(path, card)?;
    tracing::info!(path = %path.display(), "Wrote dataset card");
    Ok(())
}
