// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Dataset Builder: turns the image manifest into conversation samples.
//!
//! For every building the 16-pair question bank is built once and reused
//! for all of its images. Each image yields 8 English samples followed by
//! 8 Chinese samples, each with a fresh `hku_<NNNNNN>` id. The catalog's
//! hand-authored dialogues are appended as `hku_multi_<NNN>`, then the
//! whole list is shuffled and split into `<stem>_train.json` and
//! `<stem>_val.json`.

use crate::catalog::BuildingCatalog;
use crate::error::{PipelineError, Result};
use crate::manifest::{write_json, Manifest};
use crate::metadata::{self, DatasetCard, SampleOrigin, SplitConfig};
use crate::qa::{self, Language, QaPair};
use crate::split::{self, Partition, Split, DEFAULT_TRAIN_RATIO};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prepended to the first human turn of every sample.
pub const IMAGE_MARKER: &str = "<image>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Gpt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub from: Role,
    pub value: String,
}

impl Turn {
    pub fn human(value: impl Into<String>) -> Self {
        Self {
            from: Role::Human,
            value: value.into(),
        }
    }

    pub fn gpt(value: impl Into<String>) -> Self {
        Self {
            from: Role::Gpt,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub image: String,
    pub conversations: Vec<Turn>,
}

impl Sample {
    fn from_pair(id: String, image: &str, pair: &QaPair) -> Self {
        Self {
            id,
            image: image.to_string(),
            conversations: vec![
                Turn::human(format!("{IMAGE_MARKER}{}", pair.question)),
                Turn::gpt(pair.answer.clone()),
            ],
        }
    }

    /// Language of the opening human question.
    pub fn language(&self) -> Language {
        self.conversations
            .iter()
            .find(|turn| turn.from == Role::Human)
            .map(|turn| Language::detect(&turn.value))
            .unwrap_or(Language::En)
    }
}

/// Sequential id source for template samples. Owned by one build run.
#[derive(Debug, Clone, Default)]
pub struct SampleIds {
    next: u64,
}

impl SampleIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("hku_{:06}", self.next);
        self.next += 1;
        id
    }

    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Template samples for every image in the manifest, in manifest order.
pub fn generate_samples(
    manifest: &Manifest,
    catalog: &BuildingCatalog,
    ids: &mut SampleIds,
) -> Vec<Sample> {
    let mut samples = Vec::new();

    for (building, images) in manifest.buildings() {
        let info = catalog.get(building);
        if info.is_none() {
            tracing::warn!(%building, "No catalog entry, using placeholder text");
        }
        tracing::info!(%building, images = images.len(), "Generating samples");

        let bank = qa::question_bank(building, info);
        for record in images {
            for language in Language::ALL {
                for pair in bank.pairs(language) {
                    samples.push(Sample::from_pair(ids.next_id(), &record.new_name, pair));
                }
            }
        }
    }

    samples
}

/// The catalog's multi-turn dialogues as samples, numbered from 1.
pub fn dialogue_samples(catalog: &BuildingCatalog) -> Vec<Sample> {
    catalog
        .dialogues
        .iter()
        .enumerate()
        .map(|(index, dialogue)| {
            let mut conversations = dialogue.turns.clone();
            if let Some(first) = conversations.iter_mut().find(|t| t.from == Role::Human) {
                if !first.value.starts_with(IMAGE_MARKER) {
                    first.value.insert_str(0, IMAGE_MARKER);
                }
            }
            Sample {
                id: format!("hku_multi_{:03}", index + 1),
                image: dialogue.image.clone(),
                conversations,
            }
        })
        .collect()
}

/// What to do when a dialogue names an image the manifest does not contain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogueCheck {
    /// Log and keep the dialogue.
    #[default]
    Warn,
    /// Fail the build.
    Strict,
}

pub fn check_dialogues(dialogues: &[Sample], manifest: &Manifest, policy: DialogueCheck) -> Result<()> {
    for sample in dialogues {
        if manifest.contains_image(&sample.image) {
            continue;
        }
        match policy {
            DialogueCheck::Warn => {
                tracing::warn!(id = %sample.id, image = %sample.image, "Dialogue references an image missing from the manifest");
            }
            DialogueCheck::Strict => {
                return Err(PipelineError::DanglingDialogue {
                    id: sample.id.clone(),
                    image: sample.image.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Output files derived from the `--output` path: `<stem>_train.json`,
/// `<stem>_val.json` and `<stem>_meta.json` in the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub train: PathBuf,
    pub val: PathBuf,
    pub meta: PathBuf,
}

impl DatasetPaths {
    pub fn from_output(output: &Path) -> Self {
        let dir = output.parent().unwrap_or_else(|| Path::new(""));
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        Self {
            train: dir.join(format!("{stem}_train.json")),
            val: dir.join(format!("{stem}_val.json")),
            meta: dir.join(format!("{stem}_meta.json")),
        }
    }

    pub fn get(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub paths: DatasetPaths,
    pub card: DatasetCard,
}

#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    manifest_path: PathBuf,
    output_path: PathBuf,
    catalog: BuildingCatalog,
    seed: Option<u64>,
    train_ratio: f64,
    dialogue_check: DialogueCheck,
}

impl DatasetBuilder {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        catalog: BuildingCatalog,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            output_path: output_path.into(),
            catalog,
            seed: None,
            train_ratio: DEFAULT_TRAIN_RATIO,
            dialogue_check: DialogueCheck::default(),
        }
    }

    /// Fixes the shuffle seed. Without one a random seed is drawn and
    /// recorded in the metadata file.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_train_ratio(mut self, ratio: f64) -> Self {
        self.train_ratio = ratio;
        self
    }

    pub fn with_dialogue_check(mut self, policy: DialogueCheck) -> Self {
        self.dialogue_check = policy;
        self
    }

    pub fn build(&self) -> Result<BuildReport> {
        let ratio = split::validate_ratio(self.train_ratio)?;
        let manifest = Manifest::load(&self.manifest_path)?;
        tracing::info!(
            manifest = %self.manifest_path.display(),
            buildings = manifest.building_count(),
            images = manifest.image_count(),
            "Loaded manifest"
        );

        let mut ids = SampleIds::new();
        let mut samples = generate_samples(&manifest, &self.catalog, &mut ids);
        let template_samples = samples.len();

        let dialogues = dialogue_samples(&self.catalog);
        check_dialogues(&dialogues, &manifest, self.dialogue_check)?;
        let dialogue_count = dialogues.len();
        samples.extend(dialogues);

        let seed = self.seed.unwrap_or_else(rand::random);
        let partition: Partition<Sample> = split::partition(samples, ratio, seed)?;

        let paths = DatasetPaths::from_output(&self.output_path);
        for split in Split::ALL {
            let path = paths.get(split);
            write_json(path, partition.get(split))?;
            tracing::info!(
                split = split.as_str(),
                samples = partition.get(split).len(),
                path = %path.display(),
                "Wrote partition"
            );
        }

        let origin = SampleOrigin {
            template: template_samples,
            dialogue: dialogue_count,
        };
        let config = SplitConfig {
            seed,
            train_ratio: ratio,
        };
        let card = DatasetCard::new(&manifest, &partition, &paths, origin, config)?;
        metadata::write_metadata(&paths.meta, &card)?;

        Ok(BuildReport { paths, card })
    }
}
