// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Campus VQA dataset pipeline.
//!
//! Two file-decoupled stages:
//! 1. [`normalize`]: resize campus photographs into a bounding box, rename
//!    them `hku_<building>_<NNNNNN>.jpg` and write `image_info.json`.
//! 2. [`dataset`]: expand bilingual question templates over that manifest,
//!    append hand-authored dialogues, shuffle and split 90/10 into train
//!    and validation JSON files with a provenance card alongside.

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod normalize;
pub mod qa;
pub mod split;

pub use catalog::{BuildingCatalog, BuildingInfo, Dialogue};
pub use dataset::{DatasetBuilder, DialogueCheck, Role, Sample, Turn};
pub use error::{PipelineError, Result};
pub use manifest::{ImageRecord, Manifest};
pub use normalize::{Normalizer, TargetSize};
pub use split::Split;
