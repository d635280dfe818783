// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Image Normalizer: resize and rename campus photographs.
//!
//! INPUT: a source root with one subdirectory per building, each holding
//! `jpg`/`JPG`/`png`/`PNG` files (not searched recursively).
//!
//! OUTPUT:
//! 1. `<output>/images/hku_<building>_<NNNNNN>.jpg`, RGB JPEG resized with
//!    Lanczos3 to fit the target box while keeping the aspect ratio.
//! 2. `<output>/image_info.json`, the manifest consumed by the dataset stage.
//!
//! Buildings and files are visited in sorted name order and the counter
//! is shared by all buildings, so the output is reproducible for a given
//! source tree. A file that fails to decode or encode is logged and
//! skipped without consuming a counter value.

use crate::error::{PipelineError, Result};
use crate::manifest::{ImageRecord, Manifest, MANIFEST_FILE};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const IMAGES_DIR: &str = "images";
pub const DEFAULT_QUALITY: u8 = 95;

const EXTENSIONS: [&str; 4] = ["jpg", "JPG", "png", "PNG"];

/// Bounding box the normalized images must fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// SIZING RULE: scale so the image touches the box on the axis where it is
/// relatively larger, rounding the other axis. No padding is added, so one
/// side equals the target and the other is at most the target.
pub fn fit_within(width: u32, height: u32, target: TargetSize) -> (u32, u32) {
    let image_ratio = f64::from(width.max(1)) / f64::from(height.max(1));
    let target_ratio = f64::from(target.width) / f64::from(target.height);

    if image_ratio > target_ratio {
        let new_height = (f64::from(target.width) / image_ratio).round() as u32;
        (target.width, new_height.clamp(1, target.height.max(1)))
    } else {
        let new_width = (f64::from(target.height) * image_ratio).round() as u32;
        (new_width.clamp(1, target.width.max(1)), target.height)
    }
}

/// Decodes `src`, drops any alpha channel, resizes into `target` and writes a
/// JPEG to `dst`. Returns the output dimensions.
///
/// The decoder is chosen from the file content, falling back to the
/// extension only when the leading bytes are not recognized.
pub fn resize_image(src: &Path, dst: &Path, target: TargetSize, quality: u8) -> Result<(u32, u32)> {
    let img = ImageReader::open(src)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| PipelineError::io(src, e))?
        .decode()
        .map_err(|e| PipelineError::image(src, e))?;
    let rgb = match img {
        DynamicImage::ImageRgb8(buf) => buf,
        other => other.to_rgb8(),
    };

    let (width, height) = fit_within(rgb.width(), rgb.height(), target);
    let resized = imageops::resize(&rgb, width, height, FilterType::Lanczos3);

    let file = File::create(dst).map_err(|e| PipelineError::io(dst, e))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(&resized)
        .map_err(|e| PipelineError::image(dst, e))?;
    writer.flush().map_err(|e| PipelineError::io(dst, e))?;

    Ok((width, height))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildingTally {
    pub processed: usize,
    pub skipped: usize,
}

/// Per-building outcome of a normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub buildings: BTreeMap<String, BuildingTally>,
}

impl NormalizeReport {
    pub fn processed(&self) -> usize {
        self.buildings.values().map(|t| t.processed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.buildings.values().map(|t| t.skipped).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    source_dir: PathBuf,
    output_dir: PathBuf,
    target: TargetSize,
    quality: u8,
}

impl Normalizer {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            target: TargetSize::default(),
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_target(mut self, target: TargetSize) -> Self {
        self.target = target;
        self
    }

    /// JPEG quality, clamped to 1..=100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(IMAGES_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }

    /// Processes every building folder and writes the manifest.
    pub fn run(&self) -> Result<(Manifest, NormalizeReport)> {
        if self.target.width == 0 || self.target.height == 0 {
            return Err(PipelineError::InvalidTargetSize {
                width: self.target.width,
                height: self.target.height,
            });
        }
        if !self.source_dir.is_dir() {
            return Err(PipelineError::MissingSource(self.source_dir.clone()));
        }

        let images_dir = self.images_dir();
        fs::create_dir_all(&images_dir).map_err(|e| PipelineError::io(&images_dir, e))?;

        let mut manifest = Manifest::new();
        let mut report = NormalizeReport::default();
        let mut counter: u32 = 0;

        for building_dir in subdirectories(&self.source_dir)? {
            let building = building_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!(building = %building, "Processing building");

            let mut records = Vec::new();
            let mut tally = BuildingTally::default();

            for src in image_files(&building_dir)? {
                let new_name = format!("hku_{building}_{counter:06}.jpg");
                let dst = images_dir.join(&new_name);

                match resize_image(&src, &dst, self.target, self.quality) {
                    Ok((width, height)) => {
                        tracing::debug!(src = %src.display(), %new_name, width, height, "Normalized image");
                        records.push(ImageRecord {
                            original_name: src
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_default(),
                            new_name,
                            building: building.clone(),
                            original_path: src.display().to_string(),
                            processed_path: dst.display().to_string(),
                        });
                        tally.processed += 1;
                        counter += 1;
                    }
                    Err(e) => {
                        tracing::warn!(src = %src.display(), error = %e, "Skipping image");
                        // Encode failures can leave a truncated file behind.
                        let _ = fs::remove_file(&dst);
                        tally.skipped += 1;
                    }
                }
            }

            manifest.insert(building.clone(), records);
            report.buildings.insert(building, tally);
        }

        let manifest_path = self.manifest_path();
        manifest.save(&manifest_path)?;

        tracing::info!(
            processed = report.processed(),
            skipped = report.skipped(),
            manifest = %manifest_path.display(),
            "Normalization complete"
        );
        for (building, tally) in &report.buildings {
            tracing::info!(%building, images = tally.processed, skipped = tally.skipped, "Building summary");
        }

        Ok((manifest, report))
    }
}

fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| PipelineError::io(root, e))? {
        let path = entry.map_err(|e| PipelineError::io(root, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        let matched = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext));
        if matched && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const BOX: TargetSize = TargetSize {
        width: 64,
        height: 36,
    };

    fn write_rgb(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([120, 80, 40]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_fit_wide_image() {
        assert_eq!(fit_within(4000, 1000, TargetSize::default()), (1920, 480));
    }

    #[test]
    fn test_fit_tall_image() {
        assert_eq!(fit_within(1000, 2000, TargetSize::default()), (540, 1080));
    }

    #[test]
    fn test_fit_same_ratio() {
        assert_eq!(fit_within(3840, 2160, TargetSize::default()), (1920, 1080));
        assert_eq!(fit_within(16, 9, TargetSize::default()), (1920, 1080));
    }

    #[test]
    fn test_fit_rounds_instead_of_truncating() {
        // 1920 / (3000 / 1001) = 640.64
        assert_eq!(fit_within(3000, 1001, TargetSize::default()), (1920, 641));
    }

    #[test]
    fn test_fit_extreme_ratio_keeps_one_pixel() {
        assert_eq!(fit_within(100_000, 1, BOX), (64, 1));
        assert_eq!(fit_within(1, 100_000, BOX), (1, 36));
    }

    proptest! {
        #[test]
        fn prop_fit_stays_in_box_and_keeps_ratio(
            width in 1u32..5000,
            height in 1u32..5000,
            tw in 16u32..2500,
            th in 16u32..2500,
        ) {
            let target = TargetSize { width: tw, height: th };
            let (w, h) = fit_within(width, height, target);

            prop_assert!(w <= tw && h <= th);
            prop_assert!(w == tw || h == th);

            let ratio = f64::from(width) / f64::from(height);
            let out_ratio = f64::from(w) / f64::from(h);
            // Rounding moves the free axis by at most one pixel after clamping.
            let tolerance = (ratio + 1.0) / f64::from(h) + 1e-9;
            prop_assert!((out_ratio - ratio).abs() <= tolerance);
        }
    }

    #[test]
    fn test_resize_image_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("alpha.png");
        let dst = dir.path().join("out.jpg");
        RgbaImage::from_pixel(200, 100, Rgba([10, 20, 30, 128]))
            .save(&src)
            .unwrap();

        let dims = resize_image(&src, &dst, BOX, DEFAULT_QUALITY).unwrap();
        assert_eq!(dims, (64, 32));

        let out = image::open(&dst).unwrap();
        assert_eq!(out.color(), image::ColorType::Rgb8);
        assert_eq!((out.width(), out.height()), (64, 32));
    }

    #[test]
    fn test_resize_image_upscales_small_input() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("small.png");
        let dst = dir.path().join("out.jpg");
        write_rgb(&src, 8, 8);

        assert_eq!(resize_image(&src, &dst, BOX, 80).unwrap(), (36, 36));
    }

    #[test]
    fn test_resize_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.jpg");
        let dst = dir.path().join("out.jpg");
        fs::write(&src, b"definitely not a jpeg").unwrap();

        let err = resize_image(&src, &dst, BOX, DEFAULT_QUALITY).unwrap_err();
        assert!(matches!(err, PipelineError::Image { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn test_resize_image_sniffs_mislabelled_content() {
        let dir = tempfile::tempdir().unwrap();
        let png_as_jpg = dir.path().join("photo.jpg");
        let jpg_as_png = dir.path().join("photo.PNG");
        let dst = dir.path().join("out.jpg");
        RgbImage::from_pixel(40, 20, Rgb([1, 2, 3]))
            .save_with_format(&png_as_jpg, ImageFormat::Png)
            .unwrap();
        RgbImage::from_pixel(20, 40, Rgb([4, 5, 6]))
            .save_with_format(&jpg_as_png, ImageFormat::Jpeg)
            .unwrap();

        assert_eq!(resize_image(&png_as_jpg, &dst, BOX, DEFAULT_QUALITY).unwrap(), (64, 32));
        assert_eq!(resize_image(&jpg_as_png, &dst, BOX, DEFAULT_QUALITY).unwrap(), (18, 36));
    }

    #[test]
    fn test_run_keeps_mislabelled_images() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let library = src.path().join("library");
        fs::create_dir_all(&library).unwrap();
        RgbImage::from_pixel(40, 20, Rgb([9, 9, 9]))
            .save_with_format(library.join("photo.jpg"), ImageFormat::Png)
            .unwrap();

        let (manifest, report) = Normalizer::new(src.path(), out.path())
            .with_target(BOX)
            .run()
            .unwrap();

        assert_eq!(report.processed(), 1);
        assert_eq!(report.skipped(), 0);
        let images = manifest.images("library").unwrap();
        assert_eq!(images[0].original_name, "photo.jpg");
        assert_eq!(images[0].new_name, "hku_library_000000.jpg");
    }

    #[test]
    fn test_run_skips_corrupt_files_without_consuming_counter() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let library = src.path().join("library");
        let main = src.path().join("main_building");
        fs::create_dir_all(&library).unwrap();
        fs::create_dir_all(&main).unwrap();

        write_rgb(&library.join("a.png"), 120, 60);
        fs::write(library.join("b.jpg"), b"corrupt").unwrap();
        write_rgb(&library.join("c.PNG"), 60, 120);
        write_rgb(&main.join("front.png"), 300, 200);
        fs::write(main.join("notes.txt"), b"ignored").unwrap();
        write_rgb(&main.join("side.jpeg"), 30, 20);
        fs::create_dir_all(main.join("nested")).unwrap();
        write_rgb(&main.join("nested").join("deep.png"), 30, 20);
        fs::write(src.path().join("stray.png"), b"not a building").unwrap();

        let (manifest, report) = Normalizer::new(src.path(), out.path())
            .with_target(BOX)
            .run()
            .unwrap();

        let names: Vec<_> = manifest
            .buildings()
            .flat_map(|(_, images)| images.iter().map(|r| r.new_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                "hku_library_000000.jpg",
                "hku_library_000001.jpg",
                "hku_main_building_000002.jpg",
            ]
        );

        let library_images = manifest.images("library").unwrap();
        assert_eq!(library_images[0].original_name, "a.png");
        assert_eq!(library_images[1].original_name, "c.PNG");
        assert_eq!(library_images[1].building, "library");

        assert_eq!(report.processed(), 3);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.buildings["library"],
            BuildingTally {
                processed: 2,
                skipped: 1
            }
        );

        let mut written: Vec<_> = fs::read_dir(out.path().join(IMAGES_DIR))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(written, names);

        assert_eq!(
            image::image_dimensions(out.path().join(IMAGES_DIR).join("hku_library_000001.jpg"))
                .unwrap(),
            (18, 36)
        );

        let reloaded = Manifest::load(out.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(reloaded, manifest);
    }

    #[test]
    fn test_run_keeps_empty_buildings() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("sports_centre")).unwrap();

        let (manifest, report) = Normalizer::new(src.path(), out.path()).run().unwrap();
        assert_eq!(manifest.images("sports_centre").map(<[_]>::len), Some(0));
        assert_eq!(report.processed(), 0);
    }

    #[test]
    fn test_run_missing_source() {
        let out = tempfile::tempdir().unwrap();
        let err = Normalizer::new("/nonexistent/source", out.path())
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingSource(_)));
    }

    #[test]
    fn test_run_rejects_zero_target() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = Normalizer::new(src.path(), out.path())
            .with_target(TargetSize {
                width: 0,
                height: 1080,
            })
            .run()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTargetSize {
                width: 0,
                height: 1080
            }
        ));
    }
}
