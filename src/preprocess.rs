//! Image normalization ahead of OCR and inference.
//!
//! Produces a `<stem>.normalized.png` next to the raw capture. Three
//! strategies are tried in order; anything past the first is degraded
//! quality and logged as such:
//!   1. grayscale + contrast + unsharp mask, downscaled to the target bound
//!   2. grayscale + unsharp mask
//!   3. verbatim copy of the source

use crate::capture::derived_path;
use crate::error::PreprocessError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Images wider or taller than this are shrunk to fit. Never upscaled.
    pub max_width: u32,
    pub max_height: u32,
    pub contrast: f32,
    pub sharpen_sigma: f32,
    pub sharpen_threshold: i32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_width: 2560,
            max_height: 2560,
            contrast: 30.0,
            sharpen_sigma: 1.2,
            sharpen_threshold: 2,
        }
    }
}

/// Which strategy produced the normalized artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Cached,
    Full,
    Simplified,
    Verbatim,
}

#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    options: PreprocessOptions,
}

impl ImagePreprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    /// Normalize `raw` and return the artifact path.
    pub fn normalize(&self, raw: &Path) -> Result<PathBuf, PreprocessError> {
        self.normalize_with_quality(raw).map(|(path, _)| path)
    }

    pub fn normalize_with_quality(&self, raw: &Path) -> Result<(PathBuf, Quality), PreprocessError> {
        if !raw.is_file() {
            return Err(PreprocessError::MissingSource(raw.to_path_buf()));
        }

        let out = derived_path(raw, "normalized");
        if is_non_empty(&out) {
            log::debug!("[PREPROCESS] Reusing {}", out.display());
            return Ok((out, Quality::Cached));
        }

        let start = std::time::Instant::now();

        let primary_err = match self.enhance(raw, &out).and_then(|_| verify(&out)) {
            Ok(()) => {
                log::info!(
                    "[PREPROCESS] Normalized {} in {}ms",
                    raw.display(),
                    start.elapsed().as_millis()
                );
                return Ok((out, Quality::Full));
            }
            Err(e) => e,
        };
        log::warn!(
            "[PREPROCESS] Primary strategy failed for {} ({}) — degraded: grayscale + sharpen",
            raw.display(),
            primary_err
        );

        let simple_err = match self.simplify(raw, &out).and_then(|_| verify(&out)) {
            Ok(()) => return Ok((out, Quality::Simplified)),
            Err(e) => e,
        };
        log::warn!(
            "[PREPROCESS] Simplified strategy failed ({}) — degraded: copying source verbatim",
            simple_err
        );

        match std::fs::copy(raw, &out)
            .map_err(|e| e.to_string())
            .and_then(|_| verify(&out))
        {
            Ok(()) => Ok((out, Quality::Verbatim)),
            Err(copy_err) => {
                let _ = std::fs::remove_file(&out);
                log::error!("[PREPROCESS] All strategies failed for {}", raw.display());
                Err(PreprocessError::Exhausted {
                    path: raw.to_path_buf(),
                    reason: format!(
                        "enhance: {}; simplify: {}; copy: {}",
                        primary_err, simple_err, copy_err
                    ),
                })
            }
        }
    }

    fn enhance(&self, raw: &Path, out: &Path) -> Result<(), String> {
        let img = image::open(raw).map_err(|e| e.to_string())?;
        let img = self.fit_to_bound(img);
        let processed = img
            .grayscale()
            .adjust_contrast(self.options.contrast)
            .unsharpen(self.options.sharpen_sigma, self.options.sharpen_threshold);
        processed
            .save_with_format(out, ImageFormat::Png)
            .map_err(|e| e.to_string())
    }

    fn simplify(&self, raw: &Path, out: &Path) -> Result<(), String> {
        let img = image::open(raw).map_err(|e| e.to_string())?;
        img.grayscale()
            .unsharpen(1.0, 1)
            .save_with_format(out, ImageFormat::Png)
            .map_err(|e| e.to_string())
    }

    fn fit_to_bound(&self, img: DynamicImage) -> DynamicImage {
        let (max_w, max_h) = (self.options.max_width, self.options.max_height);
        if img.width() <= max_w && img.height() <= max_h {
            return img;
        }
        log::info!(
            "[PREPROCESS] Downscaling {}x{} to fit {}x{}",
            img.width(),
            img.height(),
            max_w,
            max_h
        );
        img.resize(max_w, max_h, FilterType::Lanczos3)
    }
}

fn is_non_empty(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn verify(path: &Path) -> Result<(), String> {
    if is_non_empty(path) {
        Ok(())
    } else {
        Err(format!("{} missing or empty", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_fn(w, h, |x, _| {
            if x % 7 == 0 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([240, 230, 220])
            }
        })
        .save(&path)
        .unwrap();
        path
    }

    #[test]
    fn produces_grayscale_artifact_alongside_source() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_png(dir.path(), "shot.png", 64, 32);

        let (out, quality) = ImagePreprocessor::default()
            .normalize_with_quality(&raw)
            .unwrap();
        assert_eq!(quality, Quality::Full);
        assert_eq!(out, dir.path().join("shot.normalized.png"));

        let img = image::open(&out).unwrap();
        assert_eq!(img.color(), image::ColorType::L8);
        assert_eq!((img.width(), img.height()), (64, 32));
    }

    #[test]
    fn second_call_reuses_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let raw = write_png(dir.path(), "shot.png", 16, 16);
        let pre = ImagePreprocessor::default();

        let out = pre.normalize(&raw).unwrap();
        std::fs::write(&out, b"sentinel").unwrap();

        let (again, quality) = pre.normalize_with_quality(&raw).unwrap();
        assert_eq!(again, out);
        assert_eq!(quality, Quality::Cached);
        assert_eq!(std::fs::read(&again).unwrap(), b"sentinel");
    }

    #[test]
    fn large_images_shrink_small_images_do_not_grow() {
        let dir = tempfile::tempdir().unwrap();
        let pre = ImagePreprocessor::new(PreprocessOptions {
            max_width: 100,
            max_height: 100,
            ..Default::default()
        });

        let big = write_png(dir.path(), "big.png", 400, 200);
        let img = image::open(pre.normalize(&big).unwrap()).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));

        let small = write_png(dir.path(), "small.png", 40, 20);
        let img = image::open(pre.normalize(&small).unwrap()).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[test]
    fn undecodable_source_falls_back_to_verbatim_copy() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("broken.png");
        std::fs::write(&raw, b"definitely not a png").unwrap();

        let (out, quality) = ImagePreprocessor::default()
            .normalize_with_quality(&raw)
            .unwrap();
        assert_eq!(quality, Quality::Verbatim);
        assert_eq!(std::fs::read(out).unwrap(), b"definitely not a png");
    }

    #[test]
    fn empty_source_exhausts_the_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("empty.png");
        std::fs::write(&raw, b"").unwrap();

        let err = ImagePreprocessor::default().normalize(&raw).unwrap_err();
        assert!(matches!(err, PreprocessError::Exhausted { .. }));
        assert!(!derived_path(&raw, "normalized").exists());
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImagePreprocessor::default()
            .normalize(&dir.path().join("nope.png"))
            .unwrap_err();
        assert!(matches!(err, PreprocessError::MissingSource(_)));
    }
}
