//! Image optimisation.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, ImageFormat};
use rayon::prelude::*;
use regex::Regex;
use siteforge_pipeline::{Task, TaskError, TaskOutput};

use crate::config::SiteConfig;
use crate::output::{read_file, relative_to, write_file};

/// Re-encodes images and writes them under the images output directory,
/// keeping the source's relative layout.
pub struct ImagesTask {
    config: SiteConfig,
}

impl ImagesTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn process(&self, source: &Path, base: &Path) -> Result<PathBuf, TaskError> {
        let original = read_file(source)?;
        let optimized = optimize(source, &original, self.config.images.jpeg_quality);

        let bytes = match optimized {
            Ok(Some(smaller)) if smaller.len() < original.len() => {
                tracing::debug!(
                    "{}: {} -> {} bytes",
                    source.display(),
                    original.len(),
                    smaller.len()
                );
                smaller
            }
            Ok(_) => original,
            Err(e) => {
                return Err(TaskError::compile(source.display(), e));
            }
        };

        let target = self
            .config
            .dest(&self.config.images.dest)
            .join(relative_to(source, base));

        write_file(&target, bytes)
    }
}

impl Task for ImagesTask {
    fn name(&self) -> &'static str {
        "images"
    }

    fn description(&self) -> &'static str {
        "Compress images"
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let group = self.config.source_group(&self.config.images.src)?;
        let written = group
            .files()
            .par_iter()
            .map(|file| self.process(file, group.base()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TaskOutput { written })
    }
}

/// Optimised bytes for formats we know how to shrink, `None` for formats
/// copied as-is.
pub fn optimize(path: &Path, bytes: &[u8], jpeg_quality: u8) -> Result<Option<Vec<u8>>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" => optimize_png(bytes).map(Some).map_err(|e| e.to_string()),
        "jpg" | "jpeg" => optimize_jpeg(bytes, jpeg_quality)
            .map(Some)
            .map_err(|e| e.to_string()),
        "svg" => {
            let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
            Ok(Some(optimize_svg(text).into_bytes()))
        }
        _ => Ok(None),
    }
}

fn optimize_png(bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
    let img = image::load(Cursor::new(bytes), ImageFormat::Png)?;

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive).write_image(
        img.as_bytes(),
        img.width(),
        img.height(),
        img.color(),
    )?;
    Ok(out)
}

fn optimize_jpeg(bytes: &[u8], quality: u8) -> image::ImageResult<Vec<u8>> {
    let rgb = image::load(Cursor::new(bytes), ImageFormat::Jpeg)?.to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Strip comments, XML prologue, metadata, and whitespace between tags.
/// `viewBox` and ids are left alone.
pub fn optimize_svg(svg: &str) -> String {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    static BETWEEN_TAGS: OnceLock<Regex> = OnceLock::new();

    let noise = NOISE.get_or_init(|| {
        Regex::new(r"(?s)<\?xml.*?\?>|<!DOCTYPE[^>]*>|<!--.*?-->|<metadata\b.*?</metadata>")
            .expect("valid regex")
    });
    let between = BETWEEN_TAGS.get_or_init(|| Regex::new(r">\s+<").expect("valid regex"));

    let stripped = noise.replace_all(svg, "");
    between.replace_all(stripped.trim(), "><").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::tempdir;

    fn sample_png() -> Vec<u8> {
        let img = RgbImage::from_fn(64, 64, |x, _| Rgb([(x * 4) as u8, 0, 0]));
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 64, 64, ColorType::Rgb8)
            .unwrap();
        out
    }

    fn sample_jpeg(quality: u8) -> Vec<u8> {
        let img = RgbImage::from_fn(96, 64, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, ((x ^ y) * 5) as u8])
        });
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode(img.as_raw(), 96, 64, ColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn jpeg_is_reencoded_at_configured_quality() {
        let original = sample_jpeg(100);
        let optimized = optimize(Path::new("photo.JPG"), &original, 75).unwrap().unwrap();

        assert!(optimized.len() < original.len());
        let decoded = image::load_from_memory(&optimized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (96, 64));
        assert_eq!(
            image::guess_format(&optimized).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn larger_result_keeps_original_bytes() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("dist");
        fs::create_dir_all(src.join("img")).unwrap();

        let original = sample_jpeg(10);
        fs::write(src.join("img/thumb.jpg"), &original).unwrap();

        let mut config = SiteConfig::with_paths(&src, &out);
        config.images.jpeg_quality = 100;
        let grown = optimize(Path::new("thumb.jpg"), &original, 100).unwrap().unwrap();
        assert!(grown.len() > original.len());

        ImagesTask::new(&config).run().unwrap();
        assert_eq!(fs::read(out.join("images/thumb.jpg")).unwrap(), original);
    }

    #[test]
    fn strips_svg_noise() {
        let svg = r#"<?xml version="1.0"?>
<!-- Generator: Sketch -->
<svg viewBox="0 0 10 10" xmlns="http://www.w3.org/2000/svg">
  <metadata>junk</metadata>
  <path id="p" d="M0 0h10"/>
</svg>
"#;
        let out = optimize_svg(svg);

        assert_eq!(
            out,
            r#"<svg viewBox="0 0 10 10" xmlns="http://www.w3.org/2000/svg"><path id="p" d="M0 0h10"/></svg>"#
        );
    }

    #[test]
    fn recompressed_png_decodes_identically() {
        let original = sample_png();
        let optimized = optimize(Path::new("a.png"), &original, 75).unwrap().unwrap();

        let before = image::load_from_memory(&original).unwrap().to_rgb8();
        let after = image::load_from_memory(&optimized).unwrap().to_rgb8();
        assert_eq!(before, after);
    }

    #[test]
    fn unknown_formats_are_copied() {
        assert_eq!(optimize(Path::new("a.gif"), b"GIF89a", 75).unwrap(), None);
    }

    #[test]
    fn corrupt_image_is_an_error() {
        assert!(optimize(Path::new("a.png"), b"not a png", 75).is_err());
    }

    #[test]
    fn mirrors_source_layout() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("dist");
        fs::create_dir_all(src.join("img/icons")).unwrap();

        fs::write(src.join("img/hero.png"), sample_png()).unwrap();
        fs::write(src.join("img/icons/dot.svg"), "<svg>\n  <circle r=\"1\"/>\n</svg>").unwrap();
        fs::write(src.join("img/anim.gif"), b"GIF89a....").unwrap();

        let config = SiteConfig::with_paths(&src, &out);
        let output = ImagesTask::new(&config).run().unwrap();

        assert_eq!(output.len(), 3);
        assert!(out.join("images/hero.png").exists());
        assert_eq!(
            fs::read_to_string(out.join("images/icons/dot.svg")).unwrap(),
            "<svg><circle r=\"1\"/></svg>"
        );
        assert_eq!(fs::read(out.join("images/anim.gif")).unwrap(), b"GIF89a....");
    }
}
