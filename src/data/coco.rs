// ============================================================
// Layer 4 — Caption Dataset Loader (COCO-style archives)
// ============================================================
// Loads the captioning corpus from two kinds of archive:
//
//   - a zip of JPEG images (train or validation split)
//   - a zip carrying the annotations JSON, with an `images`
//     array (id → file_name) and an `annotations` array
//     (image_id → caption text)
//
// The merge happens on the image id: annotations are joined to
// filenames, then filenames are joined to the decoded images in
// ARCHIVE ORDER. Index i of the returned images always refers
// to the same source file as index i of the returned captions —
// downstream embedding and caption arrays stay aligned by
// construction.
//
// A member that cannot be decoded is skipped with a warning so
// one corrupt JPEG does not abort a multi-gigabyte run; images
// without any caption are filtered out.

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::caption::Caption;
use crate::domain::image::ImageRecord;

// ─── Annotations JSON schema ──────────────────────────────────────────────────
// Only the fields the merge needs — serde ignores the rest
// (licenses, bounding boxes, ...).

#[derive(Debug, Deserialize)]
struct Annotations {
    images: Vec<AnnotatedImage>,
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct AnnotatedImage {
    id: u64,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    image_id: u64,
    caption: String,
}

/// Decode every `.jpg` member of a zip archive, resized to
/// `img_size` × `img_size`, preserving archive member order.
pub fn load_images(zip_path: &Path, img_size: usize) -> Result<Vec<ImageRecord>> {
    let file = File::open(zip_path)
        .with_context(|| format!("Cannot open image archive '{}'", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("'{}' is not a valid zip archive", zip_path.display()))?;

    let mut images = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.is_file() || !entry.name().ends_with(".jpg") {
            continue;
        }

        // Zip member names may carry a directory prefix ("train2014/...")
        let filename = base_name(entry.name());

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        match decode_jpeg(&filename, &bytes, img_size) {
            Ok(record) => images.push(record),
            // Log a warning but continue — don't fail on one bad member
            Err(e) => tracing::warn!("Skipping '{}': {}", filename, e),
        }
    }

    tracing::info!(
        "Decoded {} images from '{}'",
        images.len(),
        zip_path.display()
    );
    Ok(images)
}

/// Read the annotations JSON for one split out of the captions
/// zip and return filename → tokenised captions.
pub fn load_captions(zip_path: &Path, json_member: &str) -> Result<HashMap<String, Vec<Caption>>> {
    let file = File::open(zip_path)
        .with_context(|| format!("Cannot open captions archive '{}'", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut entry = archive
        .by_name(json_member)
        .map_err(|_| anyhow!("'{}' not found in '{}'", json_member, zip_path.display()))?;
    let mut json = String::with_capacity(entry.size() as usize);
    entry.read_to_string(&mut json)?;

    let parsed: Annotations = serde_json::from_str(&json)
        .with_context(|| format!("Malformed annotations JSON in '{}'", json_member))?;

    // id → filename, then image_id → captions
    let filenames: HashMap<u64, &str> = parsed
        .images
        .iter()
        .map(|img| (img.id, img.file_name.as_str()))
        .collect();

    let mut by_filename: HashMap<String, Vec<Caption>> = HashMap::new();
    let mut orphans = 0usize;
    for ann in &parsed.annotations {
        match filenames.get(&ann.image_id) {
            Some(name) => by_filename
                .entry(base_name(name))
                .or_default()
                .push(Caption::from_text(&ann.caption)),
            None => orphans += 1,
        }
    }
    if orphans > 0 {
        tracing::warn!("{} annotations referenced unknown image ids", orphans);
    }

    tracing::info!("Loaded captions for {} images", by_filename.len());
    Ok(by_filename)
}

/// Join decoded images with their captions, keeping only images
/// that have at least one caption and preserving image order.
/// The two returned Vecs have equal length and aligned indices.
pub fn align(
    images: Vec<ImageRecord>,
    captions: &HashMap<String, Vec<Caption>>,
) -> (Vec<ImageRecord>, Vec<Vec<Caption>>) {
    let mut kept_images = Vec::with_capacity(images.len());
    let mut kept_captions = Vec::with_capacity(images.len());

    for image in images {
        if let Some(caps) = captions.get(&image.filename) {
            kept_captions.push(caps.clone());
            kept_images.push(image);
        } else {
            tracing::debug!("No captions for '{}' — dropped", image.filename);
        }
    }

    (kept_images, kept_captions)
}

/// Decode a single image straight from the filesystem, e.g. an
/// image the user wants captioned.
pub fn load_image_file(path: &Path, img_size: usize) -> Result<ImageRecord> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Cannot read image '{}'", path.display()))?;
    let filename = base_name(&path.to_string_lossy());
    decode_jpeg(&filename, &bytes, img_size)
}

/// Decode raw JPEG bytes into a normalised channel-major record.
fn decode_jpeg(filename: &str, bytes: &[u8], img_size: usize) -> Result<ImageRecord> {
    let decoded = image::load_from_memory(bytes)
        .with_context(|| format!("Cannot decode '{}'", filename))?;
    let rgb = decoded
        .resize_exact(img_size as u32, img_size as u32, FilterType::Triangle)
        .to_rgb8();

    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let mut pixels = vec![0f32; ImageRecord::CHANNELS * h * w];
    for (x, y, p) in rgb.enumerate_pixels() {
        for c in 0..ImageRecord::CHANNELS {
            pixels[c * h * w + y as usize * w + x as usize] = f32::from(p.0[c]) / 255.0;
        }
    }

    Ok(ImageRecord::new(filename, w, h, pixels))
}

fn base_name(member: &str) -> String {
    Path::new(member)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(member)
        .to_string()
}
