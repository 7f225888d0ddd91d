// ============================================================
// Layer 4 — CIFAR-10 Loader
// ============================================================
// Reads the binary distribution (cifar-10-binary.tar.gz). Each
// batch file is a flat run of 3073-byte records:
//
//   [label u8][1024 red][1024 green][1024 blue]
//
// data_batch_1..5.bin form the training split, test_batch.bin
// the test split. Pixels are centred to [-0.5, 0.5] and labels
// are one-hot encoded over the 10 classes.

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;

pub const NUM_CLASSES: usize = 10;
const IMAGE_BYTES: usize = 3 * 32 * 32;
const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

#[derive(Debug)]
pub struct Cifar10Dataset {
    /// Channel-major pixel vectors in [-0.5, 0.5], 3072 values each
    pub x_train: Vec<Vec<f32>>,
    /// One-hot label vectors, 10 values each
    pub y_train: Vec<Vec<f32>>,
    pub x_test: Vec<Vec<f32>>,
    pub y_test: Vec<Vec<f32>>,
}

/// One-hot encode a class label.
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f32> {
    let mut v = vec![0.0; num_classes];
    if label < num_classes {
        v[label] = 1.0;
    }
    v
}

/// Load CIFAR-10 from the binary tar.gz archive.
pub fn load_cifar10(archive_path: &Path) -> Result<Cifar10Dataset> {
    let file = File::open(archive_path)
        .with_context(|| format!("Cannot open CIFAR archive '{}'", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut x_train = Vec::new();
    let mut y_train = Vec::new();
    let mut x_test = Vec::new();
    let mut y_test = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let member = entry.path()?.to_string_lossy().into_owned();
        let name = Path::new(&member)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let is_train = name.starts_with("data_batch_") && name.ends_with(".bin");
        let is_test = name == "test_batch.bin";
        if !is_train && !is_test {
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        let (xs, ys) = parse_batch(&name, &bytes)?;

        if is_train {
            x_train.extend(xs);
            y_train.extend(ys);
        } else {
            x_test.extend(xs);
            y_test.extend(ys);
        }
    }

    if x_train.is_empty() {
        bail!("No data batches found in '{}'", archive_path.display());
    }

    tracing::info!(
        "CIFAR-10: {} train / {} test examples",
        x_train.len(),
        x_test.len()
    );
    Ok(Cifar10Dataset { x_train, y_train, x_test, y_test })
}

/// Split one batch file into (pixels, one-hot label) pairs.
fn parse_batch(name: &str, bytes: &[u8]) -> Result<(Vec<Vec<f32>>, Vec<Vec<f32>>)> {
    if bytes.len() % RECORD_BYTES != 0 {
        bail!(
            "'{}' has {} bytes, not a multiple of the {}-byte record",
            name,
            bytes.len(),
            RECORD_BYTES
        );
    }

    let mut xs = Vec::with_capacity(bytes.len() / RECORD_BYTES);
    let mut ys = Vec::with_capacity(bytes.len() / RECORD_BYTES);
    for record in bytes.chunks_exact(RECORD_BYTES) {
        let label = record[0] as usize;
        if label >= NUM_CLASSES {
            bail!("'{}' contains out-of-range label {}", name, label);
        }
        // centre pixels: byte / 255 - 0.5
        let pixels = record[1..]
            .iter()
            .map(|&b| f32::from(b) / 255.0 - 0.5)
            .collect();
        xs.push(pixels);
        ys.push(one_hot(label, NUM_CLASSES));
    }
    Ok((xs, ys))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![label];
        r.extend(std::iter::repeat(fill).take(IMAGE_BYTES));
        r
    }

    #[test]
    fn test_parse_batch_shapes_and_alignment() {
        let mut bytes = record(3, 0);
        bytes.extend(record(7, 255));

        let (xs, ys) = parse_batch("data_batch_1.bin", &bytes).unwrap();
        assert_eq!(xs.len(), ys.len());
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].len(), IMAGE_BYTES);
        assert_eq!(ys[0].len(), NUM_CLASSES);
        // record 0 is label 3, record 1 is label 7 — order preserved
        assert_eq!(ys[0][3], 1.0);
        assert_eq!(ys[1][7], 1.0);
    }

    #[test]
    fn test_pixels_are_centred() {
        let bytes = record(0, 255);
        let (xs, _) = parse_batch("data_batch_1.bin", &bytes).unwrap();
        assert!((xs[0][0] - 0.5).abs() < 1e-6);

        let bytes = record(0, 0);
        let (xs, _) = parse_batch("data_batch_1.bin", &bytes).unwrap();
        assert!((xs[0][0] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        let mut bytes = record(1, 0);
        bytes.pop();
        assert!(parse_batch("data_batch_1.bin", &bytes).is_err());
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(2, 4), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        let bytes = record(10, 0);
        assert!(parse_batch("data_batch_1.bin", &bytes).is_err());
    }
}
