// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Reads the four gzipped IDX files of the MNIST handwritten
// digit database:
//
//   train-images-idx3-ubyte.gz   magic 2051, [n, rows, cols]
//   train-labels-idx1-ubyte.gz   magic 2049, [n]
//   t10k-images-idx3-ubyte.gz
//   t10k-labels-idx1-ubyte.gz
//
// Pixels are normalised to [0, 1]. The last 10 000 training
// examples are reserved as a validation split, and the images
// can optionally be kept flattened to 784-element vectors.
//
// IDX header fields are big-endian 32-bit integers.

use anyhow::{anyhow, bail, Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

const VALIDATION_COUNT: usize = 10_000;

/// One split: images[i] is labelled labels[i].
#[derive(Debug)]
pub struct MnistSplit {
    pub images: Vec<Vec<f32>>,
    pub labels: Vec<u8>,
}

impl MnistSplit {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[derive(Debug)]
pub struct MnistDataset {
    pub train: MnistSplit,
    pub val: MnistSplit,
    pub test: MnistSplit,
    /// (rows, cols) of one image; (rows * cols, 1) when flattened
    pub image_shape: (usize, usize),
}

/// Raw contents of one IDX file.
struct IdxFile {
    sizes: Vec<usize>,
    data: Vec<u8>,
}

impl IdxFile {
    fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open IDX file '{}'", path.display()))?;
        let mut contents = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut contents)
            .with_context(|| format!("Gzip error in '{}'", path.display()))?;

        let mut r = Cursor::new(&contents);
        let magic = r.read_i32::<BigEndian>()?;
        let dims = match magic {
            2049 => 1, // labels
            2051 => 3, // images
            other => bail!("Invalid IDX magic {} in '{}'", other, path.display()),
        };
        let mut sizes = Vec::with_capacity(dims);
        for _ in 0..dims {
            sizes.push(r.read_i32::<BigEndian>()? as usize);
        }
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;

        let expected: usize = sizes.iter().product();
        if data.len() < expected {
            bail!(
                "IDX file '{}' truncated: {} bytes, expected {}",
                path.display(),
                data.len(),
                expected
            );
        }
        Ok(Self { sizes, data })
    }
}

/// Load MNIST from `data_dir`, producing train/val/test splits.
pub fn load_mnist(data_dir: &Path, flatten: bool) -> Result<MnistDataset> {
    let (mut train_images, rows, cols) =
        read_images(&data_dir.join("train-images-idx3-ubyte.gz"))?;
    let mut train_labels = read_labels(&data_dir.join("train-labels-idx1-ubyte.gz"))?;
    let (test_images, _, _) = read_images(&data_dir.join("t10k-images-idx3-ubyte.gz"))?;
    let test_labels = read_labels(&data_dir.join("t10k-labels-idx1-ubyte.gz"))?;

    if train_images.len() != train_labels.len() {
        bail!(
            "MNIST train: {} images but {} labels",
            train_images.len(),
            train_labels.len()
        );
    }
    if test_images.len() != test_labels.len() {
        bail!(
            "MNIST test: {} images but {} labels",
            test_images.len(),
            test_labels.len()
        );
    }
    if train_images.len() <= VALIDATION_COUNT {
        bail!(
            "MNIST train split has only {} examples, need more than {}",
            train_images.len(),
            VALIDATION_COUNT
        );
    }

    // Last 10 000 training examples become the validation split
    let cut = train_images.len() - VALIDATION_COUNT;
    let val_images = train_images.split_off(cut);
    let val_labels = train_labels.split_off(cut);

    let image_shape = if flatten { (rows * cols, 1) } else { (rows, cols) };

    tracing::info!(
        "MNIST: {} train / {} val / {} test examples of shape {:?}",
        train_images.len(),
        val_images.len(),
        test_images.len(),
        image_shape
    );

    Ok(MnistDataset {
        train: MnistSplit { images: train_images, labels: train_labels },
        val: MnistSplit { images: val_images, labels: val_labels },
        test: MnistSplit { images: test_images, labels: test_labels },
        image_shape,
    })
}

fn read_images(path: &Path) -> Result<(Vec<Vec<f32>>, usize, usize)> {
    let idx = IdxFile::read(path)?;
    let &[count, rows, cols] = idx.sizes.as_slice() else {
        return Err(anyhow!("'{}' is not an image IDX file", path.display()));
    };
    let image_size = rows * cols;
    let images = (0..count)
        .map(|i| {
            idx.data[i * image_size..(i + 1) * image_size]
                .iter()
                .map(|&b| f32::from(b) / 255.0)
                .collect()
        })
        .collect();
    Ok((images, rows, cols))
}

fn read_labels(path: &Path) -> Result<Vec<u8>> {
    let idx = IdxFile::read(path)?;
    let count = idx.sizes[0];
    Ok(idx.data[..count].to_vec())
}
