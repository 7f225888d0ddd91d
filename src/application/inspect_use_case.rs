// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Loads one of the classic teaching datasets and reports its
// shape, so a fresh download can be verified before it is used
// in the exercises. Each report also re-checks the loader's
// alignment invariant: index i of the data always pairs with
// index i of the labels/attributes.
//
// No printing here — the report string goes back to the CLI.

use anyhow::Result;
use std::path::Path;

use crate::data::{cifar10, lfw, mnist, names};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectTarget {
    Lfw,
    Mnist,
    Cifar10,
    Names,
}

pub struct InspectUseCase {
    data_dir: String,
}

impl InspectUseCase {
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn execute(&self, target: InspectTarget) -> Result<String> {
        let dir = Path::new(&self.data_dir);
        match target {
            InspectTarget::Lfw => {
                let ds = lfw::load_lfw(
                    &dir.join("lfw-deepfunneled.tgz"),
                    &dir.join("lfw_attributes.txt"),
                    lfw::LfwParams::default(),
                )?;
                anyhow::ensure!(
                    ds.images.len() == ds.attributes.len(),
                    "LFW images and attribute rows are misaligned"
                );
                Ok(format!(
                    "LFW: {} images with {} attributes each (first: '{}')",
                    ds.len(),
                    ds.attribute_names.len(),
                    ds.images.first().map(|i| i.filename.as_str()).unwrap_or("-"),
                ))
            }
            InspectTarget::Mnist => {
                let ds = mnist::load_mnist(dir, false)?;
                anyhow::ensure!(
                    ds.train.images.len() == ds.train.labels.len(),
                    "MNIST train images and labels are misaligned"
                );
                Ok(format!(
                    "MNIST: {} train / {} val / {} test, image shape {}x{}",
                    ds.train.len(),
                    ds.val.len(),
                    ds.test.len(),
                    ds.image_shape.0,
                    ds.image_shape.1,
                ))
            }
            InspectTarget::Cifar10 => {
                let ds = cifar10::load_cifar10(&dir.join("cifar-10-binary.tar.gz"))?;
                anyhow::ensure!(
                    ds.x_train.len() == ds.y_train.len() && ds.x_test.len() == ds.y_test.len(),
                    "CIFAR-10 images and labels are misaligned"
                );
                Ok(format!(
                    "CIFAR-10: {} train / {} test images, {} classes",
                    ds.x_train.len(),
                    ds.x_test.len(),
                    cifar10::NUM_CLASSES,
                ))
            }
            InspectTarget::Names => {
                let list = names::load_names(&dir.join("names.txt"))?;
                Ok(format!(
                    "Names: {} entries (first: '{}')",
                    list.len(),
                    list.first().map(String::as_str).unwrap_or("-").trim(),
                ))
            }
        }
    }
}
