// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch so a run can be plotted after
// the fact. Opening in append mode means a resumed run keeps
// extending the same file; a fresh run should start from a fresh
// checkpoint directory.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

pub struct MetricsLogger {
    path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub ema_loss: f64,
    pub val_loss: f64,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { path: dir.join("metrics.csv") }
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let write_header = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open metrics file '{}'", self.path.display()))?;

        if write_header {
            writeln!(file, "epoch,train_loss,ema_loss,val_loss")?;
        }
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.ema_loss, m.val_loss
        )?;
        Ok(())
    }
}
