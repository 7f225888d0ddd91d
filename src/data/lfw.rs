// ============================================================
// Layer 4 — Labeled Faces in the Wild Loader
// ============================================================
// LFW ships as a gzipped tar of JPEGs plus a tab-separated
// attributes file. The two are joined on the composite key
// (person name, photo number), which has to be recovered from
// the archive member filename:
//
//   lfw/Aaron_Eckhart/Aaron_Eckhart_0001.jpg
//       └── person = "Aaron Eckhart", photo number = 1
//
// Rules:
//   - only images whose key appears in the attributes table are
//     kept (attribute rows with no matching image are dropped
//     implicitly — they are simply never looked up)
//   - attribute rows are emitted in IMAGE order, so that
//     attributes[i] describes images[i]
//   - a .jpg member whose name does not follow the convention is
//     a data-integrity error and aborts the load
//
// Images are cropped by a fixed border before resizing, which
// removes the background the deep-funneled alignment adds.

use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use image::imageops::FilterType;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tar::Archive;

use crate::domain::image::ImageRecord;

/// Crop/resize parameters for the LFW loader.
#[derive(Debug, Clone, Copy)]
pub struct LfwParams {
    /// Horizontal border to crop from each side, in pixels
    pub dx: u32,
    /// Vertical border to crop from each side, in pixels
    pub dy: u32,
    /// Output width
    pub dimx: usize,
    /// Output height
    pub dimy: usize,
}

impl Default for LfwParams {
    fn default() -> Self {
        Self { dx: 80, dy: 80, dimx: 45, dimy: 45 }
    }
}

/// The joined dataset. Invariant: images.len() == attributes.len()
/// and attributes[i] belongs to images[i].
#[derive(Debug)]
pub struct LfwDataset {
    pub images: Vec<ImageRecord>,
    pub attribute_names: Vec<String>,
    pub attributes: Vec<Vec<f32>>,
}

impl LfwDataset {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load LFW images and merge them with the attributes table.
pub fn load_lfw(images_tgz: &Path, attrs_path: &Path, params: LfwParams) -> Result<LfwDataset> {
    let (attribute_names, attr_rows) = load_attributes(attrs_path)?;

    let file = File::open(images_tgz)
        .with_context(|| format!("Cannot open image archive '{}'", images_tgz.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut images = Vec::new();
    let mut attributes = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let member = entry.path()?.to_string_lossy().into_owned();
        if !member.ends_with(".jpg") {
            continue;
        }

        let filename = Path::new(&member)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&member)
            .to_string();
        let key = parse_member_name(&filename)?;

        // Only keep photos that carry attribute annotations;
        // the attribute row is pushed in image order.
        let Some(row) = attr_rows.get(&key) else {
            continue;
        };

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        images.push(decode_face(&filename, &bytes, params)?);
        attributes.push(row.clone());
    }

    tracing::info!(
        "LFW: kept {} of the annotated photos ({} attribute columns)",
        images.len(),
        attribute_names.len()
    );

    Ok(LfwDataset { images, attribute_names, attributes })
}

/// Recover (person, photo number) from "First_Last_0001.jpg".
/// Anything that does not end in `_<number>.jpg` is malformed.
pub fn parse_member_name(filename: &str) -> Result<(String, u32)> {
    let stem = filename
        .strip_suffix(".jpg")
        .ok_or_else(|| anyhow!("'{}' is not a .jpg member", filename))?;

    let mut parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 2 {
        bail!("Cannot parse LFW member name '{}'", filename);
    }
    let number = parts
        .pop()
        .unwrap()
        .parse::<u32>()
        .with_context(|| format!("Cannot parse photo number in '{}'", filename))?;

    Ok((parts.join(" "), number))
}

/// Parse the tab-separated attributes file. The first line is a
/// free-text comment, the second the column header. A trailing
/// tab on data lines produces one empty field, which is ignored.
fn load_attributes(path: &Path) -> Result<(Vec<String>, HashMap<(String, u32), Vec<f32>>)> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open attributes file '{}'", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    lines.next(); // comment line
    let header = lines
        .next()
        .ok_or_else(|| anyhow!("Attributes file '{}' has no header", path.display()))??;
    let names: Vec<String> = header
        .trim_start_matches('#')
        .split('\t')
        .skip(2) // person, imagenum
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let mut rows = HashMap::new();
    for (lineno, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 + names.len() {
            bail!(
                "Attributes line {} has {} fields, expected at least {}",
                lineno + 3,
                fields.len(),
                2 + names.len()
            );
        }
        let person = fields[0].to_string();
        let imagenum: u32 = fields[1]
            .trim()
            .parse()
            .with_context(|| format!("Bad image number on attributes line {}", lineno + 3))?;
        let values = fields[2..2 + names.len()]
            .iter()
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Bad attribute value on line {}", lineno + 3))?;
        rows.insert((person, imagenum), values);
    }

    Ok((names, rows))
}

fn decode_face(filename: &str, bytes: &[u8], params: LfwParams) -> Result<ImageRecord> {
    let decoded = image::load_from_memory(bytes)
        .with_context(|| format!("Cannot decode '{}'", filename))?;

    let (w, h) = (decoded.width(), decoded.height());
    if w <= 2 * params.dx || h <= 2 * params.dy {
        bail!("'{}' is {}x{} — too small for a {}x{} border crop",
            filename, w, h, params.dx, params.dy);
    }

    let rgb = decoded
        .crop_imm(params.dx, params.dy, w - 2 * params.dx, h - 2 * params.dy)
        .resize_exact(params.dimx as u32, params.dimy as u32, FilterType::Triangle)
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

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_two_part_name() {
        let (person, num) = parse_member_name("Aaron_Eckhart_0001.jpg").unwrap();
        assert_eq!(person, "Aaron Eckhart");
        assert_eq!(num, 1);
    }

    #[test]
    fn test_parse_many_part_name() {
        let (person, num) = parse_member_name("Jose_Maria_Aznar_0012.jpg").unwrap();
        assert_eq!(person, "Jose Maria Aznar");
        assert_eq!(num, 12);
    }

    #[test]
    fn test_parse_rejects_missing_number() {
        assert!(parse_member_name("README.jpg").is_err());
        assert!(parse_member_name("Aaron_Eckhart.jpg").is_err());
    }

    #[test]
    fn test_parse_rejects_non_jpg() {
        assert!(parse_member_name("Aaron_Eckhart_0001.png").is_err());
    }

    #[test]
    fn test_attributes_parse_and_key() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# produced by some tool").unwrap();
        writeln!(f, "person\timagenum\tMale\tSmiling").unwrap();
        writeln!(f, "Aaron Eckhart\t1\t1.5\t-0.25").unwrap();
        writeln!(f, "Jose Maria Aznar\t12\t0.0\t2.0").unwrap();

        let (names, rows) = load_attributes(f.path()).unwrap();
        assert_eq!(names, vec!["Male", "Smiling"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[&("Aaron Eckhart".to_string(), 1)],
            vec![1.5, -0.25]
        );
    }

    #[test]
    fn test_attributes_reject_short_line() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# comment").unwrap();
        writeln!(f, "person\timagenum\tMale\tSmiling").unwrap();
        writeln!(f, "Someone\t1\t0.5").unwrap();

        assert!(load_attributes(f.path()).is_err());
    }
}
