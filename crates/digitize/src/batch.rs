use crate::capture::load_raster;
use crate::dump::{Manifest, dump_tensor};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use preprocess::{Pipeline, Tensor};
use std::path::{Path, PathBuf};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: usize,
    pub failed: Vec<PathBuf>,
}

/// Preprocess every drawing into `output`, then write `manifest.json`.
///
/// A drawing that cannot be read or preprocessed is logged and skipped; the
/// manifest lists only the tensors that were written.
pub fn digitize_all(
    pipeline: &Pipeline,
    preset: &str,
    paths: &[PathBuf],
    output: &Path,
    preview: bool,
) -> anyhow::Result<BatchReport> {
    let progress = ProgressBar::new(paths.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} {wide_msg}",
    )?);

    let mut manifest = Manifest::new(preset, &pipeline.config().layout);
    let mut report = BatchReport::default();

    for (idx, path) in paths.iter().enumerate() {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "drawing".to_string());
        progress.set_message(stem.clone());

        let name = format!("{idx:04}_{stem}.bin");
        match process_drawing(pipeline, path, &output.join(&name)) {
            Ok(tensor) => {
                manifest.push(path, &name);
                report.written += 1;
                if preview {
                    progress.suspend(|| println!("{}\n{}", path.display(), tensor.preview()));
                }
            }
            Err(e) => {
                let error = format!("{e:#}");
                progress.suspend(|| {
                    tracing::warn!(path = %path.display(), error, "Skipping drawing")
                });
                report.failed.push(path.clone());
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    manifest.write(&output.join("manifest.json"))?;

    Ok(report)
}

fn process_drawing(pipeline: &Pipeline, path: &Path, target: &Path) -> anyhow::Result<Tensor> {
    let raster = load_raster(path)?;
    let tensor = pipeline
        .run(&raster)
        .with_context(|| format!("Failed to preprocess {}", path.display()))?;
    dump_tensor(target, &tensor)?;
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use preprocess::{LayoutSpec, PipelineConfig};
    use tempfile::tempdir;

    #[test]
    fn test_unreadable_drawing_is_skipped_and_manifest_written() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("tensors");
        std::fs::create_dir_all(&output).unwrap();

        let good = dir.path().join("a_good.png");
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        img.put_pixel(8, 8, Rgba([0, 0, 0, 255]));
        img.save(&good).unwrap();

        let broken = dir.path().join("b_broken.png");
        std::fs::write(&broken, b"not a png").unwrap();

        let pipeline =
            Pipeline::new(PipelineConfig::freehand_canvas(LayoutSpec::default())).unwrap();
        let paths = [good, broken.clone()];
        let report = digitize_all(&pipeline, "canvas", &paths, &output, false).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.failed, vec![broken]);
        assert!(output.join("0000_a_good.bin").exists());
        assert!(!output.join("0001_b_broken.bin").exists());

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(output.join("manifest.json")).unwrap(),
        )
        .unwrap();
        let entries = json["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1, "Only the written tensor is listed");
        assert_eq!(entries[0]["tensor"], "0000_a_good.bin");
    }
}
