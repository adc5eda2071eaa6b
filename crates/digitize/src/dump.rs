use anyhow::Context;
use preprocess::{LayoutSpec, Tensor};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the tensor's flat buffer as raw float32 bytes in native byte order.
pub fn dump_tensor(path: &Path, tensor: &Tensor) -> anyhow::Result<()> {
    let mut f = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    f.write_all(bytemuck::cast_slice(tensor.as_slice()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub source: String,
    pub tensor: String,
}

/// Describes a directory of dumped tensors so a consumer can reload them.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub preset: String,
    pub layout: String,
    pub shape: [usize; 4],
    pub dtype: &'static str,
    pub endian: &'static str,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(preset: &str, layout: &LayoutSpec) -> Self {
        Self {
            preset: preset.to_string(),
            layout: layout.order.as_str().to_string(),
            shape: layout.shape(),
            dtype: "float32",
            endian: if cfg!(target_endian = "little") {
                "little"
            } else {
                "big"
            },
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, source: &Path, tensor: &str) {
        self.entries.push(ManifestEntry {
            source: source.display().to_string(),
            tensor: tensor.to_string(),
        });
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
