use anyhow::Context;
use preprocess::Raster;
use std::path::Path;

/// Read a saved drawing as an RGBA raster snapshot.
pub fn load_raster(path: &Path) -> anyhow::Result<Raster> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    tracing::debug!(path = %path.display(), width, height, "Loaded drawing");

    Ok(Raster::from_rgba(width, height, img.into_raw())?)
}
