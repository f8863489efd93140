use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use crate::catalog::{DatasetDescriptor, DatasetKind};
use crate::util::ensure_directory;

pub fn place_payload(
    descriptor: &DatasetDescriptor,
    extract_dir: &Path,
    data_dir: &Path,
    georef_root: &Path,
) -> Result<Vec<PathBuf>> {
    ensure_directory(data_dir)?;

    let mut placed = Vec::new();
    for payload_dir in find_payload_dirs(extract_dir, descriptor.payload_dir)? {
        for source in regular_files(&payload_dir)? {
            let Some(file_name) = source.file_name() else {
                continue;
            };
            let target = data_dir.join(file_name);
            fs::rename(&source, &target).with_context(|| {
                format!("failed to move {} -> {}", source.display(), target.display())
            })?;

            if let DatasetKind::Raster(spec) = &descriptor.kind {
                let sidecar = Path::new(file_name).with_extension(spec.sidecar_ext);
                let sidecar_source = georef_root.join(spec.georef_path).join(&sidecar);
                let sidecar_target = data_dir.join(&sidecar);
                fs::copy(&sidecar_source, &sidecar_target).with_context(|| {
                    format!(
                        "missing georeferencing file {} for {}",
                        sidecar_source.display(),
                        target.display()
                    )
                })?;
            }

            placed.push(target);
        }
    }

    debug!(dataset = descriptor.name, files = placed.len(), "placed payload");
    Ok(placed)
}

fn find_payload_dirs(extract_dir: &Path, payload_dir: &str) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(extract_dir).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("failed to walk {}", extract_dir.display()))?;
        if entry.file_type().is_dir() && entry.file_name() == payload_dir {
            dirs.push(entry.into_path());
        }
    }

    Ok(dirs)
}

fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?
            .is_file()
        {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
