use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::catalog::lookup_by_name;
use crate::cli::StatusArgs;
use crate::commands::manifest::MANIFEST_PREFIX;
use crate::layout::DestinationLayout;
use crate::model::FetchRunManifest;
use crate::util::list_files_with_extension;

pub fn run(args: StatusArgs) -> Result<()> {
    let layout = DestinationLayout::new(&args.dst_folder);
    info!(dst_folder = %layout.root().display(), "status requested");

    let downloads_root = layout.downloads_root();
    if downloads_root.is_dir() {
        for dir in subdirectories(&downloads_root)? {
            let archives = list_files_with_extension(&dir, "zip")?.len();
            info!(dataset = %dir_name(&dir), archives, "downloaded archives");
        }
    } else {
        warn!(path = %downloads_root.display(), "downloads folder missing");
    }

    let data_root = layout.data_root();
    if data_root.is_dir() {
        for dir in subdirectories(&data_root)? {
            let name = dir_name(&dir);
            let kind = lookup_by_name(&name)
                .map(|descriptor| descriptor.kind.as_str())
                .unwrap_or("unknown");
            info!(dataset = %name, kind, "pending processing");
        }
        for tif in list_files_with_extension(&data_root, "tif")? {
            info!(path = %tif.display(), "processed raster");
        }
    } else {
        warn!(path = %data_root.display(), "data folder missing");
    }

    match latest_manifest(&layout.manifest_root())? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: FetchRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                mode = %manifest.mode,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                downloads = manifest.downloads.len(),
                failed_links = manifest.failed_links.len(),
                processed = manifest.processed.len(),
                failure_reason = %manifest.failure_reason.unwrap_or_default(),
                "last run"
            );
        }
        None => warn!(path = %layout.manifest_root().display(), "no run manifest found"),
    }

    Ok(())
}

pub fn latest_manifest(manifest_root: &Path) -> Result<Option<PathBuf>> {
    if !manifest_root.is_dir() {
        return Ok(None);
    }

    let pattern = Regex::new(&format!(
        r"^{}(\d{{8}}T\d{{6}})(\.\d{{3}})?Z(?:-\d+)?\.json$",
        regex::escape(MANIFEST_PREFIX)
    ))
    .context("failed to compile manifest filename regex")?;

    let mut newest: Option<(String, PathBuf)> = None;
    for path in list_files_with_extension(manifest_root, "json")? {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(captures) = pattern.captures(file_name) else {
            continue;
        };
        // Second-resolution names sort as .000 within their second.
        let stamp = format!(
            "{}{}",
            &captures[1],
            captures.get(2).map_or(".000", |m| m.as_str())
        );

        if newest.as_ref().is_none_or(|(best, _)| stamp > *best) {
            newest = Some((stamp, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries = fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?
            .is_dir()
        {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
