use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::layout::DestinationLayout;
use crate::model::{FetchRunManifest, RunPaths};
use crate::util::{now_utc_string, utc_compact_millis_string, write_json_pretty};

pub const MANIFEST_PREFIX: &str = "fetch_run_";

pub struct RunRecorder {
    path: PathBuf,
    pub manifest: FetchRunManifest,
}

impl RunRecorder {
    pub fn start(
        layout: &DestinationLayout,
        mode: &str,
        command: String,
        skip_download: bool,
        db_schema: &str,
    ) -> Self {
        let started_ts = Utc::now();
        let stamp = format!("{}-{}", utc_compact_millis_string(started_ts), std::process::id());
        let path = layout
            .manifest_root()
            .join(format!("{MANIFEST_PREFIX}{stamp}.json"));
        let started_at = now_utc_string();

        let manifest = FetchRunManifest {
            manifest_version: 1,
            run_id: format!("run-{stamp}"),
            mode: mode.to_string(),
            status: "running".to_string(),
            started_at: started_at.clone(),
            updated_at: started_at,
            failure_reason: None,
            command,
            skip_download,
            db_schema: db_schema.to_string(),
            tool_versions: None,
            paths: RunPaths {
                dst_folder: layout.root().display().to_string(),
                downloads_dir: layout.downloads_root().display().to_string(),
                extract_dir: layout.extract_root().display().to_string(),
                data_dir: layout.data_root().display().to_string(),
            },
            downloads: Vec::new(),
            failed_links: Vec::new(),
            processed: Vec::new(),
        };

        Self { path, manifest }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the manifest and hands back the run's own result. A run error
    /// takes precedence over a failure to write the manifest.
    pub fn finish(mut self, outcome: Result<()>) -> Result<()> {
        self.manifest.updated_at = now_utc_string();
        match &outcome {
            Ok(()) => self.manifest.status = "completed".to_string(),
            Err(err) => {
                self.manifest.status = "failed".to_string();
                self.manifest.failure_reason = Some(format!("{err:#}"));
            }
        }

        match write_json_pretty(&self.path, &self.manifest) {
            Ok(()) => info!(
                path = %self.path.display(),
                status = %self.manifest.status,
                "wrote run manifest"
            ),
            Err(write_err) if outcome.is_err() => error!(
                path = %self.path.display(),
                error = %format!("{write_err:#}"),
                "failed to write run manifest"
            ),
            Err(write_err) => return Err(write_err),
        }

        outcome
    }
}
