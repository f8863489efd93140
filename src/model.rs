use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub imagemagick: String,
    pub gdalbuildvrt: String,
    pub gdalwarp: String,
    pub gdaladdo: String,
    pub ogr2ogr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub dataset: String,
    pub url: String,
    pub archive_path: String,
    pub sha256: String,
    pub fetched: bool,
    pub files_placed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedLink {
    pub dataset: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDataset {
    pub dataset: String,
    pub kind: String,
    /// Raster: the GeoTIFF written. Vector: one entry per table created.
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPaths {
    pub dst_folder: String,
    pub downloads_dir: String,
    pub extract_dir: String,
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub mode: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub failure_reason: Option<String>,
    pub command: String,
    pub skip_download: bool,
    pub db_schema: String,
    pub tool_versions: Option<ToolVersions>,
    pub paths: RunPaths,
    pub downloads: Vec<DownloadRecord>,
    pub failed_links: Vec<FailedLink>,
    pub processed: Vec<ProcessedDataset>,
}
