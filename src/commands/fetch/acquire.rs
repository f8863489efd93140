use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::{DatasetDescriptor, LINK_SCHEME, lookup_by_url};
use crate::layout::DestinationLayout;
use crate::util::ensure_directory;

#[derive(Debug, Clone)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
    pub descriptor: &'static DatasetDescriptor,
}

#[derive(Debug, Clone)]
pub struct ExtractedArchive {
    pub descriptor: &'static DatasetDescriptor,
    pub url: String,
    pub archive_path: PathBuf,
    pub extract_dir: PathBuf,
    pub fetched: bool,
}

#[derive(Debug)]
pub enum AcquireOutcome {
    Extracted(ExtractedArchive),
    FetchFailed { url: String, reason: String },
}

pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::from_builder(client_builder())
    }

    fn from_builder(builder: reqwest::blocking::ClientBuilder) -> Result<Self> {
        let client = builder.build().context("failed to create HTTP client")?;
        Ok(Self { client })
    }
}

fn client_builder() -> reqwest::blocking::ClientBuilder {
    // No overall timeout: archives run to several gigabytes.
    reqwest::blocking::Client::builder()
        .user_agent(format!("os-data-fetcher/{}", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .timeout(None::<Duration>)
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to connect: {url}"))?;

        if !response.status().is_success() {
            bail!("HTTP {} for {}", response.status(), url);
        }

        let part_path = partial_path(dest);
        let written = write_body(&mut response, &part_path);
        if let Err(err) = written {
            let _ = fs::remove_file(&part_path);
            return Err(err);
        }

        fs::rename(&part_path, dest).with_context(|| {
            format!(
                "failed to rename {} -> {}",
                part_path.display(),
                dest.display()
            )
        })?;

        Ok(())
    }
}

fn write_body(response: &mut reqwest::blocking::Response, path: &Path) -> Result<u64> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let bytes = response
        .copy_to(&mut file)
        .with_context(|| format!("failed to read response body into {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(bytes)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut raw = dest.as_os_str().to_owned();
    raw.push(".part");
    PathBuf::from(raw)
}

pub fn find_download_links(text: &str) -> Vec<DownloadLink> {
    let mut links = Vec::new();

    for word in text.split_whitespace() {
        if !word.starts_with(LINK_SCHEME) {
            continue;
        }
        let Some(descriptor) = lookup_by_url(word) else {
            debug!(url = word, "ignoring link with no matching dataset");
            continue;
        };
        let Some(file_name) = archive_file_name(word) else {
            warn!(url = word, "link has no file name, skipping");
            continue;
        };

        info!(dataset = descriptor.name, "found link");
        links.push(DownloadLink {
            url: word.to_string(),
            file_name,
            descriptor,
        });
    }

    links
}

pub fn archive_file_name(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
}

pub fn acquire(
    link: &DownloadLink,
    layout: &DestinationLayout,
    skip_download: bool,
    fetcher: &dyn Fetcher,
) -> Result<AcquireOutcome> {
    let name = link.descriptor.name;
    let download_dir = layout.download_dir(name);
    ensure_directory(&download_dir)?;

    let archive_path = download_dir.join(&link.file_name);
    if archive_path.is_file() && !skip_download {
        fs::remove_file(&archive_path)
            .with_context(|| format!("failed to remove stale {}", archive_path.display()))?;
    }

    let mut fetched = false;
    if !archive_path.is_file() {
        info!(url = %link.url, "downloading");
        if let Err(err) = fetcher.fetch(&link.url, &archive_path) {
            warn!(
                url = %link.url,
                error = %err,
                "failed to download file - please ensure your links are fresh"
            );
            return Ok(AcquireOutcome::FetchFailed {
                url: link.url.clone(),
                reason: format!("{err:#}"),
            });
        }
        fetched = true;
    } else {
        info!(path = %archive_path.display(), "reusing downloaded archive");
    }

    let extract_dir = layout.extract_dir(name);
    ensure_directory(&extract_dir)?;
    extract_archive(&archive_path, &extract_dir)?;

    Ok(AcquireOutcome::Extracted(ExtractedArchive {
        descriptor: link.descriptor,
        url: link.url.clone(),
        archive_path,
        extract_dir,
        fetched,
    }))
}

pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    debug!(archive = %archive_path.display(), dest = %dest.display(), "extracting");

    let file = File::open(archive_path)
        .with_context(|| format!("failed to open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read zip archive {}", archive_path.display()))?;
    archive.extract(dest).with_context(|| {
        format!(
            "failed to extract {} into {}",
            archive_path.display(),
            dest.display()
        )
    })?;

    Ok(())
}
