use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::ensure_directory;

#[derive(Debug, Clone)]
pub struct DestinationLayout {
    root: PathBuf,
}

impl DestinationLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn prepare(&self) -> Result<()> {
        ensure_directory(&self.extract_root())?;
        ensure_directory(&self.data_root())?;
        ensure_directory(&self.manifest_root())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn downloads_root(&self) -> PathBuf {
        self.root.join("downloads")
    }

    pub fn extract_root(&self) -> PathBuf {
        self.root.join("extract")
    }

    pub fn data_root(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn manifest_root(&self) -> PathBuf {
        self.root.join("manifests")
    }

    pub fn download_dir(&self, dataset: &str) -> PathBuf {
        self.downloads_root().join(dataset)
    }

    pub fn extract_dir(&self, dataset: &str) -> PathBuf {
        self.extract_root().join(dataset)
    }

    pub fn data_dir(&self, dataset: &str) -> PathBuf {
        self.data_root().join(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = DestinationLayout::new(temp.path());

        layout.prepare().expect("first prepare");
        layout.prepare().expect("second prepare");

        assert!(layout.extract_root().is_dir());
        assert!(layout.data_root().is_dir());
        assert!(layout.manifest_root().is_dir());
        assert!(!layout.downloads_root().exists());
    }

    #[test]
    fn dataset_dirs_are_keyed_by_display_name() {
        let layout = DestinationLayout::new("/srv/os");
        assert_eq!(
            layout.extract_dir("OS Open Map - Local"),
            PathBuf::from("/srv/os/extract/OS Open Map - Local")
        );
        assert_eq!(
            layout.download_dir("OS VectorMap District"),
            PathBuf::from("/srv/os/downloads/OS VectorMap District")
        );
    }
}
