use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::Processor;
use super::raster::process_raster;
use super::vector::process_vector;
use crate::catalog::{DatasetKind, lookup_by_name};
use crate::model::ProcessedDataset;

pub fn process_extracted(
    data_root: &Path,
    processor: &Processor<'_>,
    processed: &mut Vec<ProcessedDataset>,
) -> Result<()> {
    let mut folders = Vec::new();
    let entries = fs::read_dir(data_root)
        .with_context(|| format!("failed to read {}", data_root.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", data_root.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?
            .is_dir()
        {
            folders.push(entry.path());
        }
    }
    folders.sort();

    for folder in folders {
        let Some(name) = folder.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(descriptor) = lookup_by_name(name) else {
            debug!(folder = %folder.display(), "no dataset matches folder, skipping");
            continue;
        };

        let outputs = match &descriptor.kind {
            DatasetKind::Raster(_) => {
                let tif = process_raster(&folder, descriptor, processor)?;
                vec![tif.display().to_string()]
            }
            DatasetKind::Vector(spec) => process_vector(&folder, descriptor, spec, processor)?,
        };

        processed.push(ProcessedDataset {
            dataset: descriptor.name.to_string(),
            kind: descriptor.kind.as_str().to_string(),
            outputs,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{RecordingSql, sample_target};
    use crate::runner::ToolSet;
    use crate::runner::testing::RecordingRunner;

    #[test]
    fn router_dispatches_by_folder_name_and_skips_the_rest() {
        let temp = tempfile::tempdir().expect("tempdir");
        let data = temp.path();

        let raster = data.join("OS VectorMap District");
        fs::create_dir_all(&raster).expect("mkdir");
        fs::write(raster.join("NT00.tif"), b"").expect("write");

        let vector = data.join("OS Open Map - Local");
        fs::create_dir_all(&vector).expect("mkdir");
        fs::write(vector.join("TQ_Road.shp"), b"").expect("write");

        fs::create_dir_all(data.join("Somebody Else's Data")).expect("mkdir");
        fs::write(data.join("OS Open Map - Local.tif"), b"").expect("write");

        let tools = ToolSet::default();
        let target = sample_target();
        let runner = RecordingRunner {
            touch_outputs: true,
            ..RecordingRunner::default()
        };
        let sql = RecordingSql::default();
        let processor = Processor {
            tools: &tools,
            target: &target,
            runner: &runner,
            sql: &sql,
        };

        let mut processed = Vec::new();
        process_extracted(data, &processor, &mut processed).expect("route");

        let summary: Vec<(&str, &str)> = processed
            .iter()
            .map(|p| (p.dataset.as_str(), p.kind.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("OS Open Map - Local", "vector"), ("OS VectorMap District", "raster")]
        );
        assert_eq!(processed[0].outputs, vec!["oml_road"]);
        assert!(data.join("Somebody Else's Data").is_dir());
        assert!(!raster.exists());
        assert!(vector.join("TQ_Road.shp").is_file());
    }

    #[test]
    fn processed_raster_is_not_picked_up_again() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("OS VectorMap District.tif"), b"").expect("write");

        let tools = ToolSet::default();
        let target = sample_target();
        let runner = RecordingRunner::default();
        let sql = RecordingSql::default();
        let processor = Processor {
            tools: &tools,
            target: &target,
            runner: &runner,
            sql: &sql,
        };

        let mut processed = Vec::new();
        process_extracted(temp.path(), &processor, &mut processed).expect("route");
        assert!(processed.is_empty());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn completed_datasets_are_kept_when_a_later_one_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let data = temp.path();

        let raster = data.join("1 in 250 000 Scale Colour Raster");
        fs::create_dir_all(&raster).expect("mkdir");
        fs::write(raster.join("SU.tif"), b"").expect("write");

        let vector = data.join("OS Open Map - Local");
        fs::create_dir_all(&vector).expect("mkdir");
        fs::write(vector.join("TQ_Road.shp"), b"").expect("write");

        let tools = ToolSet::default();
        let target = sample_target();
        let mut runner = RecordingRunner {
            touch_outputs: true,
            ..RecordingRunner::default()
        };
        runner.fail_on.insert("ogr2ogr".to_string());
        let sql = RecordingSql::default();
        let processor = Processor {
            tools: &tools,
            target: &target,
            runner: &runner,
            sql: &sql,
        };

        let mut processed = Vec::new();
        let err = process_extracted(data, &processor, &mut processed).expect_err("load fails");
        assert!(err.downcast_ref::<crate::runner::CommandFailed>().is_some());

        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].dataset, "1 in 250 000 Scale Colour Raster");
        assert_eq!(processed[0].kind, "raster");
        assert!(!raster.exists());
        assert!(data.join("1 in 250 000 Scale Colour Raster.tif").is_file());
    }
}
