use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{Processor, path_arg, sibling_path};
use crate::catalog::{DatasetDescriptor, MiscOption};
use crate::util::list_files_with_extension;

pub const OVERVIEW_FACTORS: [u32; 7] = [2, 4, 8, 16, 32, 64, 128];

/// British National Grid. The warp keeps source and target identical.
const DATASET_SRS: &str = "EPSG:27700";

const WARP_CREATION_OPTIONS: &[&str] = &[
    "TILED=YES",
    "COMPRESS=JPEG",
    "JPEG_QUALITY=100",
    "BIGTIFF=YES",
    "PHOTOMETRIC=YCBCR",
    "INTERLEAVE=PIXEL",
];

const OVERVIEW_CONFIG: &[(&str, &str)] = &[
    ("COMPRESS_OVERVIEW", "JPEG"),
    ("JPEG_QUALITY_OVERVIEW", "100"),
    ("PHOTOMETRIC_OVERVIEW", "YCBCR"),
    ("INTERLEAVE_OVERVIEW", "PIXEL"),
    ("BIGTIFF_OVERVIEW", "YES"),
];

pub fn process_raster(
    folder: &Path,
    descriptor: &DatasetDescriptor,
    processor: &Processor<'_>,
) -> Result<PathBuf> {
    info!(dataset = descriptor.name, folder = %folder.display(), "processing raster dataset");

    if descriptor.has_option(MiscOption::Paletted) {
        convert_paletted_files_to_rgb(folder, processor)?;
    }

    let file_list_path = sibling_path(folder, "txt");
    let vrt_path = sibling_path(folder, "vrt");
    let tif_path = sibling_path(folder, "tif");

    info!(path = %vrt_path.display(), "creating VRT");
    write_file_list(folder, &file_list_path)?;
    processor.runner.run(
        &processor.tools.buildvrt,
        &[
            "-input_file_list".to_string(),
            path_arg(&file_list_path),
            path_arg(&vrt_path),
        ],
    )?;

    info!(path = %tif_path.display(), "creating TIF");
    processor
        .runner
        .run(&processor.tools.warp, &warp_args(&vrt_path, &tif_path))?;

    info!(path = %tif_path.display(), "creating overviews");
    processor
        .runner
        .run(&processor.tools.addo, &overview_args(&tif_path))?;

    fs::remove_dir_all(folder)
        .with_context(|| format!("failed to remove {}", folder.display()))?;
    fs::remove_file(&vrt_path)
        .with_context(|| format!("failed to remove {}", vrt_path.display()))?;
    fs::remove_file(&file_list_path)
        .with_context(|| format!("failed to remove {}", file_list_path.display()))?;

    Ok(tif_path)
}

fn convert_paletted_files_to_rgb(folder: &Path, processor: &Processor<'_>) -> Result<()> {
    for path in list_files_with_extension(folder, "tif")? {
        debug!(path = %path.display(), "converting to RGB");
        let file = path_arg(&path);
        let (program, args) = processor.tools.convert_command(&[
            file.clone(),
            "-type".to_string(),
            "TrueColor".to_string(),
            file,
        ]);
        processor.runner.run(&program, &args)?;
    }
    Ok(())
}

fn write_file_list(folder: &Path, list_path: &Path) -> Result<()> {
    let file = File::create(list_path)
        .with_context(|| format!("failed to create {}", list_path.display()))?;
    let mut writer = BufWriter::new(file);

    for path in list_files_with_extension(folder, "tif")? {
        writeln!(writer, "{}", path.display())
            .with_context(|| format!("failed to write {}", list_path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", list_path.display()))
}

fn warp_args(vrt_path: &Path, tif_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-overwrite".to_string(),
        "-s_srs".to_string(),
        DATASET_SRS.to_string(),
        "-t_srs".to_string(),
        DATASET_SRS.to_string(),
    ];
    for option in WARP_CREATION_OPTIONS {
        args.push("-co".to_string());
        args.push(option.to_string());
    }
    args.push(path_arg(vrt_path));
    args.push(path_arg(tif_path));
    args
}

fn overview_args(tif_path: &Path) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in OVERVIEW_CONFIG {
        args.push("--config".to_string());
        args.push(key.to_string());
        args.push(value.to_string());
    }
    args.extend(["-ro", "-r", "average"].map(String::from));
    args.push(path_arg(tif_path));
    args.extend(OVERVIEW_FACTORS.iter().map(u32::to_string));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lookup_by_name;
    use crate::db::testing::{RecordingSql, sample_target};
    use crate::runner::ToolSet;
    use crate::runner::testing::RecordingRunner;

    fn raster_folder(root: &Path) -> PathBuf {
        let folder = root.join("1 in 250 000 Scale Colour Raster");
        fs::create_dir_all(&folder).expect("mkdir");
        fs::write(folder.join("SU.tif"), b"").expect("write");
        fs::write(folder.join("NT.TIF"), b"").expect("write");
        fs::write(folder.join("SU.TFW"), b"").expect("write");
        folder
    }

    #[test]
    fn raster_pipeline_runs_tools_in_order_and_cleans_up() {
        let temp = tempfile::tempdir().expect("tempdir");
        let folder = raster_folder(temp.path());
        let descriptor = lookup_by_name("1 in 250 000 Scale Colour Raster").unwrap();

        let tools = ToolSet {
            convert: vec!["convert".to_string()],
            ..ToolSet::default()
        };
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

        let output = process_raster(&folder, descriptor, &processor).expect("raster pipeline");

        let programs: Vec<String> = runner.calls.borrow().iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            programs,
            vec!["convert", "convert", "gdalbuildvrt", "gdalwarp", "gdaladdo"]
        );

        let converts = runner.calls_to("convert");
        let nt = path_arg(&folder.join("NT.TIF"));
        assert_eq!(converts[0], vec![nt.clone(), "-type".into(), "TrueColor".into(), nt]);

        let warp = &runner.calls_to("gdalwarp")[0];
        assert_eq!(&warp[..5], ["-overwrite", "-s_srs", "EPSG:27700", "-t_srs", "EPSG:27700"]);
        assert_eq!(warp.last().unwrap(), &path_arg(&output));

        assert_eq!(output, temp.path().join("1 in 250 000 Scale Colour Raster.tif"));
        assert!(output.is_file());
        assert!(!folder.exists());
        assert!(!sibling_path(&folder, "vrt").exists());
        assert!(!sibling_path(&folder, "txt").exists());
        assert!(sql.statements.borrow().is_empty());
    }

    #[test]
    fn overview_factors_are_fixed() {
        let args = overview_args(Path::new("/data/out.tif"));
        let tail: Vec<&str> = args[args.len() - 7..].iter().map(String::as_str).collect();
        assert_eq!(tail, ["2", "4", "8", "16", "32", "64", "128"]);
        assert_eq!(args[args.len() - 8], "/data/out.tif");
        assert!(args.windows(2).any(|w| w == ["-r", "average"]));
        assert!(args.iter().any(|a| a == "-ro"));
    }

    #[test]
    fn file_list_names_only_tif_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let folder = raster_folder(temp.path());
        let list = temp.path().join("list.txt");

        write_file_list(&folder, &list).expect("file list");

        let content = fs::read_to_string(&list).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.to_lowercase().ends_with(".tif")));
    }

    #[test]
    fn failing_warp_aborts_and_leaves_intermediates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let folder = raster_folder(temp.path());
        let descriptor = lookup_by_name("OS VectorMap District").unwrap();

        let tools = ToolSet::default();
        let target = sample_target();
        let mut runner = RecordingRunner {
            touch_outputs: true,
            ..RecordingRunner::default()
        };
        runner.fail_on.insert("gdalwarp".to_string());
        let sql = RecordingSql::default();
        let processor = Processor {
            tools: &tools,
            target: &target,
            runner: &runner,
            sql: &sql,
        };

        let err = process_raster(&folder, descriptor, &processor).expect_err("warp fails");
        let failed = err
            .downcast_ref::<crate::runner::CommandFailed>()
            .expect("command failure");
        assert_eq!(failed.exit_code(), Some(1));
        assert!(runner.calls_to("gdaladdo").is_empty());
        assert!(folder.is_dir());
        assert!(sibling_path(&folder, "vrt").exists());
    }
}
