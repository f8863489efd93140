use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use super::{Processor, path_arg};
use crate::catalog::{DatasetDescriptor, VectorSpec};
use crate::util::list_files_with_extension;

/// Characters of grid-square prefix (e.g. `TQ_`) dropped from shapefile names.
const GRID_PREFIX_LEN: usize = 3;
const SHAPEFILE_SUFFIX: &str = ".shp";

pub fn derive_table_name(file_name: &str, table_prefix: &str) -> Option<String> {
    let stem_end = file_name.len().checked_sub(SHAPEFILE_SUFFIX.len())?;
    let suffix = file_name.get(stem_end..)?;
    if !suffix.eq_ignore_ascii_case(SHAPEFILE_SUFFIX) {
        return None;
    }

    let stem = file_name.get(GRID_PREFIX_LEN..stem_end)?;
    if stem.is_empty() {
        return None;
    }

    Some(format!("{}{}", table_prefix, stem.to_lowercase()))
}

pub fn process_vector(
    folder: &Path,
    descriptor: &DatasetDescriptor,
    spec: &VectorSpec,
    processor: &Processor<'_>,
) -> Result<Vec<String>> {
    let schema = &processor.target.schema;
    info!(dataset = descriptor.name, schema = %schema, "preparing for PostGIS import");

    for table in spec.tables {
        processor
            .sql
            .execute(&format!("DROP TABLE IF EXISTS \"{schema}\".\"{table}\""), &[])?;
    }
    processor
        .sql
        .execute(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"), &[])?;

    let connection = processor.target.ogr_connection_string();
    let mut initialised_tables: Vec<String> = Vec::new();

    for path in list_files_with_extension(folder, "shp")? {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            warn!(path = %path.display(), "skipping shapefile with non UTF-8 name");
            continue;
        };
        let Some(table) = derive_table_name(file_name, spec.table_prefix) else {
            warn!(file = file_name, "shapefile name too short to derive a table, skipping");
            continue;
        };

        let append = initialised_tables.contains(&table);
        if !append {
            initialised_tables.push(table.clone());
        }

        info!(file = file_name, table = %table, append, "importing");
        let args = loader_args(append, &connection, schema, &table, &path);
        processor.runner.run(&processor.tools.ogr2ogr, &args)?;
    }

    for table in &initialised_tables {
        info!(table = %table, "creating spatial index");
        processor.sql.execute(
            &format!(
                "CREATE INDEX {table}_wkb_geometry_geom_idx ON {schema}.{table} USING gist (wkb_geometry)"
            ),
            &[],
        )?;
    }

    Ok(initialised_tables)
}

fn loader_args(
    append: bool,
    connection: &str,
    schema: &str,
    table: &str,
    shapefile: &Path,
) -> Vec<String> {
    let mut args = Vec::new();
    if append {
        args.push("-append".to_string());
    }
    args.extend(
        [
            "--config",
            "PG_USE_COPY",
            "YES",
            "-f",
            "PostgreSQL",
            connection,
            "-lco",
            "SPATIAL_INDEX=FALSE",
            // keep column case so the OS styling still matches
            "-lco",
            "LAUNDER=no",
            "-nln",
        ]
        .map(String::from),
    );
    args.push(format!("{schema}.{table}"));
    args.push(path_arg(shapefile));
    args
}
