use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{CATALOG, DatasetKind};
use crate::cli::CatalogArgs;

pub fn run(args: CatalogArgs) -> Result<()> {
    if args.json {
        let json =
            serde_json::to_string_pretty(CATALOG).context("failed to serialize dataset catalog")?;
        println!("{json}");
        return Ok(());
    }

    for descriptor in CATALOG {
        match &descriptor.kind {
            DatasetKind::Raster(spec) => info!(
                name = descriptor.name,
                kind = descriptor.kind.as_str(),
                url_prefix = descriptor.url_prefix,
                payload_dir = descriptor.payload_dir,
                options = ?descriptor.options,
                georef_path = spec.georef_path,
                sidecar_ext = spec.sidecar_ext,
                "dataset"
            ),
            DatasetKind::Vector(spec) => info!(
                name = descriptor.name,
                kind = descriptor.kind.as_str(),
                url_prefix = descriptor.url_prefix,
                payload_dir = descriptor.payload_dir,
                options = ?descriptor.options,
                table_prefix = spec.table_prefix,
                tables = spec.tables.len(),
                "dataset"
            ),
        }
    }

    info!(dataset_count = CATALOG.len(), "catalog listed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_serializes_with_kind_tags() {
        let value = serde_json::to_value(CATALOG).expect("serialize");
        let entries = value.as_array().expect("array");
        assert_eq!(entries.len(), CATALOG.len());
        assert_eq!(entries[0]["kind"]["type"], "raster");
        assert_eq!(entries[0]["options"][0], "paletted");
        assert_eq!(entries[2]["kind"]["type"], "vector");
        assert_eq!(entries[2]["kind"]["table_prefix"], "oml_");
    }
}
