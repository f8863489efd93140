use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MiscOption {
    Paletted,
}

#[derive(Clone, Debug, Serialize)]
pub struct RasterSpec {
    pub georef_path: &'static str,
    pub sidecar_ext: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct VectorSpec {
    pub table_prefix: &'static str,
    pub tables: &'static [&'static str],
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatasetKind {
    Raster(RasterSpec),
    Vector(VectorSpec),
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raster(_) => "raster",
            Self::Vector(_) => "vector",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DatasetDescriptor {
    pub url_prefix: &'static str,
    pub name: &'static str,
    pub payload_dir: &'static str,
    pub options: &'static [MiscOption],
    pub kind: DatasetKind,
}

impl DatasetDescriptor {
    pub fn has_option(&self, option: MiscOption) -> bool {
        self.options.contains(&option)
    }
}

pub const LINK_SCHEME: &str = "http://";

pub static CATALOG: &[DatasetDescriptor] = &[
    DatasetDescriptor {
        url_prefix: "http://download.ordnancesurvey.co.uk/open/RAS250",
        name: "1 in 250 000 Scale Colour Raster",
        payload_dir: "data",
        options: &[MiscOption::Paletted],
        kind: DatasetKind::Raster(RasterSpec {
            georef_path: "250k-raster-tfw-georeferencing-files",
            sidecar_ext: "TFW",
        }),
    },
    DatasetDescriptor {
        url_prefix: "http://download.ordnancesurvey.co.uk/open/VMDRAS",
        name: "OS VectorMap District",
        payload_dir: "data",
        options: &[MiscOption::Paletted],
        kind: DatasetKind::Raster(RasterSpec {
            georef_path: "25k-raster-tfw-georeferencing-files/25krastertfw",
            sidecar_ext: "TFW",
        }),
    },
    DatasetDescriptor {
        url_prefix: "http://download.ordnancesurvey.co.uk/open/OPMPLC",
        name: "OS Open Map - Local",
        payload_dir: "data",
        options: &[],
        kind: DatasetKind::Vector(VectorSpec {
            table_prefix: "oml_",
            tables: &[
                "oml_building",
                "oml_electricitytransmissionline",
                "oml_foreshore",
                "oml_functionalsite",
                "oml_glasshouse",
                "oml_importantbuilding",
                "oml_motorwayjunction",
                "oml_namedplace",
                "oml_railwaystation",
                "oml_railwaytrack",
                "oml_railwaytunnel",
                "oml_road",
                "oml_roadtunnel",
                "oml_roundabout",
                "oml_surfacewater_area",
                "oml_surfacewater_line",
                "oml_tidalboundary",
                "oml_tidalwater",
                "oml_woodland",
            ],
        }),
    },
];

pub fn lookup_by_url(url: &str) -> Option<&'static DatasetDescriptor> {
    CATALOG
        .iter()
        .find(|descriptor| url.starts_with(descriptor.url_prefix))
}

pub fn lookup_by_name(name: &str) -> Option<&'static DatasetDescriptor> {
    CATALOG.iter().find(|descriptor| descriptor.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn url_prefixes_and_names_are_unique() {
        let prefixes: HashSet<_> = CATALOG.iter().map(|d| d.url_prefix).collect();
        let names: HashSet<_> = CATALOG.iter().map(|d| d.name).collect();
        assert_eq!(prefixes.len(), CATALOG.len());
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn every_entry_resolves_by_name_and_prefix() {
        for descriptor in CATALOG {
            let by_name = lookup_by_name(descriptor.name).expect("name lookup");
            assert_eq!(by_name.url_prefix, descriptor.url_prefix);

            let link = format!("{}/some_archive.zip?token=abc", descriptor.url_prefix);
            let by_url = lookup_by_url(&link).expect("prefix lookup");
            assert_eq!(by_url.name, descriptor.name);
        }
    }

    #[test]
    fn lookup_misses_return_none() {
        assert!(lookup_by_name("os open map - local").is_none());
        assert!(lookup_by_name("").is_none());
        assert!(lookup_by_url("http://download.ordnancesurvey.co.uk/open/UNKNOWN/x.zip").is_none());
        assert!(lookup_by_url("https://download.ordnancesurvey.co.uk/open/OPMPLC/x.zip").is_none());
    }

    #[test]
    fn open_map_local_link_matches_vector_descriptor() {
        let descriptor =
            lookup_by_url("http://download.ordnancesurvey.co.uk/open/OPMPLC/zip123.zip?X=1")
                .expect("descriptor");
        assert_eq!(descriptor.name, "OS Open Map - Local");
        match &descriptor.kind {
            DatasetKind::Vector(spec) => {
                assert_eq!(spec.table_prefix, "oml_");
                assert_eq!(spec.tables.len(), 19);
                assert!(spec.tables.iter().all(|t| t.starts_with(spec.table_prefix)));
            }
            DatasetKind::Raster(_) => panic!("expected vector descriptor"),
        }
    }

    #[test]
    fn raster_entries_are_paletted() {
        for descriptor in CATALOG {
            if let DatasetKind::Raster(spec) = &descriptor.kind {
                assert!(descriptor.has_option(MiscOption::Paletted));
                assert_eq!(spec.sidecar_ext, "TFW");
            }
        }
    }
}
