mod raster;
mod router;
mod run;
mod vector;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::db::{DatabaseTarget, SqlRunner};
use crate::runner::{CommandRunner, ToolSet};

pub use router::process_extracted;
pub use run::run;

pub struct Processor<'a> {
    pub tools: &'a ToolSet,
    pub target: &'a DatabaseTarget,
    pub runner: &'a dyn CommandRunner,
    pub sql: &'a dyn SqlRunner,
}

fn sibling_path(folder: &Path, extension: &str) -> PathBuf {
    let mut raw: OsString = folder.as_os_str().to_owned();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_path_keeps_spaces_and_dots() {
        assert_eq!(
            sibling_path(Path::new("/srv/data/1 in 250 000 Scale Colour Raster"), "vrt"),
            PathBuf::from("/srv/data/1 in 250 000 Scale Colour Raster.vrt")
        );
        assert_eq!(
            sibling_path(Path::new("data/v1.2"), "txt"),
            PathBuf::from("data/v1.2.txt")
        );
    }
}
