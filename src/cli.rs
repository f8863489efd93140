use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "os-data-fetcher",
    version,
    about = "Fetch Ordnance Survey open data and prepare it for use"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Fetch(FetchArgs),
    Process(ProcessArgs),
    Catalog(CatalogArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    #[arg(long)]
    pub dbname: String,

    #[arg(long)]
    pub host: String,

    #[arg(long)]
    pub port: u16,

    #[arg(long)]
    pub user: String,

    #[arg(long, default_value = "os")]
    pub schema: String,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[arg(long = "dst-folder", alias = "dst_folder")]
    pub dst_folder: PathBuf,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long, default_value_t = false)]
    pub skip_download: bool,

    #[arg(long, default_value = "georef")]
    pub georef_root: PathBuf,

    #[arg(long)]
    pub email_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    #[arg(long = "dst-folder", alias = "dst_folder")]
    pub dst_folder: PathBuf,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long = "dst-folder", alias = "dst_folder")]
    pub dst_folder: PathBuf,
}
