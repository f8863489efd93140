use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::acquire::{AcquireOutcome, Fetcher, HttpFetcher, acquire, find_download_links};
use super::place::place_payload;
use crate::cli::FetchArgs;
use crate::commands::database_target;
use crate::commands::manifest::RunRecorder;
use crate::commands::process::{Processor, process_extracted};
use crate::commands::prompt::{read_email_from_terminal, resolve_password};
use crate::db::PgSqlRunner;
use crate::layout::DestinationLayout;
use crate::model::{DownloadRecord, FailedLink, FetchRunManifest};
use crate::runner::{SystemCommandRunner, ToolSet, probe_tools};
use crate::util::sha256_file;

pub struct FetchSession<'a> {
    pub layout: &'a DestinationLayout,
    pub georef_root: &'a Path,
    pub skip_download: bool,
    pub fetcher: &'a dyn Fetcher,
}

pub fn run(args: FetchArgs) -> Result<()> {
    let tools = ToolSet::default();
    let runner = SystemCommandRunner;
    let tool_versions = probe_tools(&runner, &tools)?;

    let password = resolve_password(&args.database.user)?;
    let target = database_target(&args.database, password);
    let email_text = match &args.email_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read email text from {}", path.display()))?,
        None => read_email_from_terminal()?,
    };
    debug!(content = %email_text, "email text received");

    let layout = DestinationLayout::new(&args.dst_folder);
    layout.prepare()?;

    let sql = PgSqlRunner::new(target.clone());
    let fetcher = HttpFetcher::new()?;

    let mut recorder = RunRecorder::start(
        &layout,
        "fetch",
        render_fetch_command(&args),
        args.skip_download,
        &target.schema,
    );
    recorder.manifest.tool_versions = Some(tool_versions);
    info!(
        run_id = %recorder.manifest.run_id,
        manifest = %recorder.path().display(),
        "starting fetch run"
    );

    let outcome = (|| -> Result<()> {
        let session = FetchSession {
            layout: &layout,
            georef_root: &args.georef_root,
            skip_download: args.skip_download,
            fetcher: &fetcher,
        };
        fetch_and_place(&email_text, &session, &mut recorder.manifest)?;

        let processor = Processor {
            tools: &tools,
            target: &target,
            runner: &runner,
            sql: &sql,
        };
        process_extracted(
            &layout.data_root(),
            &processor,
            &mut recorder.manifest.processed,
        )?;
        Ok(())
    })();

    recorder.finish(outcome)
}

pub fn fetch_and_place(
    email_text: &str,
    session: &FetchSession<'_>,
    manifest: &mut FetchRunManifest,
) -> Result<()> {
    let links = find_download_links(email_text);
    if links.is_empty() {
        warn!("no recognised download links in the email text");
    }

    for link in &links {
        let dataset = link.descriptor.name;
        match acquire(link, session.layout, session.skip_download, session.fetcher)? {
            AcquireOutcome::FetchFailed { url, reason } => {
                manifest.failed_links.push(FailedLink {
                    dataset: dataset.to_string(),
                    url,
                    reason,
                });
            }
            AcquireOutcome::Extracted(extracted) => {
                let data_dir = session.layout.data_dir(dataset);
                let placed = place_payload(
                    extracted.descriptor,
                    &extracted.extract_dir,
                    &data_dir,
                    session.georef_root,
                )?;
                info!(dataset, files = placed.len(), "placed dataset files");

                manifest.downloads.push(DownloadRecord {
                    dataset: dataset.to_string(),
                    url: extracted.url,
                    archive_path: extracted.archive_path.display().to_string(),
                    sha256: sha256_file(&extracted.archive_path)?,
                    fetched: extracted.fetched,
                    files_placed: placed.len(),
                });
            }
        }
    }

    Ok(())
}

fn render_fetch_command(args: &FetchArgs) -> String {
    let mut command = vec![
        "os-data-fetcher".to_string(),
        "fetch".to_string(),
        "--dst-folder".to_string(),
        args.dst_folder.display().to_string(),
        "--dbname".to_string(),
        args.database.dbname.clone(),
        "--host".to_string(),
        args.database.host.clone(),
        "--port".to_string(),
        args.database.port.to_string(),
        "--user".to_string(),
        args.database.user.clone(),
        "--schema".to_string(),
        args.database.schema.clone(),
        "--georef-root".to_string(),
        args.georef_root.display().to_string(),
    ];

    if args.skip_download {
        command.push("--skip-download".to_string());
    }
    if let Some(path) = &args.email_file {
        command.push("--email-file".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
