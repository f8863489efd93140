use anyhow::Result;
use tracing::info;

use super::{Processor, process_extracted};
use crate::cli::ProcessArgs;
use crate::commands::database_target;
use crate::commands::manifest::RunRecorder;
use crate::commands::prompt::resolve_password;
use crate::db::PgSqlRunner;
use crate::layout::DestinationLayout;
use crate::runner::{SystemCommandRunner, ToolSet, probe_tools};

pub fn run(args: ProcessArgs) -> Result<()> {
    let tools = ToolSet::default();
    let runner = SystemCommandRunner;
    let tool_versions = probe_tools(&runner, &tools)?;

    let password = resolve_password(&args.database.user)?;
    let target = database_target(&args.database, password);

    let layout = DestinationLayout::new(&args.dst_folder);
    layout.prepare()?;

    let sql = PgSqlRunner::new(target.clone());

    let mut recorder = RunRecorder::start(
        &layout,
        "process",
        render_process_command(&args),
        false,
        &target.schema,
    );
    recorder.manifest.tool_versions = Some(tool_versions);
    info!(
        run_id = %recorder.manifest.run_id,
        manifest = %recorder.path().display(),
        "starting process run"
    );

    info!(dst_folder = %layout.root().display(), "processing placed datasets");

    let outcome = (|| -> Result<()> {
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

fn render_process_command(args: &ProcessArgs) -> String {
    [
        "os-data-fetcher".to_string(),
        "process".to_string(),
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
    ]
    .join(" ")
}
