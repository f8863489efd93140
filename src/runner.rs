use std::io;
use std::process::Command;

use anyhow::{Result, bail};
use thiserror::Error;
use tracing::debug;

use crate::model::ToolVersions;

#[derive(Debug, Error)]
pub enum CommandFailed {
    #[error("failed to run command {program} {args:?}: {source}")]
    Spawn {
        program: String,
        args: Vec<String>,
        #[source]
        source: io::Error,
    },

    #[error(
        "failed to run command {program} {args:?}\n\nreturn code was {}\n\nstdout was {stdout}\n\nstderr was {stderr}",
        format_code(.code)
    )]
    NonZeroExit {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl CommandFailed {
    pub fn args(&self) -> &[String] {
        match self {
            Self::Spawn { args, .. } | Self::NonZeroExit { args, .. } => args,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::NonZeroExit { code, .. } => *code,
        }
    }
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandFailed>;
}

#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandFailed> {
        debug!(program, args = ?args, "running command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CommandFailed::Spawn {
                program: program.to_string(),
                args: args.to_vec(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(CommandFailed::NonZeroExit {
                program: program.to_string(),
                args: args.to_vec(),
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[derive(Debug, Clone)]
pub struct ToolSet {
    pub convert: Vec<String>,
    pub buildvrt: String,
    pub warp: String,
    pub addo: String,
    pub ogr2ogr: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        let convert = if cfg!(windows) {
            vec!["magick".to_string(), "convert".to_string()]
        } else {
            vec!["convert".to_string()]
        };

        Self {
            convert,
            buildvrt: "gdalbuildvrt".to_string(),
            warp: "gdalwarp".to_string(),
            addo: "gdaladdo".to_string(),
            ogr2ogr: "ogr2ogr".to_string(),
        }
    }
}

impl ToolSet {
    pub fn convert_command(&self, args: &[String]) -> (String, Vec<String>) {
        let (program, prefix) = self
            .convert
            .split_first()
            .map(|(program, prefix)| (program.clone(), prefix.to_vec()))
            .unwrap_or_else(|| ("convert".to_string(), Vec::new()));

        let mut full = prefix;
        full.extend(args.iter().cloned());
        (program, full)
    }
}

pub fn probe_tools(runner: &dyn CommandRunner, tools: &ToolSet) -> Result<ToolVersions> {
    let magick_program = tools
        .convert
        .first()
        .cloned()
        .unwrap_or_else(|| "convert".to_string());

    Ok(ToolVersions {
        imagemagick: probe(
            runner,
            &magick_program,
            &["-version"],
            "Install ImageMagick (https://imagemagick.org/script/download.php) and ensure it is on the PATH",
        )?,
        gdalbuildvrt: probe(runner, &tools.buildvrt, &["--version"], GDAL_GUIDANCE)?,
        gdalwarp: probe(runner, &tools.warp, &["--version"], GDAL_GUIDANCE)?,
        gdaladdo: probe(runner, &tools.addo, &["--version"], GDAL_GUIDANCE)?,
        ogr2ogr: probe(runner, &tools.ogr2ogr, &["--version"], GDAL_GUIDANCE)?,
    })
}

const GDAL_GUIDANCE: &str =
    "Install GDAL/OGR command line utilities (https://gdal.org/download.html) and ensure they are on the PATH";

fn probe(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    guidance: &str,
) -> Result<String> {
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();

    let (stdout, stderr) = match runner.run(program, &args) {
        Ok(output) => (output.stdout, output.stderr),
        Err(CommandFailed::NonZeroExit { stdout, stderr, .. }) => (stdout, stderr),
        Err(CommandFailed::Spawn { source, .. }) => {
            bail!("could not find {program} on the system PATH ({source}). {guidance}")
        }
    };

    let source = if stdout.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    };

    let version_line = source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}
