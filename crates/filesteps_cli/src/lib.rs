//! Command-line host for the `filesteps_io_fs` operations.
//!
//! Binds flags onto requests, installs logging and maps outcomes onto exit
//! codes. All decisions stay in the core crate.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use filesteps_io_fs::{
    EnumMoveStrategy, EnumSymlinkStrategy, FsOpError, ReportFsOp, SpecDeleteRequest,
    SpecFsRequest, SpecTransferOptions, SpecTransferRequest, TracingReporter,
};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

////////////////////////////////////////////////////////////////////////////////
// #region Cli

/// Validated copy / move / delete steps.
#[derive(Debug, Parser)]
#[command(name = "filesteps", version, about)]
pub struct Cli {
    /// Log level or filter directive; `RUST_LOG` wins when set.
    #[arg(long, global = true, env = "FILESTEPS_LOG", default_value = "info")]
    pub log_level: String,
    /// Log output format: pretty, json or compact.
    #[arg(long, global = true, default_value = "pretty", value_parser = parse_log_format)]
    pub log_format: EnumLogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy a file, or a directory's contents, into a directory.
    Copy(TransferArgs),
    /// Move a file, or a directory's contents, into a directory.
    Move(MoveArgs),
    /// Delete a file or a directory tree.
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    /// Source file or directory.
    #[arg(long)]
    pub file: PathBuf,
    /// Destination directory, created when missing.
    #[arg(long)]
    pub into: PathBuf,
    /// Symlink handling: dereference or copy_symlinks.
    #[arg(long, default_value = "dereference", value_parser = parse_rule_symlink)]
    pub symlinks: EnumSymlinkStrategy,
    /// Do not carry timestamps, permissions and xattrs over.
    #[arg(long)]
    pub no_preserve_metadata: bool,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[command(flatten)]
    pub transfer: TransferArgs,
    /// Move strategy: rename_when_possible or copy_then_delete.
    #[arg(long, default_value = "rename_when_possible", value_parser = parse_rule_move)]
    pub strategy: EnumMoveStrategy,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// File or directory to remove.
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLogFormat {
    Pretty,
    Json,
    Compact,
}

pub fn parse_log_format(value: &str) -> Result<EnumLogFormat, String> {
    match value {
        "pretty" => Ok(EnumLogFormat::Pretty),
        "json" => Ok(EnumLogFormat::Json),
        "compact" => Ok(EnumLogFormat::Compact),
        _ => Err(format!(
            "Invalid log format: `{value}`. Expected one of: ['pretty', 'json', 'compact']"
        )),
    }
}

pub fn parse_rule_symlink(value: &str) -> Result<EnumSymlinkStrategy, String> {
    match value {
        "dereference" => Ok(EnumSymlinkStrategy::Dereference),
        "copy_symlinks" => Ok(EnumSymlinkStrategy::CopySymlinks),
        _ => Err(format!(
            "Invalid symlink strategy: `{value}`. Expected one of: ['dereference', 'copy_symlinks']"
        )),
    }
}

pub fn parse_rule_move(value: &str) -> Result<EnumMoveStrategy, String> {
    match value {
        "rename_when_possible" => Ok(EnumMoveStrategy::RenameWhenPossible),
        "copy_then_delete" => Ok(EnumMoveStrategy::CopyThenDelete),
        _ => Err(format!(
            "Invalid move strategy: `{value}`. Expected one of: ['rename_when_possible', 'copy_then_delete']"
        )),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failure surfaced by the adapter.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{source}")]
    Operation {
        #[source]
        source: FsOpError,
    },
    #[error("invalid request: {field}: {reason}")]
    InvalidRequest {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to install tracing subscriber: {message}")]
    Logging { message: String },
}

impl CliError {
    /// `1` for failed operations, `2` for anything that never got to run.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Operation { .. } => 1,
            Self::InvalidRequest { .. } | Self::Logging { .. } => 2,
        }
    }
}

impl From<FsOpError> for CliError {
    fn from(source: FsOpError) -> Self {
        match source {
            FsOpError::InvalidRequest { field, reason } => Self::InvalidRequest { field, reason },
            other => Self::Operation { source: other },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Run

/// Install a global `fmt` subscriber.
///
/// # Errors
///
/// [`CliError::Logging`] when a global subscriber is already set.
pub fn init_logging(level: &str, format: EnumLogFormat) -> Result<(), CliError> {
    let registry = tracing_subscriber::registry().with(build_env_filter(level));
    let res_init = match format {
        EnumLogFormat::Json => registry
            .with(fmt::layer().json().with_target(false))
            .try_init(),
        EnumLogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        EnumLogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    res_init.map_err(|err| CliError::Logging {
        message: err.to_string(),
    })
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Turn parsed arguments into a core request.
///
/// # Errors
///
/// [`CliError::InvalidRequest`] for empty paths.
pub fn build_request(command: &Command) -> Result<SpecFsRequest, CliError> {
    let spec_request = match command {
        Command::Copy(args) => SpecFsRequest::Copy(build_transfer(args, None)?),
        Command::Move(args) => {
            SpecFsRequest::Move(build_transfer(&args.transfer, Some(args.strategy))?)
        }
        Command::Delete(args) => SpecFsRequest::Delete(SpecDeleteRequest::new(&args.file)?),
    };
    Ok(spec_request)
}

fn build_transfer(
    args: &TransferArgs,
    rule_move: Option<EnumMoveStrategy>,
) -> Result<SpecTransferRequest, CliError> {
    let spec_default = SpecTransferOptions::default();
    let spec_options = SpecTransferOptions {
        rule_symlink: args.symlinks,
        rule_move: rule_move.unwrap_or(spec_default.rule_move),
        if_preserve_metadata: !args.no_preserve_metadata,
    };
    Ok(SpecTransferRequest::new(&args.file, &args.into)?.with_options(spec_options))
}

/// Execute one parsed command; logging must already be installed.
///
/// # Errors
///
/// See [`CliError`].
pub fn dispatch(cli: &Cli) -> Result<ReportFsOp, CliError> {
    let spec_request = build_request(&cli.command)?;
    let report = spec_request.execute(&TracingReporter)?;
    Ok(report)
}

/// Parse arguments, install logging, execute. Returns the process exit code.
pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };
    if let Err(err) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("error: {err}");
        return err.exit_code();
    }
    run_with(&cli)
}

/// Execute `cli` and map the outcome onto an exit code.
pub fn run_with(cli: &Cli) -> i32 {
    match dispatch(cli) {
        Ok(report) => {
            tracing::debug!(summary = %report, "done");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rules_accept_known_values() {
        assert_eq!(
            parse_rule_symlink("copy_symlinks"),
            Ok(EnumSymlinkStrategy::CopySymlinks)
        );
        assert_eq!(
            parse_rule_move("copy_then_delete"),
            Ok(EnumMoveStrategy::CopyThenDelete)
        );
        assert_eq!(parse_log_format("json"), Ok(EnumLogFormat::Json));
    }

    #[test]
    fn parse_rules_reject_unknown_values() {
        let err = parse_rule_symlink("skip_symlinks").expect_err("unknown");
        assert!(err.contains("Invalid symlink strategy: `skip_symlinks`"));
        assert!(parse_rule_move("rename").is_err());
        assert!(parse_log_format("xml").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["filesteps", "copy", "--file", "a", "--into", "b"])
            .expect("parse");
        assert_eq!(cli.log_format, EnumLogFormat::Pretty);
        let Command::Copy(args) = &cli.command else {
            panic!("expected copy");
        };
        assert_eq!(args.symlinks, EnumSymlinkStrategy::Dereference);
        assert!(!args.no_preserve_metadata);
    }

    #[test]
    fn cli_move_options() {
        let cli = Cli::try_parse_from([
            "filesteps",
            "--log-format",
            "json",
            "move",
            "--file",
            "a",
            "--into",
            "b",
            "--strategy",
            "copy_then_delete",
            "--symlinks",
            "copy_symlinks",
            "--no-preserve-metadata",
        ])
        .expect("parse");

        let SpecFsRequest::Move(request) = build_request(&cli.command).expect("request") else {
            panic!("expected move");
        };
        let spec_options = request.options();
        assert_eq!(spec_options.rule_move, EnumMoveStrategy::CopyThenDelete);
        assert_eq!(spec_options.rule_symlink, EnumSymlinkStrategy::CopySymlinks);
        assert!(!spec_options.if_preserve_metadata);
    }

    #[test]
    fn cli_rejects_bad_invocations() {
        assert!(Cli::try_parse_from(["filesteps", "delete"]).is_err());
        assert!(
            Cli::try_parse_from(["filesteps", "copy", "--file", "a", "--into", "b", "--symlinks", "x"])
                .is_err()
        );
    }

    #[test]
    fn empty_path_is_invalid_invocation() {
        let cli = Cli::try_parse_from(["filesteps", "delete", "--file", ""]).expect("parse");
        let err = build_request(&cli.command).expect_err("empty");
        assert!(matches!(err, CliError::InvalidRequest { field: "file", .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn run_with_maps_outcomes_to_exit_codes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("a/file.txt");
        let path_into = tmp.path().join("b");
        std::fs::create_dir_all(path_file.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path_file, "x").expect("write");

        let arg_file = path_file.to_string_lossy().into_owned();
        let arg_into = path_into.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["filesteps", "copy", "--file", &arg_file, "--into", &arg_into])
            .expect("parse");
        assert_eq!(run_with(&cli), 0);
        assert!(path_into.join("file.txt").is_file());

        let arg_missing = tmp.path().join("missing").to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["filesteps", "delete", "--file", &arg_missing])
            .expect("parse");
        assert_eq!(run_with(&cli), 1);
    }
}
