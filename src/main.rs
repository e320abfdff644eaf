use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use release_maker::cli::{run_release_workflow, ReleaseWorkflowArgs};
use release_maker::config::{self, Config};
use release_maker::domain::BumpLevel;
use release_maker::git::Git2Vcs;
use release_maker::{ui, ReleaseError};

/// Exit code for a `--root` that is not a directory
const EXIT_INVALID_ROOT: u8 = 3;

#[derive(clap::Parser)]
#[command(
    name = "release-maker",
    version,
    about = "Bump project versions across nested git repositories, then commit, tag and push"
)]
struct Args {
    #[arg(long, value_parser = BumpLevel::from_str, help = "Version component to bump: major, minor or patch")]
    bump_level: BumpLevel,

    #[arg(long, overrides_with = "no_dry_run", help = "Report what would change without writing")]
    dry_run: bool,

    #[arg(long, overrides_with = "dry_run", help = "Write the changes")]
    no_dry_run: bool,

    #[arg(long, overrides_with = "no_verbose", help = "Print the plan report")]
    verbose: bool,

    #[arg(long, overrides_with = "verbose", help = "Only print outcomes")]
    no_verbose: bool,

    #[arg(long, overrides_with = "no_git_tag", help = "Create and push a vX.Y.Z tag")]
    git_tag: bool,

    #[arg(long, overrides_with = "git_tag", help = "Do not create tags")]
    no_git_tag: bool,

    #[arg(long, overrides_with = "no_fetch_remote_tags", help = "Fetch remote tags before planning")]
    fetch_remote_tags: bool,

    #[arg(long, overrides_with = "fetch_remote_tags", help = "Do not fetch remote tags")]
    no_fetch_remote_tags: bool,

    #[arg(long, help = "Directory report paths are shown relative to [default: current directory]")]
    root: Option<PathBuf>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        required = true,
        help = "Directories to search for manifests, or manifest files to act on"
    )]
    sources: Vec<PathBuf>,
}

/// Resolve a `--flag` / `--no-flag` pair; clap keeps only the last one given
fn resolve_flag(on: bool, off: bool, default: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        default
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn workflow_args(args: &Args, config: &Config) -> Result<ReleaseWorkflowArgs> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let behavior = &config.behavior;

    Ok(ReleaseWorkflowArgs {
        sources: args.sources.clone(),
        level: args.bump_level,
        root,
        dry_run: resolve_flag(args.dry_run, args.no_dry_run, behavior.dry_run),
        create_tags: resolve_flag(args.git_tag, args.no_git_tag, behavior.create_tags),
        fetch_remote_tags: resolve_flag(
            args.fetch_remote_tags,
            args.no_fetch_remote_tags,
            behavior.fetch_remote_tags,
        ),
        verbose: resolve_flag(args.verbose, args.no_verbose, behavior.verbose),
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    // Debug logs need an explicit --verbose or RUST_LOG; [behavior] verbose only shapes the report.
    init_tracing(args.verbose);

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let workflow = match workflow_args(&args, &config) {
        Ok(workflow) => workflow,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    match run_release_workflow(&workflow, &config, &Git2Vcs) {
        Ok(result) if result.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e @ ReleaseError::InvalidRoot(_)) => {
            ui::display_error(&e.to_string());
            ExitCode::from(EXIT_INVALID_ROOT)
        }
        Err(e) => {
            ui::display_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
