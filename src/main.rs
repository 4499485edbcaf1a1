use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use git_stamp::config::{self, GitStampConfig};
use git_stamp::engine::{calculate_version, CalculateOptions};
use git_stamp::git::Git2Repository;
use git_stamp::observability;
use git_stamp::policy::BranchPolicyResolver;
use git_stamp::ui::{self, OutputKind};

#[derive(clap::Parser)]
#[command(
    name = "git-stamp",
    version,
    about = "Calculate a semantic version from git history and branch policy"
)]
struct Args {
    #[arg(short, long, default_value = ".", help = "Path inside the repository")]
    path: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Version this branch instead of HEAD")]
    branch: Option<String>,

    #[arg(
        short,
        long,
        default_value = "full-semver",
        help = "full-semver, semver, legacy, legacy-padded, assembly, informational or json"
    )]
    output: OutputKind,

    #[arg(short, long, help = "Template such as '{MajorMinorPatch}-{ShortSha}'")]
    format: Option<String>,

    #[arg(long, help = "Print the resolved configuration and exit")]
    show_config: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More logging (-v, -vv, -vvv)")]
    verbose: u8,

    #[arg(short, long, help = "Only print the version")]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    observability::init_logging(observability::env_filter(args.verbose, args.quiet));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let repo = Git2Repository::open(&args.path)
        .with_context(|| format!("No git repository at {}", args.path.display()))?;
    let config = config::load_config(args.config.as_deref(), repo.workdir())
        .context("Failed to load configuration")?;

    if args.show_config {
        return show_config(&config, args.quiet);
    }

    let result = calculate_version(&repo, &config, &CalculateOptions {
        branch: args.branch.clone(),
        ..CalculateOptions::default()
    })?;

    if !args.quiet {
        ui::display_summary(&result);
    }
    println!(
        "{}",
        ui::render_output(&result, args.output, args.format.as_deref())?
    );
    Ok(())
}

fn show_config(config: &GitStampConfig, quiet: bool) -> Result<()> {
    config.validate()?;
    if !quiet {
        let resolver = BranchPolicyResolver::new(config)?;
        ui::display_status("Branch types in match order:");
        eprintln!("{}", ui::format_branch_types(&resolver));
    }
    print!("{}", toml::to_string_pretty(&config.resolved())?);
    Ok(())
}
