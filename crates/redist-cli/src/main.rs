//! redist - redistributable package updater CLI

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use redist_cli::cmd;
use redist_cli::ui::Output;
use redist_cli::{Cli, Commands};
use redist_core::Reporter;

fn main() -> ExitCode {
    // Diagnostics go to stderr so stdout stays parseable for `hash`/`info`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(cli.quiet);

    let result = match cli.command {
        Commands::Update(args) => cmd::update::update(&args, &output),
        Commands::Manifest { redist_dir, only } => {
            cmd::manifest::manifest(&redist_dir, &only, &output)
        }
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Info { game_root, app_id } => cmd::info::info(&game_root, &app_id),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            output.error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
