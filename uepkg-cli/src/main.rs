mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // Show uepkg info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("uepkg", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Info { path } => commands::info::run(path, &cli.global),
        Command::Tables { path, table } => {
            commands::tables::run(path, table.as_deref(), &cli.global)
        }
        Command::Props {
            path,
            export,
            bulk,
            strict,
        } => commands::props::run(
            path,
            &commands::props::PropsOptions {
                export: export.as_deref(),
                bulk: *bulk,
                strict: *strict,
            },
            &cli.global,
        ),
        Command::Discover { root, mod_id } => {
            commands::discover::run(root, mod_id.as_deref(), &cli.global)
        }
    }
}
