use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// uepkg - Unreal-style game package inspection
#[derive(Debug, Parser)]
#[command(name = "uepkg", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Display the package summary: versions, flags, table sizes and decoding stage.
    Info {
        /// Path to the package file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// List the name, import and export tables.
    Tables {
        /// Path to the package file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Show only one table: names, imports, or exports.
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Decode and print the tagged properties of exports.
    Props {
        /// Path to the package file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Only show the export with this name.
        #[arg(long, value_name = "NAME")]
        export: Option<String>,

        /// Also decode bulk data records.
        #[arg(long)]
        bulk: bool,

        /// Stop property lists at the first terminator and ignore declared sizes.
        #[arg(long)]
        strict: bool,
    },

    /// List the packages below a content directory.
    Discover {
        /// The content directory, mounted as the game root.
        #[arg(value_name = "DIR")]
        root: PathBuf,

        /// Only list the packages of this mod.
        #[arg(long = "mod", value_name = "ID")]
        mod_id: Option<String>,
    },
}
