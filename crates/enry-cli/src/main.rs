use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use enry_bridge::{Enry, LibraryLoader};
use enry_config::{Config, ConfigLoader};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[cfg(test)]
mod test_utils;

/// Detect programming languages with the enry shared library.
///
/// Every command calls into the native library, located through enry.toml,
/// ENRY_* environment variables, or --library.
///
/// EXAMPLES:
///     enry language src/main.rs        Most likely language of a file
///     enry guess setup.py --by shebang Detect from the #! line only
///     enry classify vendor/jquery.js   Vendor/generated/binary/... flags
///     enry info Go                     Color, type and extensions of Go
///     enry symbols                     Entry points the library exports
///
/// ENVIRONMENT VARIABLES:
///     ENRY_LIBRARY       Path to the shared library
///     ENRY_LIBRARY_NAME  Short library name to search for (default: enry)
///     ENRY_SEARCH_PATH   Extra directories to search, path-list syntax
///     ENRY_STRICT        Require every entry point to resolve (true/1/yes)
///     ENRY_LOG           Log level (error, warn, info, debug, trace)
///     ENRY_JSON          Set to '1' for JSON output by default
#[derive(Parser)]
#[command(name = "enry")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the enry shared library
    #[arg(long, global = true, env = "ENRY_LIBRARY")]
    library: Option<PathBuf>,

    /// Configuration file (default: enry.toml found from the current directory up)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, env = "ENRY_JSON")]
    json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the most likely language of a file
    ///
    /// Combines every strategy, using both the file name and its content.
    #[command(visible_alias = "l")]
    Language {
        /// File to inspect
        file: PathBuf,
    },

    /// Print every plausible language of a file
    Languages {
        /// File to inspect
        file: PathBuf,
    },

    /// Run a single detection strategy
    ///
    /// EXAMPLES:
    ///     enry guess foo.h                  By extension (the default)
    ///     enry guess Makefile --by filename By well-known file name
    ///     enry guess script --by shebang    By interpreter line
    #[command(visible_alias = "g")]
    Guess {
        /// File to inspect
        file: PathBuf,
        /// Strategy to use
        #[arg(long, value_enum, default_value_t = commands::language::Strategy::Extension)]
        by: commands::language::Strategy,
    },

    /// Print the classification flags of a file
    Classify {
        /// File to inspect
        file: PathBuf,
    },

    /// Print metadata about a language
    Info {
        /// Language name, as enry spells it (e.g. "Go", "C++")
        language: String,
        /// Also print the MIME type of this path for the language
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// List the entry points the bridge declares and whether they resolved
    Symbols,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    logging::init(cli.verbose, config.log_level());
    tracing::debug!(source = ?config.source, "configuration loaded");

    let enry = open_library(cli.library.as_ref(), &config)?;

    let json = cli.json;
    match cli.command {
        Commands::Language { file } => {
            output::emit(&commands::language::language(&enry, &file)?, json)?;
        }
        Commands::Languages { file } => {
            output::emit(&commands::language::languages(&enry, &file)?, json)?;
        }
        Commands::Guess { file, by } => {
            output::emit(&commands::language::guess(&enry, &file, by)?, json)?;
        }
        Commands::Classify { file } => {
            output::emit(&commands::classify::run(&enry, &file)?, json)?;
        }
        Commands::Info { language, path } => {
            let info = commands::info::run(&enry, &language, path.as_deref())?;
            output::emit(&info, json)?;
        }
        Commands::Symbols => output::emit(&commands::symbols::run(&enry), json)?,
    }

    Ok(())
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let loader = ConfigLoader::new();
    match explicit {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            loader
                .load_from_directory(&cwd)
                .context("Failed to load enry.toml")
        }
    }
}

/// `--library` wins over everything the configuration says about the library
fn open_library(explicit: Option<&PathBuf>, config: &Config) -> Result<Enry> {
    let enry = match explicit {
        Some(path) => {
            let library = LibraryLoader::open_path(path)?;
            Enry::with_library(library, config.strict())?
        }
        None => Enry::load(config)?,
    };

    if !enry.missing_symbols().is_empty() {
        tracing::info!(
            missing = enry.missing_symbols().len(),
            "library does not export every entry point"
        );
    }

    Ok(enry)
}
