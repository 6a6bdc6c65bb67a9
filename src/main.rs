use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use beancount_importers::config::{identify, DEFAULT_CONFIG_FILE};
use beancount_importers::{Config, Importer};
use clap::{Parser, Subcommand};
use log::warn;

#[derive(Parser, Debug)]
#[command(
    name = "bean-import",
    version,
    about = "Turn PayPal, Schwab and Upwork CSV exports into Beancount entries"
)]
struct Cli {
    /// Importer configuration (default: ./bean-import.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print which importer accepts each file
    Identify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the Beancount entries extracted from each file
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the document archive path each file would be filed under
    File {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(Config::default());
            }
            default
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    Config::from_toml(&s).with_context(|| format!("parse {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let importers = config.importers();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Identify { files } => {
            for file in &files {
                let name = identify(&importers, file)
                    .with_context(|| format!("identifying {}", file.display()))?
                    .map_or("-", |importer| importer.name());
                writeln!(out, "{}: {}", file.display(), name)?;
            }
        }

        Command::Extract { files } => {
            for file in &files {
                let importer = match identify(&importers, file)
                    .with_context(|| format!("identifying {}", file.display()))?
                {
                    Some(importer) => importer,
                    None => {
                        warn!("{}: no importer recognises this file, skipping", file.display());
                        continue;
                    }
                };
                let entries = importer
                    .extract(file)
                    .with_context(|| format!("extracting {}", file.display()))?;
                writeln!(out, ";; -*- {}\n", file.display())?;
                beancount_render::render_directives(&mut out, &entries)
                    .with_context(|| format!("rendering {}", file.display()))?;
            }
        }

        Command::File { files } => {
            for file in &files {
                let importer = match identify(&importers, file)? {
                    Some(importer) => importer,
                    None => {
                        warn!("{}: no importer recognises this file, skipping", file.display());
                        continue;
                    }
                };
                writeln!(out, "{}", archive_path(importer, file)?.display())?;
            }
        }
    }

    Ok(())
}

/// `Assets:Upwork` + `statements_2020-01-01_2020-01-31.csv` →
/// `Assets/Upwork/2020-01-31.statements_2020-01-01_2020-01-31.csv`.
fn archive_path(importer: &impl Importer, file: &Path) -> Result<PathBuf> {
    let account = match importer.file_account(file) {
        Some(account) => account,
        None => bail!("{}: importer `{}` has no account for it", file.display(), importer.name()),
    };
    let date = match importer.file_date(file) {
        Some(date) => date,
        None => bail!("{}: importer `{}` found no date for it", file.display(), importer.name()),
    };
    let base = file
        .file_name()
        .with_context(|| format!("{} has no file name", file.display()))?
        .to_string_lossy();

    let mut path: PathBuf = account.to_string().split(':').collect();
    path.push(format!("{}.{}", date.format("%Y-%m-%d"), base));
    Ok(path)
}
