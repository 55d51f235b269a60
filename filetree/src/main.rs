use anyhow::{Context, Result}; // Use anyhow for easy error handling in the binary
use clap::Parser;
use filetree_lib::{list_records, FileRecord, FileTreeStream};
use log::{debug, error, info, LevelFilter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod config_loader;

use config_loader::build_run_settings;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Builds a compacted JSON tree of the files under a directory.",
    long_about = "Filetree walks a directory, inserts every entry into a tree keyed by path, skips the redundant single-child directories at the top, and writes the result as tree.json.\n\nSettings are read from the global config file, then .filetree.toml in the target directory, then --config, then the command line."
)]
struct Cli {
    /// Optional path to the directory to process.
    /// If not provided, the current working directory is used.
    #[arg(index = 1)]
    target_path: Option<PathBuf>,

    /// Write the tree artifact into this directory instead of stdout.
    #[arg(short = 'o', long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Add patterns to exclude files or directories. Can be used multiple times
    /// or with comma-separated values. Uses .gitignore glob syntax.
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    exclude_patterns: Vec<String>,

    /// Print every file as a JSON line with its compacted tree attached.
    #[arg(long)]
    emit_files: bool,

    /// Do not emit the tree artifact.
    #[arg(long, conflicts_with = "tree_name")]
    no_tree: bool,

    /// Name of the tree artifact (without the .json extension).
    #[arg(long, value_name = "NAME")]
    tree_name: Option<String>,

    /// Apply a built-in transform to the tree (basename, focus).
    #[arg(short = 't', long, value_name = "NAME")]
    transform: Option<String>,

    /// List regular files only; directories are synthesized without metadata.
    #[arg(long)]
    files_only: bool,

    /// Read settings from this file after the global and local config files.
    #[arg(long = "config", value_name = "FILE")]
    config_path: Option<PathBuf>,

    /// Ignore all config files.
    #[arg(long)]
    no_config: bool,

    /// Enable verbose output. Use -v for info, -vv for debug, -vvv for trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[cfg(test)]
impl Cli {
    fn test_default() -> Self {
        Self {
            target_path: None,
            output: None,
            exclude_patterns: Vec::new(),
            emit_files: false,
            no_tree: false,
            tree_name: None,
            transform: None,
            files_only: false,
            config_path: None,
            no_config: false,
            verbose: 0,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --- Initialize Logging ---
    let log_level = match cli.verbose {
        0 => LevelFilter::Warn,  // Default: Show warnings and errors
        1 => LevelFilter::Info,  // -v: Show info, warnings, errors
        2 => LevelFilter::Debug, // -vv: Show debug, info, warnings, errors
        _ => LevelFilter::Trace, // -vvv and more: Show everything
    };

    env_logger::Builder::new().filter_level(log_level).init();

    info!("Log level set to: {}", log_level);
    debug!("Parsed arguments: {:?}", cli);

    // --- Determine Target Path ---
    let target_path = match cli.target_path.clone() {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current working directory")?,
    };
    info!("Target path determined as: {:?}", target_path);

    let settings = build_run_settings(&cli, &target_path)?;

    // Configuration errors must surface before any record is read.
    let mut stream = FileTreeStream::new(settings.stream_options())
        .context("Invalid filetree configuration")?;

    let records = match list_records(&settings.list_config) {
        Ok(records) => records,
        Err(e) => {
            error!("Error while listing {:?}: {}", target_path, e);
            return Err(e.into());
        }
    };

    for record in records {
        stream.push(record)?;
    }
    let emitted = stream.finish()?;

    for record in &emitted {
        match &record.contents {
            Some(contents) => write_artifact(record, contents, cli.output.as_deref())?,
            None => write_file_line(record)?,
        }
    }

    Ok(())
}

fn write_artifact(record: &FileRecord, contents: &[u8], output_dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        let output_path = dir.join(&record.path);
        info!("Writing tree to file: {:?}", output_path);
        fs::write(&output_path, contents)
            .with_context(|| format!("Failed to write tree to file: {:?}", output_path))?;
    } else {
        debug!("Writing {:?} to stdout...", record.path);
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(contents)
            .context("Failed to write tree to stdout")?;
        stdout.write_all(b"\n").context("Failed to write tree to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    }
    Ok(())
}

fn write_file_line(record: &FileRecord) -> Result<()> {
    let line = serde_json::json!({
        "path": record.path,
        "tree": record.tree,
    });
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line).context("Failed to write file entry to stdout")?;
    Ok(())
}
