// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Heftwerk — assemble one PDF from the pages of many.
//
// Entry point. Initialises logging, loads the configuration, builds the
// session, then either merges in batch mode or runs the command loop on
// stdin.

mod commands;
mod services;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use heftwerk_core::types::Rotation;
use heftwerk_core::{AppConfig, RenderBackendKind};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use commands::{Command, USAGE, execute, notice_line};
use services::config_store::ConfigStore;
use state::Session;

/// Select PDF files, arrange their pages, preview and export the result.
#[derive(Parser, Debug)]
#[command(
    name = "heftwerk",
    version,
    about = "Select, reorder, rotate, preview and merge PDF pages",
    after_long_help = USAGE
)]
struct Cli {
    /// PDF files to add at startup, in order.
    files: Vec<PathBuf>,

    /// Where `--batch` writes the merged PDF (file or directory).
    #[arg(short, long, env = "HEFTWERK_OUTPUT")]
    output: Option<PathBuf>,

    /// Merge FILES into --output and exit without the command loop.
    #[arg(long, requires = "output")]
    batch: bool,

    /// Config file to read and save instead of the per-user one.
    #[arg(long, env = "HEFTWERK_CONFIG")]
    config: Option<PathBuf>,

    /// Preview renderer: outline or pdfium.
    #[arg(long, env = "HEFTWERK_BACKEND")]
    backend: Option<RenderBackendKind>,

    /// Initial rotation for landscape pages (0, 90, 180 or 270).
    #[arg(long, value_parser = parse_rotation)]
    landscape_rotation: Option<Rotation>,

    /// Leave landscape pages upright.
    #[arg(long, conflicts_with = "landscape_rotation")]
    no_auto_rotate: bool,

    /// Preview zoom factor.
    #[arg(long)]
    scale: Option<f32>,
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    let degrees: i32 = value.parse().map_err(|_| format!("'{value}' is not a number"))?;
    Rotation::from_degrees(degrees).map_err(|e| e.to_string())
}

impl Cli {
    /// Command-line flags override the stored settings.
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(backend) = self.backend {
            config.render_backend = backend;
        }
        if let Some(rotation) = self.landscape_rotation {
            config.landscape_rotation = Some(rotation);
        }
        if self.no_auto_rotate {
            config.landscape_rotation = None;
        }
        if let Some(scale) = self.scale {
            config.preview_scale = scale;
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Heftwerk starting");

    let store = match &cli.config {
        Some(path) => ConfigStore::at(path),
        None => ConfigStore::default_location(),
    };
    let config = cli.apply(store.load());

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", notice_line(&e));
            return ExitCode::FAILURE;
        }
    };

    if !cli.files.is_empty() {
        let reply = execute(&mut session, &store, Command::Add(cli.files.clone())).await;
        print_lines(&reply.lines);
    }

    if cli.batch {
        let Some(output) = cli.output.as_deref() else {
            return ExitCode::FAILURE;
        };
        return match session.export_to(output).await {
            Ok(path) => {
                println!("exported {} pages to {}", session.manifest().len(), path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", notice_line(&e));
                ExitCode::FAILURE
            }
        };
    }

    run_loop(&mut session, &store).await;
    tracing::info!("Heftwerk stopped");
    ExitCode::SUCCESS
}

/// Read commands from stdin until `quit` or end of input.
async fn run_loop(session: &mut Session, store: &ConfigStore) {
    println!("Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        match Command::parse(&line) {
            Ok(Some(command)) => {
                let reply = execute(session, store, command).await;
                print_lines(&reply.lines);
                if reply.quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(usage) => {
                println!("{usage}");
                println!("{USAGE}");
            }
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
