// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dossier: assemble application materials into one paginated PDF.
//
// Entry point. Initialises logging, loads configuration, lists inputs, and
// runs one assembly.

mod listing;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dossier_core::AssemblyConfig;
use dossier_core::error::Result;
use dossier_core::types::ProgressEvent;
use dossier_document::{Assembler, AssemblyRequest};

use listing::{Manifest, list_inputs, suggested_output_name};

/// Merge PDFs, images, and Word documents into one PDF with a generated
/// table of contents and page numbers.
#[derive(Parser, Debug)]
#[command(name = "dossier", author, version, about)]
struct Cli {
    /// Institution name written into the table-of-contents heading.
    #[arg(long = "school")]
    school_name: String,

    /// DOCX template carrying the institution and table-of-contents markers.
    #[arg(long)]
    template: PathBuf,

    /// Output PDF. Defaults to "<school>-申请材料.pdf" in the current directory.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON manifest listing inputs with display names, used instead of INPUTS.
    #[arg(long, conflicts_with = "inputs")]
    manifest: Option<PathBuf>,

    /// Input files or directories, in final document order.
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<PathBuf> {
    let config = match &cli.config {
        Some(path) => AssemblyConfig::load(path)?,
        None => AssemblyConfig::default(),
    };

    let items = match &cli.manifest {
        Some(path) => Manifest::load(path)?.into_items(),
        None => list_inputs(&cli.inputs)?,
    };
    tracing::info!(items = items.len(), "Inputs listed");

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(suggested_output_name(&cli.school_name)));

    let request = AssemblyRequest {
        items,
        school_name: cli.school_name,
        template: cli.template,
        output,
    };

    let assembler = Assembler::new(config);
    assembler.run(&request, &mut log_progress)
}

fn log_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Step { label, percent } => {
            tracing::info!(percent = *percent, "{label}");
        }
        ProgressEvent::Finished { output } => {
            tracing::info!(percent = 100, output = %output.display(), "Done");
        }
        ProgressEvent::Failed { message } => {
            tracing::error!("{message}");
        }
    }
}
