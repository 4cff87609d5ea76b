// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use knot::{
    descriptor,
    path::project_path,
    prompt::ConsolePrompter,
    registry, serial, VERSION,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::process::exit;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  knot [options] <knot-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Init(opts) => run_init(opts),
            Command::Use(opts) => run_use(opts),
            Command::Version(opts) => run_version(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Initialize a repository to be used by knot.
    #[command(override_usage = "knot init [path]")]
    Init(InitOptions),

    /// Install a knot into your user registry.
    #[command(override_usage = "knot use [options] [path]")]
    Use(UseOptions),

    /// Get the current version of knot.
    #[command(override_usage = "knot version [options]")]
    Version(VersionOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Path to project directory to initialize.
    #[arg(default_value = ".", value_name = "path")]
    pub path: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UseOptions {
    /// Path to project directory, or its descriptor file, to install.
    #[arg(default_value = ".", value_name = "path")]
    pub path: String,

    /// Install even if a knot with the same name is already installed.
    #[arg(short, long)]
    pub overwrite: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct VersionOptions {
    /// Output the version in another format (yaml or json).
    #[arg(short, long, value_name = "format")]
    pub output: Option<String>,
}

fn main() {
    let layer = fmt::layer().compact().with_target(false).without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_init(opts: InitOptions) -> Result<()> {
    let path = project_path(&opts.path)?;
    let mut prompter = ConsolePrompter::default();
    descriptor::initialize(&path, &mut prompter)?;

    Ok(())
}

fn run_use(opts: UseOptions) -> Result<()> {
    if !registry::ensure_exists() {
        bail!("user registry is not usable and could not be repaired");
    }

    let path = project_path(&opts.path)?;
    let name = registry::install(&path, opts.overwrite)?;
    info!("Successfully installed: {name}");

    Ok(())
}

fn run_version(opts: VersionOptions) -> Result<()> {
    match opts.output {
        Some(format) => println!(
            "{}",
            serial::render(&json!({ "version": VERSION }), &format, false)
        ),
        None => println!("knot version v{VERSION}"),
    }

    Ok(())
}
