// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use polkadot::{config::ENTRY_DOCUMENT, App, Plan};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "polkadot [options] [component_dir]...",
    version
)]
struct Cli {
    /// Prepare and preview output files without writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Entry tag document, relative to current directory.
    #[arg(short, long, value_name = "path", default_value = ENTRY_DOCUMENT)]
    pub entry: PathBuf,

    /// Component directories to weave from, searched in order.
    #[arg(value_name = "component_dir")]
    pub component_dirs: Vec<PathBuf>,
}

impl Cli {
    fn run(self) -> Result<()> {
        let dotfiles_dir =
            std::env::current_dir().context("failed to determine dotfiles directory")?;
        let app = App::new(dotfiles_dir, self.entry, self.component_dirs);

        println!("{}", "* Preparing...".cyan().bold());
        let plan = app.prepare()?;
        preview(&plan);

        if self.dry_run {
            println!("{}", "* Dry-run mode is enabled.".yellow().bold());
            return Ok(());
        }

        println!("{}", "* Executing...".cyan().bold());
        app.execute(&plan)?;

        Ok(())
    }
}

fn preview(plan: &Plan) {
    for entry in &plan.entries {
        println!("{}", entry.target.to_string().blue());
        for source in &entry.sources {
            println!("- {}", source.path.display());
        }
    }
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run() {
        println!("{}", "* Failed.".red().bold());
        error!("{error:?}");
        exit(1);
    }

    println!("{}", "* Completed.".green().bold());
    exit(0)
}
