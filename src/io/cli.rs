//! Command-line interface for assembling maps from theme files

use crate::assembly::{AssembleOptions, assemble};
use crate::catalog::ump;
use crate::io::error::Result;
use crate::io::progress::ProgressManager;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "tileweave")]
#[command(
    author,
    version,
    about = "Assemble random maps from tile theme definitions"
)]
/// Command-line arguments for the map assembly tool
pub struct Cli {
    /// Theme definition file (.ump) to assemble
    #[arg(value_name = "THEME")]
    pub theme: PathBuf,

    /// Assembly id to use; picked at random when omitted
    #[arg(short, long)]
    pub assembly: Option<String>,

    /// Random seed for reproducible assembly
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Worker threads racing for a solution (1 = deterministic search)
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Number of maps to assemble
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,

    /// Print an ASCII rendering of each assembled grid
    #[arg(short, long)]
    pub dump: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Loads a theme once and runs the requested assembly attempts
pub struct ThemeProcessor {
    cli: Cli,
    progress: Option<ProgressManager>,
}

impl ThemeProcessor {
    /// Create a processor from parsed CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress = cli
            .should_show_progress()
            .then(|| ProgressManager::new(cli.count));
        Self { cli, progress }
    }

    /// Assemble the requested number of maps
    ///
    /// # Errors
    ///
    /// Returns an error if the theme cannot be loaded or any assembly run
    /// fails fatally.
    // The assembled map strings are the program's output
    #[allow(clippy::print_stdout)]
    pub fn process(&mut self) -> Result<()> {
        let theme = Arc::new(ump::load_theme(&self.cli.theme)?);

        let options = AssembleOptions {
            assembly: self.cli.assembly.clone(),
            seed: self.cli.seed,
            threads: self.cli.threads,
            dump: self.cli.dump,
        };

        for _ in 0..self.cli.count {
            if let Some(progress) = &self.progress {
                progress.start_map(options.assembly.as_deref().unwrap_or("<random>"));
            }

            let map = assemble(&theme, &options)?;

            if let Some(dump) = &map.dump {
                println!("{dump}");
            }
            if !map.title.is_empty() {
                println!("title: {}", map.title);
            }
            println!("tiles: {}", map.tiles);
            println!("pos: {}", map.positions);
            println!("tiles: {}", map.placed);

            if let Some(progress) = &self.progress {
                progress.complete_map();
            }
        }

        if let Some(progress) = &self.progress {
            progress.finish();
        }
        Ok(())
    }
}
