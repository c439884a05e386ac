//! CLI entry point for the random map assembly tool

use clap::Parser;
use tileweave::io::cli::{Cli, ThemeProcessor};

fn main() -> tileweave::Result<()> {
    let cli = Cli::parse();
    let mut processor = ThemeProcessor::new(cli);
    processor.process()
}
