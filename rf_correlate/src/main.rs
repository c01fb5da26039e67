mod cli;
mod config;
mod filter;
mod process;
mod reader;
mod report;
mod results;
mod transcript;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let cfg = cli::handle_cli().with_context(|| "Error processing command line arguments")?;
    let wrt = process::open_output(&cfg)?;
    let (res, _) = process::correlate_transcripts(&cfg, wrt)?;
    report::report(&cfg, &res)
}
