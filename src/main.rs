use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = cellflow::config::Config::parse();
    cellflow::app::run(cfg)
}
