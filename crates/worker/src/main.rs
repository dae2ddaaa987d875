use anyhow::Result;
use clap::Parser;
use common::{Environment, setup_logging};
use worker::config::WorkerArgs;
use worker::spellcaster::Spellcaster;

fn main() -> Result<()> {
    let args = WorkerArgs::parse();
    args.validate()?;

    let environment = Environment::from_env();
    setup_logging(environment);

    tracing::info!(mode = ?args.mode, "Worker starting");
    let spellcaster = Spellcaster::build(&args)?;
    spellcaster.run()
}
