//! Fatal command implementation - synchronous write, then exit 1

use anyhow::Result;
use oxidelog_engine::Engine;

use crate::cli::FatalArgs;

pub fn execute(args: FatalArgs) -> Result<()> {
    let config = args.engine.resolve()?;

    let engine = Engine::new(config);
    engine.start()?;
    engine.fatal(&args.message)
}
