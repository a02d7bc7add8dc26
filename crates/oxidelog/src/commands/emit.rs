//! Emit command implementation - writes application log messages

use anyhow::Result;
use oxidelog_engine::Engine;

use crate::cli::EmitArgs;
use crate::output::print_success;

pub fn execute(args: EmitArgs) -> Result<()> {
    let config = args.engine.resolve()?;
    let folder = config.app.folder.clone();

    let engine = Engine::new(config);
    engine.start()?;

    for seq in 0..args.count {
        if args.count > 1 {
            engine.log(args.level, format!("{} {}", args.message, seq));
        } else {
            engine.log(args.level, &args.message);
        }
    }

    // Blocks until every queued line is on disk
    engine.stop();

    print_success(&format!(
        "Wrote {} {} message(s) to {}",
        args.count,
        args.level,
        folder.display()
    ));
    Ok(())
}
