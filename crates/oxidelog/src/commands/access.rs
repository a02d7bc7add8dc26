//! Access command implementation - writes one access log record

use anyhow::Result;
use oxidelog_core::RequestMeta;
use oxidelog_engine::Engine;
use std::time::Duration;

use crate::cli::AccessArgs;
use crate::output::print_success;

pub fn execute(args: AccessArgs) -> Result<()> {
    let config = args.engine.resolve()?;
    let folder = config.access.folder.clone();

    let mut request = RequestMeta::new(&args.method, &args.url, &args.protocol, &args.remote);
    if let Some(fwd) = &args.forwarded_for {
        request = request.with_forwarded_for(fwd);
    }
    if let Some(agent) = &args.user_agent {
        request = request.with_user_agent(agent);
    }

    let engine = Engine::new(config);
    engine.start()?;
    engine.log_access(
        &request,
        args.status,
        args.bytes,
        Duration::from_micros(args.duration_us),
    );
    engine.stop();

    print_success(&format!(
        "Recorded {} {} => {} in {}",
        args.method,
        args.url,
        args.status,
        folder.display()
    ));
    Ok(())
}
