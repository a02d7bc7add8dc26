//! Purge command implementation - one pass over both log folders

use anyhow::Result;
use oxidelog_core::{ACCESS_LOG_NAME, APP_LOG_NAME};
use oxidelog_engine::purge_once;
use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::cli::EngineArgs;
use crate::output::{is_json_mode, print_error, print_info, print_json, print_success};

#[derive(Serialize)]
struct PurgeJson {
    stream: &'static str,
    removed: Vec<PathBuf>,
    failed: Vec<PathBuf>,
}

pub fn execute(args: EngineArgs) -> Result<()> {
    let config = args.resolve()?;
    let now = SystemTime::now();
    let mut results = Vec::with_capacity(2);

    for (stream, base_name) in [(&config.app, APP_LOG_NAME), (&config.access, ACCESS_LOG_NAME)] {
        if stream.max_age_days == 0 {
            print_info(&format!("Purge disabled for {}", base_name));
            continue;
        }

        let report = purge_once(&stream.folder, base_name, stream.max_age_days, now)?;
        for path in &report.failed {
            print_error(&format!("Unable to remove {}", path.display()));
        }
        results.push(PurgeJson {
            stream: base_name,
            removed: report.removed,
            failed: report.failed,
        });
    }

    if is_json_mode() {
        print_json(&results);
        return Ok(());
    }

    for result in &results {
        print_success(&format!(
            "{}: removed {} archive(s)",
            result.stream,
            result.removed.len()
        ));
        for path in &result.removed {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
