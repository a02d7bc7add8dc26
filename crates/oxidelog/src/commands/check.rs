//! Check command implementation - validates and prints the configuration

use anyhow::Result;

use crate::cli::EngineArgs;
use crate::output::{is_json_mode, print_json, print_success};

pub fn execute(args: EngineArgs) -> Result<()> {
    let config = args.resolve()?;

    if is_json_mode() {
        print_json(&config);
        return Ok(());
    }

    print_success("Configuration is valid");
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
