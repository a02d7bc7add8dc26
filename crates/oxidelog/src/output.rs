//! Terminal output helpers

use colored::Colorize;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag for JSON output mode
static JSON_MODE: AtomicBool = AtomicBool::new(false);

/// Enable or disable JSON output mode
pub fn set_json_mode(enabled: bool) {
    JSON_MODE.store(enabled, Ordering::SeqCst);
}

/// Check if JSON output mode is enabled
pub fn is_json_mode() -> bool {
    JSON_MODE.load(Ordering::SeqCst)
}

pub fn print_success(message: &str) {
    if !is_json_mode() {
        println!("{} {}", "✓".green(), message);
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn print_info(message: &str) {
    if !is_json_mode() {
        println!("{} {}", "ℹ".blue(), message);
    }
}

/// Print a serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing to JSON: {}", e),
    }
}
