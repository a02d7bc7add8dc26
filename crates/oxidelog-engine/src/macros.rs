//! Formatting shorthands for the engine's logging calls
//!
//! ```ignore
//! log_info!(engine, "listening on {}", addr);
//! ```
//!
//! The call site recorded for ` at file:line` is the macro invocation.

#[macro_export]
macro_rules! log_debug {
    ($engine:expr, $($arg:tt)+) => {
        $engine.debug(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_info {
    ($engine:expr, $($arg:tt)+) => {
        $engine.info(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($engine:expr, $($arg:tt)+) => {
        $engine.warn(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_error {
    ($engine:expr, $($arg:tt)+) => {
        $engine.error(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_fatal {
    ($engine:expr, $($arg:tt)+) => {
        $engine.fatal(::std::format_args!($($arg)+))
    };
}
