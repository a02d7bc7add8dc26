//! Command implementations

pub mod access;
pub mod check;
pub mod emit;
pub mod fatal;
pub mod purge;
