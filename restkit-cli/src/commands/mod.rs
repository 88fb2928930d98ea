//! Command implementations for the restkit CLI

pub mod call;
pub mod serve;

pub use call::run_call;
pub use serve::run_serve;
