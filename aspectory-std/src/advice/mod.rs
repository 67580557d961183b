//! Standard advice implementations.

pub mod logging;

pub use logging::LoggingAdvice;
