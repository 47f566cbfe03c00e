// Markit watermarking library

pub mod config;
pub mod error;
pub mod logging;
pub mod watermark;

pub use error::MarkitError;
