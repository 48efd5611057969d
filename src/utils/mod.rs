//! Utility modules for the static site generator.

pub mod markdown;
pub mod text;
pub mod url;
