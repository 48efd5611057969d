//! Output generators: search index, sitemap and robots.txt.

pub mod search;
pub mod sitemap;
