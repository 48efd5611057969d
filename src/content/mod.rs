//! Content model: trees, pages, menus and the per-page context.

pub mod alternates;
pub mod context;
pub mod menu;
pub mod page;
pub mod tree;
