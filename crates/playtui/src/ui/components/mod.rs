//! Collection of reusable TUI components.

pub mod console;
pub mod preview;
pub mod selection_tree;
