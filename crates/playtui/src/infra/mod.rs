//! Infrastructure adapters for log capture and terminal rendering support.

pub mod console;
pub mod highlight;
