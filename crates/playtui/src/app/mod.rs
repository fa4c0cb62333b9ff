//! Application layer orchestrating domain logic and infrastructure.

pub mod dispatch;
pub mod filter;
pub mod preview;
pub mod scan;
