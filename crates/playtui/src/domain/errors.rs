//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("selection incomplete: {0}")]
    SelectionIncomplete(String),
    #[error("engine invocation failed: {0}")]
    EngineInvocation(#[source] std::io::Error),
}
