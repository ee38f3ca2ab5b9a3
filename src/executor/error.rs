use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("command timed out after {after:?}: {cmd}")]
    Timeout { cmd: String, after: Duration },
    #[error("no address found for node {0}")]
    NoAddress(usize),
}
