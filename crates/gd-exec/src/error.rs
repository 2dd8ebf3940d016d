use gd_core::{DepotId, GdError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("depot {0} cannot refuel vehicles")]
    RefuelUnsupported(DepotId),

    #[error(transparent)]
    Core(#[from] GdError),
}

pub type ExecResult<T> = Result<T, ExecError>;
