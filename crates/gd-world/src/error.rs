use gd_core::{DepotId, GdError, Position};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("{what} {id} already exists")]
    Duplicate { what: &'static str, id: u32 },

    #[error("a main depot is already registered ({0})")]
    SecondMainDepot(DepotId),

    #[error("{what} position {pos} lies outside the grid")]
    OutOfBounds { what: &'static str, pos: Position },

    #[error(transparent)]
    Core(#[from] GdError),
}

pub type WorldResult<T> = Result<T, WorldError>;
