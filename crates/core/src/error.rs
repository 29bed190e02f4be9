use thiserror::Error;

use crate::attempt::AttemptError;
use crate::model::{LevelParseError, ParseIdError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    LevelParse(#[from] LevelParseError),
    #[error(transparent)]
    IdParse(#[from] ParseIdError),
}
