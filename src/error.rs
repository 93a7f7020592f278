use thiserror::Error;

use crate::models::SourceKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0} dataset has not been supplied")]
    MissingSource(SourceKind),

    #[error("no student with id {0} in any dataset")]
    UnknownStudent(String),
}
