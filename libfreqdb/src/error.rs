use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}:{line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("bulk write rejected after {attempts} attempt(s): {source}")]
    BatchRejected {
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("unknown tagset '{0}' (expected 'identity' or 'penn')")]
    UnknownTagset(String),
}
