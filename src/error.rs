use thiserror::Error;

/// Errors surfaced by the crate.
///
/// The typing session and the leaderboard engine are total over well-formed
/// input; only starting a session with a bad [`crate::attempt::ExerciseSpec`]
/// fails there. The remaining variants belong to storage, config and export.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid exercise spec: {0}")]
    InvalidSpec(String),

    #[error("corpus `{name}` could not be parsed: {source}")]
    Corpus {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no bundled corpus named `{0}`")]
    MissingCorpus(String),

    #[error("stored attempt is malformed: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
