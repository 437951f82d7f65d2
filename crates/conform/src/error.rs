use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be reached or authenticated to. Fatal for the
    /// whole run.
    #[error("connection failed: {0}")]
    Connection(#[source] tiberius::error::Error),

    /// Model extraction failed; raised before any connection is opened.
    #[error(transparent)]
    Schema(#[from] conform_schema::SchemaError),

    /// A statement failed. In batch mode the whole transaction has been
    /// rolled back by the time this surfaces.
    #[error("statement failed: {statement}")]
    Execution {
        statement: String,
        #[source]
        cause: tiberius::error::Error,
    },
}
