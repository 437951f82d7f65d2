//! SQL Server session handling.

use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::{Error, Result};

/// A connected TDS session.
pub type SqlClient = tiberius::Client<Compat<TcpStream>>;

/// Open a session from an ADO-style connection string
/// (`server=tcp:host,1433;database=app;user=...;password=...`).
///
/// Each pipeline phase opens its own session and drops it when the phase
/// ends, so a session is released on every exit path.
pub async fn connect(connection_string: &str) -> Result<SqlClient> {
    let config = tiberius::Config::from_ado_string(connection_string).map_err(Error::Connection)?;

    let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
        Error::Connection(tiberius::error::Error::Io {
            kind: e.kind(),
            message: e.to_string(),
        })
    })?;
    tcp.set_nodelay(true).ok();

    tiberius::Client::connect(config, tcp.compat_write())
        .await
        .map_err(Error::Connection)
}
