//! Transactional application of rendered schema changes.

use tracing::{error, info};

use crate::client::SqlClient;
use crate::{Error, Result};

/// Outcome of an apply run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyReport {
    /// Statements applied and committed.
    pub applied: usize,
}

/// Apply a batch of statements atomically.
///
/// Every statement runs inside one explicit transaction; the first failure
/// rolls the whole batch back, then surfaces as [`Error::Execution`] naming
/// the offending statement. Partial application is never observable. Each
/// applied statement is reported before commit, and the commit or rollback
/// outcome is reported once.
pub async fn apply_batch(client: &mut SqlClient, statements: &[String]) -> Result<ApplyReport> {
    if statements.is_empty() {
        return Ok(ApplyReport::default());
    }

    run(client, "BEGIN TRANSACTION")
        .await
        .map_err(Error::Connection)?;

    for statement in statements {
        match run(client, statement).await {
            Ok(()) => info!(%statement, "applied"),
            Err(cause) => {
                if let Err(rollback) = run(client, "ROLLBACK TRANSACTION").await {
                    error!(error = %rollback, "rollback failed");
                }
                error!(%statement, "batch rolled back");
                return Err(Error::Execution {
                    statement: statement.clone(),
                    cause,
                });
            }
        }
    }

    run(client, "COMMIT TRANSACTION")
        .await
        .map_err(|cause| Error::Execution {
            statement: "COMMIT TRANSACTION".to_string(),
            cause,
        })?;

    info!(applied = statements.len(), "transaction committed");
    Ok(ApplyReport {
        applied: statements.len(),
    })
}

/// Execute a single statement outside any transaction, for ad hoc one-off
/// application. Reports the statement on success and surfaces the failure
/// as-is otherwise; nothing is rolled back.
pub async fn execute_one(client: &mut SqlClient, statement: &str) -> Result<()> {
    match run(client, statement).await {
        Ok(()) => {
            info!(%statement, "executed");
            Ok(())
        }
        Err(cause) => Err(Error::Execution {
            statement: statement.to_string(),
            cause,
        }),
    }
}

/// Run one statement (or batch) to completion, draining its result stream.
async fn run(client: &mut SqlClient, sql: &str) -> std::result::Result<(), tiberius::error::Error> {
    client.simple_query(sql).await?.into_results().await?;
    Ok(())
}
