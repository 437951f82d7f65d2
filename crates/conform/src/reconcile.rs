//! The reconciliation pipeline: extract, introspect, diff, render, apply.

use conform_schema::dialect::{DefaultLiteralPolicy, SqlServerLiterals};
use conform_schema::{ModelDescriptor, TableDescription};
use tracing::info;

use crate::diff::{ChangeSet, diff_schemas};
use crate::execute::{self, ApplyReport};
use crate::{Result, client, introspect};

/// A computed reconciliation plan: the ordered changes plus their rendered
/// statements. The statement list is the run's primary artifact and is stable
/// for identical inputs.
#[derive(Debug, Clone)]
pub struct Plan {
    changes: ChangeSet,
    statements: Vec<String>,
}

impl Plan {
    /// The ordered change operations.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// The rendered statements, in application order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Returns true if the live schema already conforms.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Drives one reconciliation run against a database.
///
/// The run is a single linear pipeline: models are extracted first (pure;
/// an unmapped type fails here, before any connection is opened), the live
/// catalog is introspected on its own session, the two sides are diffed, and
/// the rendered plan is applied on a second, independent session. Sessions
/// are scoped to their phase, so each is released on every exit path.
pub struct Reconciler {
    connection_string: String,
    policy: Box<dyn DefaultLiteralPolicy + Send + Sync>,
}

impl Reconciler {
    /// A reconciler for the given ADO-style connection string, formatting
    /// default literals the SQL Server way.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            policy: Box::new(SqlServerLiterals),
        }
    }

    /// Swap the default-literal formatting policy.
    pub fn with_literal_policy(
        mut self,
        policy: impl DefaultLiteralPolicy + Send + Sync + 'static,
    ) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Extract every registered model into a table description. Pure; fails
    /// fast so a bad model never reaches the database.
    pub fn extract(&self, models: &[ModelDescriptor]) -> Result<Vec<TableDescription>> {
        models
            .iter()
            .map(|model| model.to_table().map_err(Into::into))
            .collect()
    }

    /// Compute the plan for the given models without touching the schema.
    /// The introspection session lives only for the duration of this call.
    pub async fn plan(&self, models: &[ModelDescriptor]) -> Result<Plan> {
        let desired = self.extract(models)?;

        let live = {
            let mut client = client::connect(&self.connection_string).await?;
            introspect::introspect_schema(&mut client).await?
        };

        let changes = diff_schemas(&desired, &live, self.policy.as_ref());
        let statements = changes.statements(self.policy.as_ref());
        info!(
            changes = changes.len(),
            statements = statements.len(),
            "planned reconciliation"
        );

        Ok(Plan {
            changes,
            statements,
        })
    }

    /// Apply a plan atomically on its own session. An empty plan opens no
    /// connection at all.
    pub async fn apply(&self, plan: &Plan) -> Result<ApplyReport> {
        if plan.is_empty() {
            info!("schema already conforms");
            return Ok(ApplyReport::default());
        }

        let mut client = client::connect(&self.connection_string).await?;
        execute::apply_batch(&mut client, plan.statements()).await
    }

    /// Plan and apply in one run.
    pub async fn reconcile(&self, models: &[ModelDescriptor]) -> Result<ApplyReport> {
        let plan = self.plan(models).await?;
        self.apply(&plan).await
    }
}
