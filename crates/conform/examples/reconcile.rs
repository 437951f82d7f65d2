//! Declare a pair of models and reconcile a database against them.
//!
//! Reads the connection string from `DATABASE_URL` (a `.env` file works):
//!
//! ```text
//! DATABASE_URL=server=tcp:localhost,1433;database=app;user=sa;password=...;TrustServerCertificate=true
//! ```

use conform::{FieldDescriptor, Literal, LogicalType, ModelDescriptor, Reconciler};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let models = vec![
        ModelDescriptor::new("Roles")
            .field(FieldDescriptor::new("Id", LogicalType::Integer).primary_key())
            .field(FieldDescriptor::new("Name", LogicalType::Text).unique())
            .field(
                FieldDescriptor::new("CreatedAt", LogicalType::Timestamp)
                    .default_value(Literal::text("CURRENT_TIMESTAMP")),
            ),
        ModelDescriptor::new("Users")
            .field(FieldDescriptor::new("Id", LogicalType::Integer).primary_key())
            .field(FieldDescriptor::new("Username", LogicalType::Text).unique())
            .field(FieldDescriptor::new("RoleId", LogicalType::Integer).references("Roles", "Id"))
            .field(
                FieldDescriptor::new("CreatedAt", LogicalType::Timestamp)
                    .default_value(Literal::text("CURRENT_TIMESTAMP")),
            ),
    ];

    let reconciler = Reconciler::new(std::env::var("DATABASE_URL")?);

    let plan = reconciler.plan(&models).await?;
    if plan.is_empty() {
        println!("schema already conforms");
        return Ok(());
    }

    print!("{}", plan.changes());
    let report = reconciler.apply(&plan).await?;
    println!("applied {} statement(s)", report.applied);

    Ok(())
}
