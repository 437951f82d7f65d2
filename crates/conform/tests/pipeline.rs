//! End-to-end checks for the plan side of the pipeline: extraction, diffing
//! and rendering, composed the way `Reconciler::plan` composes them. The live
//! side is stood in for by hand-built [`SchemaSet`]s; executor behavior
//! against a real database lives in `executor_live.rs`.

use conform::dialect::SqlServerLiterals;
use conform::{
    ChangeOperation, ColumnDescription, Error, FieldDescriptor, Literal, LogicalType,
    ModelDescriptor, Reconciler, SchemaError, SchemaSet, TableDescription, diff_schemas,
};

fn role_models() -> Vec<ModelDescriptor> {
    vec![
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
            .field(FieldDescriptor::new("RoleId", LogicalType::Integer).references("Roles", "Id")),
    ]
}

fn extract(models: &[ModelDescriptor]) -> Vec<TableDescription> {
    models.iter().map(|m| m.to_table().unwrap()).collect()
}

/// Live `Users` as the catalog would report it: canonical types, recovered
/// default text, constraint facts defaulted.
fn live_users(columns: &[(&str, &str)]) -> TableDescription {
    TableDescription {
        name: "Users".to_string(),
        columns: columns
            .iter()
            .map(|(name, native_type)| ColumnDescription {
                name: name.to_string(),
                native_type: native_type.to_string(),
                is_primary_key: false,
                is_unique: false,
                is_indexed: false,
                foreign_key: None,
                default_value: None,
                check_constraint: None,
            })
            .collect(),
    }
}

#[test]
fn test_fresh_database_renders_create_scripts() {
    let tables = extract(&role_models());
    let diff = diff_schemas(&tables, &SchemaSet::new(), &SqlServerLiterals);

    let statements = diff.statements(&SqlServerLiterals);
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0],
        "CREATE TABLE Roles (\n\
         Id INT PRIMARY KEY,\n\
         Name NVARCHAR(MAX) UNIQUE,\n\
         CreatedAt DATETIME DEFAULT 'CURRENT_TIMESTAMP'\n\
         );"
    );
    assert!(statements[1].starts_with("CREATE TABLE Users (\n"));
}

#[test]
fn test_missing_fk_column_is_added() {
    let tables = extract(&role_models());

    let mut live = SchemaSet::new();
    live.insert(extract(&role_models()[..1]).remove(0));
    live.insert(live_users(&[("Id", "INT"), ("Username", "NVARCHAR(MAX)")]));

    let diff = diff_schemas(&tables, &live, &SqlServerLiterals);
    assert_eq!(diff.len(), 1);
    assert!(matches!(
        &diff.changes[0],
        ChangeOperation::AddColumn { table, column } if table == "Users" && column.name == "RoleId"
    ));
    assert_eq!(
        diff.statements(&SqlServerLiterals),
        vec!["ALTER TABLE Users ADD RoleId INT;"]
    );
}

#[test]
fn test_plan_statements_are_reproducible() {
    let tables = extract(&role_models());
    let first = diff_schemas(&tables, &SchemaSet::new(), &SqlServerLiterals)
        .statements(&SqlServerLiterals);
    let second = diff_schemas(&tables, &SchemaSet::new(), &SqlServerLiterals)
        .statements(&SqlServerLiterals);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unmapped_type_fails_before_any_connection() {
    // The connection string points nowhere; if extraction did not fail first,
    // planning would surface a connection error instead.
    let reconciler = Reconciler::new("server=tcp:127.0.0.1,1;database=void;user=x;password=x");
    let models = vec![
        ModelDescriptor::new("Docs").field(FieldDescriptor::new("Body", LogicalType::Json)),
    ];

    let err = reconciler.plan(&models).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::UnmappedType { logical: LogicalType::Json, .. })
    ));
}

#[tokio::test]
async fn test_missing_table_name_fails_before_any_connection() {
    let reconciler = Reconciler::new("server=tcp:127.0.0.1,1;database=void;user=x;password=x");
    let models =
        vec![ModelDescriptor::new("").field(FieldDescriptor::new("Id", LogicalType::Integer))];

    let err = reconciler.plan(&models).await.unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::MissingTableName)));
}
