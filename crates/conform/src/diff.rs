//! Schema diffing - compare declared model tables against the live schema.
//!
//! This module produces the ordered list of changes needed to bring the live
//! database into structural conformance with the model. Reconciliation is
//! additive and corrective for declared tables only: live tables the model
//! never mentions are left untouched, and nothing outside a declared table is
//! ever dropped.
//!
//! ## Ordering
//!
//! The operation list is deterministic so plans can be diffed in tests:
//! tables are visited in model registry order, and within a matched table the
//! creates come first, then alters/adds in model column order, then drops in
//! live column order.
//!
//! ## Comparison rules
//!
//! Native types are compared canonical-vs-canonical: both sides were
//! produced by the same type map, so a live `nvarchar` with unbounded length
//! and a model `Text` both read `NVARCHAR(MAX)` here. Defaults are compared
//! by rendering both sides through the same [`DefaultLiteralPolicy`], with
//! the catalog's parenthesis wrapping already stripped at introspection.

use std::collections::HashSet;
use std::fmt;

use conform_schema::dialect::DefaultLiteralPolicy;
use conform_schema::{ColumnDescription, SchemaSet, TableDescription};

use crate::ddl;

/// A single schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOperation {
    /// Create a table missing from the live database.
    CreateTable(TableDescription),
    /// Add a model column missing from the live table.
    AddColumn {
        table: String,
        column: ColumnDescription,
    },
    /// Re-type a live column whose native type or default drifted. Carries
    /// the full target description so rendering can rebuild the default
    /// constraint alongside the type.
    AlterColumnType {
        table: String,
        column: ColumnDescription,
    },
    /// Drop a live column the model no longer declares.
    DropColumn { table: String, column: String },
}

impl ChangeOperation {
    /// Render the SQL statement(s) for this change.
    ///
    /// Most changes render to a single statement. `AlterColumnType` renders
    /// to up to three: SQL Server binds defaults as named constraints that
    /// block `ALTER COLUMN`, so any existing default constraint is dropped
    /// first (a no-op batch when none is bound), the column is re-typed, and
    /// the model's default is re-established under a deterministic name.
    pub fn statements(&self, policy: &dyn DefaultLiteralPolicy) -> Vec<String> {
        match self {
            ChangeOperation::CreateTable(table) => vec![ddl::create_table_sql(table, policy)],
            ChangeOperation::AddColumn { table, column } => {
                vec![format!(
                    "ALTER TABLE {} ADD {};",
                    table,
                    ddl::column_clause(column, policy)
                )]
            }
            ChangeOperation::AlterColumnType { table, column } => {
                let mut statements = vec![
                    drop_default_constraint_sql(table, &column.name),
                    format!(
                        "ALTER TABLE {} ALTER COLUMN {} {};",
                        table, column.name, column.native_type
                    ),
                ];
                if let Some(default) = &column.default_value {
                    statements.push(format!(
                        "ALTER TABLE {table} ADD CONSTRAINT DF_{table}_{column} DEFAULT {literal} FOR {column};",
                        table = table,
                        column = column.name,
                        literal = policy.render(default),
                    ));
                }
                statements
            }
            ChangeOperation::DropColumn { table, column } => {
                vec![format!("ALTER TABLE {} DROP COLUMN {};", table, column)]
            }
        }
    }
}

/// Batch that drops whatever default constraint is bound to a column, by
/// looking its name up in `sys.default_constraints`. The catalog only hands
/// us the default's text, never the constraint name, so the lookup happens
/// server-side.
fn drop_default_constraint_sql(table: &str, column: &str) -> String {
    format!(
        "DECLARE @df sysname;\n\
         SELECT @df = d.name FROM sys.default_constraints d\n\
         WHERE d.parent_object_id = OBJECT_ID(N'{table}')\n\
         AND d.parent_column_id = COLUMNPROPERTY(OBJECT_ID(N'{table}'), N'{column}', 'ColumnId');\n\
         IF @df IS NOT NULL EXEC(N'ALTER TABLE {table} DROP CONSTRAINT [' + @df + N']');"
    )
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOperation::CreateTable(table) => write!(f, "+ table {}", table.name),
            ChangeOperation::AddColumn { table, column } => {
                write!(f, "+ {}.{}: {}", table, column.name, column.native_type)
            }
            ChangeOperation::AlterColumnType { table, column } => {
                write!(f, "~ {}.{}: {}", table, column.name, column.native_type)
            }
            ChangeOperation::DropColumn { table, column } => {
                write!(f, "- {}.{}", table, column)
            }
        }
    }
}

/// The ordered changes of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Changes in application order.
    pub changes: Vec<ChangeOperation>,
}

impl ChangeSet {
    /// Returns true if the live schema already conforms.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of change operations.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Render every change into its SQL statements, in order.
    pub fn statements(&self, policy: &dyn DefaultLiteralPolicy) -> Vec<String> {
        self.changes
            .iter()
            .flat_map(|change| change.statements(policy))
            .collect()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "No changes detected.")?;
        } else {
            writeln!(f, "Changes detected:\n")?;
            for change in &self.changes {
                writeln!(f, "  {}", change)?;
            }
        }
        Ok(())
    }
}

/// Compare the declared model tables against the live schema.
///
/// Running the result against the database and diffing again yields an empty
/// change set: every emitted operation, once applied, moves the live side
/// onto exactly what this comparison checks.
pub fn diff_schemas(
    model: &[TableDescription],
    live: &SchemaSet,
    policy: &dyn DefaultLiteralPolicy,
) -> ChangeSet {
    let mut changes = Vec::new();

    for desired in model {
        match live.get_table(&desired.name) {
            None => changes.push(ChangeOperation::CreateTable(desired.clone())),
            Some(current) => diff_table(desired, current, policy, &mut changes),
        }
    }

    ChangeSet { changes }
}

/// Diff one declared table against its live counterpart.
fn diff_table(
    desired: &TableDescription,
    current: &TableDescription,
    policy: &dyn DefaultLiteralPolicy,
    out: &mut Vec<ChangeOperation>,
) {
    // Alters and adds, in model column order.
    for column in &desired.columns {
        match current.column(&column.name) {
            None => out.push(ChangeOperation::AddColumn {
                table: desired.name.clone(),
                column: column.clone(),
            }),
            Some(live_column) => {
                if column.native_type != live_column.native_type
                    || !defaults_match(column, live_column, policy)
                {
                    out.push(ChangeOperation::AlterColumnType {
                        table: desired.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
    }

    // Drops, in live column order.
    let desired_names: HashSet<&str> = desired.columns.iter().map(|c| c.name.as_str()).collect();
    for column in &current.columns {
        if !desired_names.contains(column.name.as_str()) {
            out.push(ChangeOperation::DropColumn {
                table: desired.name.clone(),
                column: column.name.clone(),
            });
        }
    }
}

/// Compare default-value text by rendering both sides through the same
/// policy, so a typed model literal meets the catalog's recovered text in one
/// common form.
fn defaults_match(
    desired: &ColumnDescription,
    live: &ColumnDescription,
    policy: &dyn DefaultLiteralPolicy,
) -> bool {
    match (&desired.default_value, &live.default_value) {
        (None, None) => true,
        (Some(a), Some(b)) => policy.render(a) == policy.render(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_schema::Literal;
    use conform_schema::dialect::SqlServerLiterals;

    fn make_column(name: &str, native_type: &str) -> ColumnDescription {
        ColumnDescription {
            name: name.to_string(),
            native_type: native_type.to_string(),
            is_primary_key: false,
            is_unique: false,
            is_indexed: false,
            foreign_key: None,
            default_value: None,
            check_constraint: None,
        }
    }

    fn make_table(name: &str, columns: Vec<ColumnDescription>) -> TableDescription {
        TableDescription {
            name: name.to_string(),
            columns,
        }
    }

    fn live_set(tables: Vec<TableDescription>) -> SchemaSet {
        let mut set = SchemaSet::new();
        for table in tables {
            set.insert(table);
        }
        set
    }

    #[test]
    fn test_diff_empty() {
        let diff = diff_schemas(&[], &SchemaSet::new(), &SqlServerLiterals);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_diff_create_table() {
        let mut id = make_column("Id", "INT");
        id.is_primary_key = true;
        let model = vec![make_table("Roles", vec![id])];

        let diff = diff_schemas(&model, &SchemaSet::new(), &SqlServerLiterals);
        assert_eq!(diff.len(), 1);
        assert!(matches!(
            &diff.changes[0],
            ChangeOperation::CreateTable(t) if t.name == "Roles"
        ));

        let statements = diff.statements(&SqlServerLiterals);
        assert_eq!(statements, vec!["CREATE TABLE Roles (\nId INT PRIMARY KEY\n);"]);
    }

    #[test]
    fn test_diff_add_column() {
        let model = vec![make_table(
            "Users",
            vec![make_column("Id", "INT"), make_column("RoleId", "INT")],
        )];
        let live = live_set(vec![make_table("Users", vec![make_column("Id", "INT")])]);

        let diff = diff_schemas(&model, &live, &SqlServerLiterals);
        assert_eq!(diff.len(), 1);
        assert!(matches!(
            &diff.changes[0],
            ChangeOperation::AddColumn { table, column }
                if table == "Users" && column.name == "RoleId"
        ));
        assert_eq!(
            diff.statements(&SqlServerLiterals),
            vec!["ALTER TABLE Users ADD RoleId INT;"]
        );
    }

    #[test]
    fn test_diff_drop_column() {
        let model = vec![make_table("Users", vec![make_column("Id", "INT")])];
        let live = live_set(vec![make_table(
            "Users",
            vec![make_column("Id", "INT"), make_column("LegacyFlag", "BIT")],
        )]);

        let diff = diff_schemas(&model, &live, &SqlServerLiterals);
        assert_eq!(diff.len(), 1);
        assert_eq!(
            diff.statements(&SqlServerLiterals),
            vec!["ALTER TABLE Users DROP COLUMN LegacyFlag;"]
        );
    }

    #[test]
    fn test_diff_alter_on_type_change() {
        let model = vec![make_table("Users", vec![make_column("Age", "BIGINT")])];
        let live = live_set(vec![make_table("Users", vec![make_column("Age", "INT")])]);

        let diff = diff_schemas(&model, &live, &SqlServerLiterals);
        assert_eq!(diff.len(), 1);
        assert!(matches!(
            &diff.changes[0],
            ChangeOperation::AlterColumnType { table, column }
                if table == "Users" && column.name == "Age" && column.native_type == "BIGINT"
        ));

        let statements = diff.statements(&SqlServerLiterals);
        // Guarded default drop, then the re-type; no default to re-add.
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("sys.default_constraints"));
        assert_eq!(statements[1], "ALTER TABLE Users ALTER COLUMN Age BIGINT;");
    }

    #[test]
    fn test_diff_alter_on_default_change() {
        let mut desired = make_column("CreatedAt", "DATETIME");
        desired.default_value = Some(Literal::text("CURRENT_TIMESTAMP"));
        let mut live_col = make_column("CreatedAt", "DATETIME");
        live_col.default_value = Some(Literal::raw("getdate()"));

        let model = vec![make_table("Users", vec![desired])];
        let live = live_set(vec![make_table("Users", vec![live_col])]);

        let diff = diff_schemas(&model, &live, &SqlServerLiterals);
        assert_eq!(diff.len(), 1);

        let statements = diff.statements(&SqlServerLiterals);
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[2],
            "ALTER TABLE Users ADD CONSTRAINT DF_Users_CreatedAt DEFAULT 'CURRENT_TIMESTAMP' FOR CreatedAt;"
        );
    }

    #[test]
    fn test_diff_matching_defaults_are_not_drift() {
        // A typed model literal and the catalog's recovered text render alike.
        let mut desired = make_column("CreatedAt", "DATETIME");
        desired.default_value = Some(Literal::text("CURRENT_TIMESTAMP"));
        let mut live_col = make_column("CreatedAt", "DATETIME");
        live_col.default_value = Some(Literal::raw("'CURRENT_TIMESTAMP'"));

        let model = vec![make_table("Users", vec![desired])];
        let live = live_set(vec![make_table("Users", vec![live_col])]);

        assert!(diff_schemas(&model, &live, &SqlServerLiterals).is_empty());
    }

    #[test]
    fn test_diff_no_changes() {
        let columns = vec![make_column("Id", "INT"), make_column("Name", "NVARCHAR(MAX)")];
        let model = vec![make_table("Users", columns.clone())];
        let live = live_set(vec![make_table("Users", columns)]);

        assert!(diff_schemas(&model, &live, &SqlServerLiterals).is_empty());
    }

    #[test]
    fn test_diff_leaves_undeclared_tables_alone() {
        let model = vec![make_table("Users", vec![make_column("Id", "INT")])];
        let live = live_set(vec![
            make_table("Users", vec![make_column("Id", "INT")]),
            make_table("AuditLog", vec![make_column("Entry", "NVARCHAR(MAX)")]),
        ]);

        assert!(diff_schemas(&model, &live, &SqlServerLiterals).is_empty());
    }

    #[test]
    fn test_diff_table_names_are_case_sensitive() {
        let model = vec![make_table("Users", vec![make_column("Id", "INT")])];
        let live = live_set(vec![make_table("users", vec![make_column("Id", "INT")])]);

        let diff = diff_schemas(&model, &live, &SqlServerLiterals);
        assert_eq!(diff.len(), 1);
        assert!(matches!(&diff.changes[0], ChangeOperation::CreateTable(_)));
    }

    #[test]
    fn test_diff_ordering_is_deterministic() {
        // Across tables: model registry order. Within a table: alters/adds in
        // model column order, then drops in live column order.
        let model = vec![
            make_table("B", vec![make_column("Id", "INT")]),
            make_table(
                "A",
                vec![make_column("Id", "INT"), make_column("New", "INT")],
            ),
        ];
        let live = live_set(vec![make_table(
            "A",
            vec![
                make_column("Id", "INT"),
                make_column("Old1", "INT"),
                make_column("Old2", "INT"),
            ],
        )]);

        let diff = diff_schemas(&model, &live, &SqlServerLiterals);
        let summary: Vec<String> = diff.changes.iter().map(|c| c.to_string()).collect();
        assert_eq!(summary, vec!["+ table B", "+ A.New: INT", "- A.Old1", "- A.Old2"]);
    }
}
