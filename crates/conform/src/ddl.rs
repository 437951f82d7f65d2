//! DDL rendering: tables and standalone column clauses.

use conform_schema::dialect::DefaultLiteralPolicy;
use conform_schema::{ColumnDescription, TableDescription};

/// Render a complete `CREATE TABLE` statement, one clause per column in
/// declared order.
pub fn create_table_sql(table: &TableDescription, policy: &dyn DefaultLiteralPolicy) -> String {
    let clauses: Vec<String> = table
        .columns
        .iter()
        .map(|col| column_clause(col, policy))
        .collect();

    format!("CREATE TABLE {} (\n{}\n);", table.name, clauses.join(",\n"))
}

/// Render one column clause: `<name> <native-type>`, then `PRIMARY KEY`,
/// `UNIQUE`, `DEFAULT <literal>` and `CHECK (<predicate>)`, in that fixed
/// order. The clause is also usable standalone inside `ALTER TABLE ... ADD`
/// and `ALTER COLUMN` statements.
pub fn column_clause(column: &ColumnDescription, policy: &dyn DefaultLiteralPolicy) -> String {
    let mut clause = format!("{} {}", column.name, column.native_type);

    if column.is_primary_key {
        clause.push_str(" PRIMARY KEY");
    }

    if column.is_unique {
        clause.push_str(" UNIQUE");
    }

    if let Some(default) = &column.default_value {
        clause.push_str(&format!(" DEFAULT {}", policy.render(default)));
    }

    if let Some(check) = &column.check_constraint {
        clause.push_str(&format!(" CHECK ({})", check));
    }

    clause
}
