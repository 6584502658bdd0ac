// crates/data-console-store-sqlite/src/catalog.rs
// ============================================================================
// Module: Table Catalogue
// Description: Fixed table definitions and per-table column whitelists.
// Purpose: Provide the only source of identifiers used in generated SQL.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Every identifier the store writes into SQL text is a `&'static str` from
//! this catalogue. Each table has an `id` primary key, a set of writable
//! columns, and a timestamp column filled by `SQLite`.

// ============================================================================
// SECTION: Types
// ============================================================================

/// Storage class of a writable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free-form text; accepts any scalar.
    Text,
    /// Floating point; accepts numbers only.
    Real,
}

impl ColumnKind {
    /// Returns the `SQLite` column type.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Real => "REAL",
        }
    }
}

/// Writable column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name.
    pub name: &'static str,
    /// Storage class.
    pub kind: ColumnKind,
}

/// Table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name.
    pub name: &'static str,
    /// Writable columns in declaration order.
    pub columns: &'static [ColumnSpec],
    /// Column defaulted to the insertion time.
    pub timestamp_column: &'static str,
}

impl TableSpec {
    /// Looks up a writable column by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns the `CREATE TABLE IF NOT EXISTS` statement.
    #[must_use]
    pub fn create_statement(&self) -> String {
        let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for column in self.columns {
            columns.push(format!("{} {}", column.name, column.kind.sql_type()));
        }
        columns.push(format!("{} DATETIME DEFAULT CURRENT_TIMESTAMP", self.timestamp_column));
        format!("CREATE TABLE IF NOT EXISTS {} ({});", self.name, columns.join(", "))
    }

    /// Returns every readable column, starting with `id`.
    #[must_use]
    pub fn select_columns(&self) -> Vec<&'static str> {
        let mut names = vec!["id"];
        names.extend(self.columns.iter().map(|column| column.name));
        names.push(self.timestamp_column);
        names
    }
}

// ============================================================================
// SECTION: Catalogue
// ============================================================================

/// Tables known to the store.
pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "weather_logs",
        columns: &[
            ColumnSpec {
                name: "city",
                kind: ColumnKind::Text,
            },
            ColumnSpec {
                name: "temperature",
                kind: ColumnKind::Real,
            },
            ColumnSpec {
                name: "condition",
                kind: ColumnKind::Text,
            },
        ],
        timestamp_column: "timestamp",
    },
    TableSpec {
        name: "file_logs",
        columns: &[
            ColumnSpec {
                name: "filename",
                kind: ColumnKind::Text,
            },
            ColumnSpec {
                name: "action",
                kind: ColumnKind::Text,
            },
        ],
        timestamp_column: "timestamp",
    },
    TableSpec {
        name: "reports",
        columns: &[
            ColumnSpec {
                name: "report_name",
                kind: ColumnKind::Text,
            },
            ColumnSpec {
                name: "content",
                kind: ColumnKind::Text,
            },
        ],
        timestamp_column: "created_at",
    },
];

/// Looks up a table by exact name.
#[must_use]
pub fn table_spec(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|table| table.name == name)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::table_spec;

    #[test]
    fn create_statement_lists_catalog_columns() {
        let reports = table_spec("reports").map(super::TableSpec::create_statement);
        assert_eq!(
            reports.as_deref(),
            Some(
                "CREATE TABLE IF NOT EXISTS reports (id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 report_name TEXT, content TEXT, created_at DATETIME DEFAULT CURRENT_TIMESTAMP);"
            )
        );
    }

    #[test]
    fn lookups_are_case_sensitive() {
        assert!(table_spec("weather_logs").is_some());
        assert!(table_spec("Weather_Logs").is_none());
        assert!(table_spec("weather_logs").and_then(|table| table.column("City")).is_none());
    }
}
