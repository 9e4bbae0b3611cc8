use std::collections::HashMap;
use std::fmt;

/// one row of `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
}

/// one row of the foreign key join over the constraint views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogForeignKey {
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// data type exactly as reported by the catalog
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub column: String,
    pub references: ColumnRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub relations: Vec<ForeignKeyRef>,
}

impl fmt::Display for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "Table '{}' in schema '{}' has columns: {}.",
            self.name, self.schema, columns
        )?;

        if !self.relations.is_empty() {
            write!(f, "\nIt has foreign key relations:")?;
            for rel in &self.relations {
                write!(
                    f,
                    "\n- {} => {}.{}.{}",
                    rel.column, rel.references.schema, rel.references.table, rel.references.column
                )?;
            }
        }

        Ok(())
    }
}

/// tables, columns and foreign keys of the introspected schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDocument {
    tables: Vec<TableInfo>,
}

impl SchemaDocument {
    /// group catalog rows into tables and attach foreign keys to their source table.
    /// tables appear in first-seen order, columns in row order. foreign keys whose
    /// source table was not introspected are dropped.
    pub fn from_catalog<C, K>(columns: C, foreign_keys: K) -> Self
    where
        C: IntoIterator<Item = CatalogColumn>,
        K: IntoIterator<Item = CatalogForeignKey>,
    {
        let mut tables: Vec<TableInfo> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for row in columns {
            let key = (row.schema.clone(), row.table.clone());
            let column = ColumnInfo {
                name: row.column,
                data_type: row.data_type,
            };

            match index.get(&key) {
                Some(&idx) => tables[idx].columns.push(column),
                None => {
                    index.insert(key, tables.len());
                    tables.push(TableInfo {
                        schema: row.schema,
                        name: row.table,
                        columns: vec![column],
                        relations: Vec::new(),
                    });
                }
            }
        }

        for fk in foreign_keys {
            let key = (fk.source_schema, fk.source_table);
            let Some(&idx) = index.get(&key) else {
                tracing::debug!(
                    "dropping foreign key on unknown table {}.{}",
                    key.0,
                    key.1
                );
                continue;
            };

            tables[idx].relations.push(ForeignKeyRef {
                column: fk.source_column,
                references: ColumnRef {
                    schema: fk.target_schema,
                    table: fk.target_table,
                    column: fk.target_column,
                },
            });
        }

        Self { tables }
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn table(&self, schema: &str, name: &str) -> Option<&TableInfo> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// text form embedded in the sql generation prompt
    pub fn to_prompt_text(&self) -> String {
        self.tables
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
