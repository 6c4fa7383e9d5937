use super::{Row, TableBackend};
use crate::metadata::{self, CREATED_AT_COLUMN, ROW_ID_COLUMN, UPDATED_AT_COLUMN};
use crate::statement::{StorageType, TableStatement};
use crate::storage;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use opendal::Operator;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tokio::sync::OwnedMutexGuard;

const CATALOG_FILE: &str = "catalog.json";
const SCHEMA_FILE: &str = "schema.json";
const ROWS_FILE: &str = "rows.json";

static TABLE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn table_name_re() -> &'static Regex {
    TABLE_NAME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid table name pattern"))
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Catalog {
    #[serde(default)]
    tables: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct TableData {
    next_id: i64,
    #[serde(default)]
    rows: BTreeMap<i64, Row>,
}

impl Default for TableData {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// Table backend keeping schemas and rows as JSON documents in an object store.
///
/// Layout under `root`: `catalog.json`, `<table>/schema.json`, `<table>/rows.json`.
/// Writes go through one lock per operator and root, so separate handles over
/// the same store never interleave their read-modify-write cycles.
#[derive(Clone, Debug)]
pub struct OpendalBackend {
    op: Operator,
    root: String,
}

impl OpendalBackend {
    pub fn new(op: Operator, root: &str) -> Self {
        let trimmed = root.trim_matches('/');
        let root = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        };
        Self { op, root }
    }

    async fn lock_writes(&self) -> Result<OwnedMutexGuard<()>> {
        storage::lock_writes(&self.op, &self.root).await
    }

    fn catalog_path(&self) -> String {
        format!("{}{}", self.root, CATALOG_FILE)
    }

    fn schema_path(&self, table: &str) -> String {
        format!("{}{}/{}", self.root, table, SCHEMA_FILE)
    }

    fn rows_path(&self, table: &str) -> String {
        format!("{}{}/{}", self.root, table, ROWS_FILE)
    }

    async fn read_catalog(&self) -> Result<Catalog> {
        let path = self.catalog_path();
        if !self.op.exists(&path).await? {
            return Ok(Catalog::default());
        }
        let bytes = self.op.read(&path).await?;
        let catalog = serde_json::from_slice(&bytes.to_vec()).context("corrupt table catalog")?;
        Ok(catalog)
    }

    async fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        self.op
            .write(&self.catalog_path(), serde_json::to_vec_pretty(catalog)?)
            .await?;
        Ok(())
    }

    async fn load_schema(&self, table: &str) -> Result<TableStatement> {
        let path = self.schema_path(table);
        if !self.op.exists(&path).await? {
            return Err(anyhow!("table {} does not exist", table));
        }
        let bytes = self.op.read(&path).await?;
        let schema = serde_json::from_slice(&bytes.to_vec())
            .with_context(|| format!("corrupt schema for table {}", table))?;
        Ok(schema)
    }

    async fn read_rows(&self, table: &str) -> Result<TableData> {
        let path = self.rows_path(table);
        if !self.op.exists(&path).await? {
            return Ok(TableData::default());
        }
        let bytes = self.op.read(&path).await?;
        let data = serde_json::from_slice(&bytes.to_vec())
            .with_context(|| format!("corrupt rows for table {}", table))?;
        Ok(data)
    }

    async fn write_rows(&self, table: &str, data: &TableData) -> Result<()> {
        self.op
            .write(&self.rows_path(table), serde_json::to_vec_pretty(data)?)
            .await?;
        Ok(())
    }

    async fn check_foreign_keys(&self, schema: &TableStatement, row: &Row) -> Result<()> {
        for fk in &schema.foreign_keys {
            let Some(Value::Number(target_id)) = row.get(&fk.column) else {
                continue;
            };
            let target_id = target_id
                .as_i64()
                .ok_or_else(|| anyhow!("column {} must hold a row id", fk.column))?;
            let target = self.read_rows(&fk.table).await?;
            if !target.rows.contains_key(&target_id) {
                return Err(anyhow!(
                    "column {} references missing row {} in table {}",
                    fk.column,
                    target_id,
                    fk.table
                ));
            }
        }
        Ok(())
    }
}

fn coerce_value(schema: &TableStatement, column: &str, raw: &str) -> Result<Value> {
    let entry = schema
        .column(column)
        .ok_or_else(|| anyhow!("table {} has no column {}", schema.table, column))?;
    let trimmed = raw.trim();
    let value = match entry.storage_type {
        StorageType::Int if trimmed.is_empty() => Value::Null,
        StorageType::Int => Value::from(
            trimmed
                .parse::<i64>()
                .with_context(|| format!("column {} expects an integer, got '{}'", column, raw))?,
        ),
        StorageType::Float if trimmed.is_empty() => Value::Null,
        StorageType::Float => {
            let parsed = trimmed
                .parse::<f64>()
                .with_context(|| format!("column {} expects a float, got '{}'", column, raw))?;
            Value::Number(
                Number::from_f64(parsed)
                    .ok_or_else(|| anyhow!("column {} cannot store {}", column, raw))?,
            )
        }
        StorageType::String | StorageType::Text => Value::String(raw.to_string()),
    };
    Ok(value)
}

fn check_required(schema: &TableStatement, row: &Row) -> Result<()> {
    for column in schema.fields.iter().filter(|c| c.is_required()) {
        let present = match row.get(&column.name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(anyhow!(
                "column {} of table {} is required",
                column.name,
                schema.table
            ));
        }
    }
    Ok(())
}

fn apply_values(
    schema: &TableStatement,
    row: &mut Row,
    values: &BTreeMap<String, String>,
) -> Result<()> {
    for (column, raw) in values {
        if metadata::is_reserved_column(column) {
            return Err(anyhow!("column {} is managed by the backend", column));
        }
        row.insert(column.clone(), coerce_value(schema, column, raw)?);
    }
    Ok(())
}

impl TableBackend for OpendalBackend {
    async fn ping(&self) -> Result<()> {
        self.op.check().await.context("storage is unreachable")?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.read_catalog().await?.tables)
    }

    async fn create_or_update_table(&self, statement: &TableStatement) -> Result<()> {
        if !table_name_re().is_match(&statement.table) {
            return Err(anyhow!("invalid table name '{}'", statement.table));
        }
        for column in &statement.fields {
            if metadata::is_reserved_column(&column.name) {
                return Err(anyhow!(
                    "column {} of table {} is reserved",
                    column.name,
                    statement.table
                ));
            }
        }

        let _writes = self.lock_writes().await?;
        let mut catalog = self.read_catalog().await?;
        for fk in &statement.foreign_keys {
            if statement.column(&fk.column).is_none() {
                return Err(anyhow!(
                    "foreign key {} is not a column of table {}",
                    fk.column,
                    statement.table
                ));
            }
            if fk.table != statement.table && !catalog.tables.contains(&fk.table) {
                return Err(anyhow!(
                    "foreign key {} of table {} points at missing table {}",
                    fk.column,
                    statement.table,
                    fk.table
                ));
            }
        }

        self.op
            .write(
                &self.schema_path(&statement.table),
                serde_json::to_vec_pretty(statement)?,
            )
            .await?;

        if !catalog.tables.contains(&statement.table) {
            catalog.tables.push(statement.table.clone());
            self.write_catalog(&catalog).await?;
            tracing::debug!(table = %statement.table, "created table");
        } else {
            tracing::debug!(table = %statement.table, "updated table");
        }
        Ok(())
    }

    async fn insert_row(&self, table: &str, values: &BTreeMap<String, String>) -> Result<i64> {
        let _writes = self.lock_writes().await?;
        let schema = self.load_schema(table).await?;
        let mut row = Row::new();
        apply_values(&schema, &mut row, values)?;
        check_required(&schema, &row)?;
        self.check_foreign_keys(&schema, &row).await?;

        let mut data = self.read_rows(table).await?;
        let id = data.next_id;
        let now = Utc::now().to_rfc3339();
        row.insert(ROW_ID_COLUMN.to_string(), Value::from(id));
        row.insert(CREATED_AT_COLUMN.to_string(), Value::String(now.clone()));
        row.insert(UPDATED_AT_COLUMN.to_string(), Value::String(now));
        data.rows.insert(id, row);
        data.next_id = id + 1;
        self.write_rows(table, &data).await?;
        Ok(id)
    }

    async fn update_row(
        &self,
        table: &str,
        id: i64,
        values: &BTreeMap<String, String>,
    ) -> Result<()> {
        let _writes = self.lock_writes().await?;
        let schema = self.load_schema(table).await?;
        let mut data = self.read_rows(table).await?;
        let mut row = data
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("row {} not found in table {}", id, table))?;
        apply_values(&schema, &mut row, values)?;
        check_required(&schema, &row)?;
        self.check_foreign_keys(&schema, &row).await?;

        row.insert(
            UPDATED_AT_COLUMN.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        data.rows.insert(id, row);
        self.write_rows(table, &data).await?;
        Ok(())
    }

    async fn search_for_one(&self, table: &str, id: i64) -> Result<Row> {
        self.load_schema(table).await?;
        let mut data = self.read_rows(table).await?;
        data.rows
            .remove(&id)
            .ok_or_else(|| anyhow!("row {} not found in table {}", id, table))
    }

    async fn delete_row(&self, table: &str, id: i64) -> Result<()> {
        let _writes = self.lock_writes().await?;
        self.load_schema(table).await?;
        let mut schemas = Vec::new();
        for name in self.read_catalog().await?.tables {
            schemas.push(self.load_schema(&name).await?);
        }

        let mut pending = vec![(table.to_string(), id)];
        let mut first = true;
        while let Some((current, current_id)) = pending.pop() {
            let mut data = self.read_rows(&current).await?;
            if data.rows.remove(&current_id).is_none() {
                if first {
                    return Err(anyhow!("row {} not found in table {}", current_id, current));
                }
                continue;
            }
            first = false;
            self.write_rows(&current, &data).await?;

            for schema in &schemas {
                for fk in schema.foreign_keys.iter().filter(|fk| fk.table == current) {
                    let children = self.read_rows(&schema.table).await?;
                    for (child_id, child) in &children.rows {
                        if child.get(&fk.column).and_then(Value::as_i64) == Some(current_id) {
                            tracing::debug!(
                                table = %schema.table,
                                id = child_id,
                                "cascading delete"
                            );
                            pending.push((schema.table.clone(), *child_id));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
