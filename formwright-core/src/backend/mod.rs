use crate::statement::TableStatement;
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub mod opendal;

pub use self::opendal::OpendalBackend;

/// A stored row: form columns plus `id`, `created_at` and `updated_at`.
pub type Row = Map<String, Value>;

/// Storage collaborator that owns table state.
#[allow(async_fn_in_trait)]
pub trait TableBackend {
    async fn ping(&self) -> Result<()>;

    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn create_or_update_table(&self, statement: &TableStatement) -> Result<()>;

    async fn insert_row(&self, table: &str, values: &BTreeMap<String, String>) -> Result<i64>;

    async fn update_row(&self, table: &str, id: i64, values: &BTreeMap<String, String>)
        -> Result<()>;

    async fn search_for_one(&self, table: &str, id: i64) -> Result<Row>;

    /// Deletes the row and, through `on_delete_delete` foreign keys, every row pointing at it.
    async fn delete_row(&self, table: &str, id: i64) -> Result<()>;
}

/// Renders a stored value the way a form input expects it.
pub fn value_to_form_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                f.to_string()
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_strings_for_stored_values() {
        assert_eq!(value_to_form_string(&json!(null)), "");
        assert_eq!(value_to_form_string(&json!(42)), "42");
        assert_eq!(value_to_form_string(&json!(2.5)), "2.5");
        assert_eq!(value_to_form_string(&json!("red;blue")), "red;blue");
    }
}
