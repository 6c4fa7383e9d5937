use crate::descriptor::{self, FieldDescriptor, FieldKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    String,
    Int,
    Text,
    Float,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::String => "string",
            StorageType::Int => "int",
            StorageType::Text => "text",
            StorageType::Float => "float",
        }
    }

    pub fn for_field(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Email
            | FieldKind::Select { .. }
            | FieldKind::String
            | FieldKind::Date
            | FieldKind::Datetime
            | FieldKind::MultiDisplaySelect { .. }
            | FieldKind::SingleDisplaySelect { .. }
            | FieldKind::Check => StorageType::String,
            FieldKind::Int { .. } => StorageType::Int,
            FieldKind::Text => StorageType::Text,
            FieldKind::Float { .. } => StorageType::Float,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    #[default]
    Delete,
}

impl OnDelete {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDelete::Delete => "on_delete_delete",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnEntry {
    pub name: String,
    pub storage_type: StorageType,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl ColumnEntry {
    pub fn is_required(&self) -> bool {
        self.attributes.iter().any(|a| a == "required")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub table: String,
    #[serde(default)]
    pub on_delete: OnDelete,
}

/// Create-or-update request for one backend table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableStatement {
    pub table: String,
    pub fields: Vec<ColumnEntry>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableStatement {
    pub fn column(&self, name: &str) -> Option<&ColumnEntry> {
        self.fields.iter().find(|c| c.name == name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

impl fmt::Display for TableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "table: {}", self.table)?;
        writeln!(f, "fields:")?;
        for column in &self.fields {
            write!(f, "{} {}", column.name, column.storage_type.as_str())?;
            for attr in &column.attributes {
                write!(f, " {}", attr)?;
            }
            writeln!(f)?;
        }
        write!(f, "::")?;
        if !self.foreign_keys.is_empty() {
            writeln!(f)?;
            writeln!(f, "foreign_keys:")?;
            for fk in &self.foreign_keys {
                writeln!(f, "{} {} {}", fk.column, fk.table, fk.on_delete.as_str())?;
            }
            write!(f, "::")?;
        }
        Ok(())
    }
}

pub fn build(form_name: &str, descriptors: &[FieldDescriptor]) -> TableStatement {
    let mut fields = Vec::with_capacity(descriptors.len());
    let mut foreign_keys = Vec::new();

    for field in descriptors {
        if let Some(target) = field.kind.linked_table() {
            foreign_keys.push(ForeignKey {
                column: field.name.clone(),
                table: target.to_string(),
                on_delete: OnDelete::Delete,
            });
        }
        fields.push(ColumnEntry {
            name: field.name.clone(),
            storage_type: StorageType::for_field(&field.kind),
            attributes: field.attributes.schema_flags(),
        });
    }

    TableStatement {
        table: descriptor::table_name(form_name).to_string(),
        fields,
        foreign_keys,
    }
}
