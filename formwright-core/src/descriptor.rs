use crate::error::{FormError, Result};
use crate::metadata;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;

/// Suffix of every descriptor file; the table name is the file name without it.
pub const FORM_FILE_SUFFIX: &str = ".form.json";

const REQUIRED_FLAG: &str = "required";
const HIDDEN_FLAG: &str = "hidden";

static FIELD_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn field_name_re() -> &'static Regex {
    FIELD_NAME_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name pattern"))
}

/// Accepts `users` or `users.form.json` and returns `users`.
pub fn table_name(form_name: &str) -> &str {
    form_name
        .strip_suffix(FORM_FILE_SUFFIX)
        .unwrap_or(form_name)
}

pub fn form_file_name(form_name: &str) -> String {
    format!("{}{}", table_name(form_name), FORM_FILE_SUFFIX)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub attributes: Attributes,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn is_required(&self) -> bool {
        self.attributes.required
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes.hidden
    }
}

/// Flags from the semicolon separated `attributes` string, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    pub required: bool,
    pub hidden: bool,
    flags: Vec<String>,
}

impl Attributes {
    pub fn parse(raw: &str) -> Self {
        let flags: Vec<String> = raw
            .split(';')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            required: flags.iter().any(|f| f == REQUIRED_FLAG),
            hidden: flags.iter().any(|f| f == HIDDEN_FLAG),
            flags,
        }
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Flags forwarded to the table schema. `hidden` only affects rendering.
    pub fn schema_flags(&self) -> Vec<String> {
        self.flags
            .iter()
            .filter(|flag| *flag != HIDDEN_FLAG)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Email,
    Date,
    Datetime,
    Int {
        min: Option<i64>,
        max: Option<i64>,
        linked_table: Option<String>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Text,
    Select {
        options: Vec<String>,
    },
    MultiDisplaySelect {
        options: Vec<String>,
    },
    SingleDisplaySelect {
        options: Vec<String>,
    },
    Check,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Email => "email",
            FieldKind::Date => "date",
            FieldKind::Datetime => "datetime",
            FieldKind::Int { .. } => "int",
            FieldKind::Float { .. } => "float",
            FieldKind::Text => "text",
            FieldKind::Select { .. } => "select",
            FieldKind::MultiDisplaySelect { .. } => "multi_display_select",
            FieldKind::SingleDisplaySelect { .. } => "single_display_select",
            FieldKind::Check => "check",
        }
    }

    pub fn linked_table(&self) -> Option<&str> {
        match self {
            FieldKind::Int {
                linked_table: Some(table),
                ..
            } => Some(table.as_str()),
            _ => None,
        }
    }
}

/// A named, ordered set of descriptors; maps 1:1 to a backend table.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Form {
    pub fn new(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: table_name(name).to_string(),
            fields,
        }
    }

    /// Distinct `linked_table` targets of the int fields, in field order.
    pub fn linked_tables(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for target in self.fields.iter().filter_map(|f| f.kind.linked_table()) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

pub fn list_field_types() -> Vec<String> {
    vec![
        "string".to_string(),
        "email".to_string(),
        "date".to_string(),
        "datetime".to_string(),
        "int".to_string(),
        "float".to_string(),
        "text".to_string(),
        "select".to_string(),
        "multi_display_select".to_string(),
        "single_display_select".to_string(),
        "check".to_string(),
    ]
}

/// One entry of a descriptor file as written on disk. Every value is a string;
/// numbers and booleans are tolerated and stringified.
#[derive(Deserialize, Debug, Default)]
struct RawFieldDescriptor {
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    label: String,
    #[serde(default, deserialize_with = "lenient_string")]
    fieldtype: String,
    #[serde(default, deserialize_with = "lenient_string")]
    attributes: String,
    #[serde(default, deserialize_with = "lenient_string")]
    select_options: String,
    #[serde(default, deserialize_with = "lenient_string")]
    min_value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    max_value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    linked_table: String,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string value, found {}",
            other
        ))),
    }
}

fn parse_bound<T: FromStr>(form: &str, field: &str, key: &str, raw: &str) -> Result<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>().map(Some).map_err(|_| {
        FormError::invalid(
            form,
            format!("field {} has a non-numeric {}: '{}'", field, key, raw),
        )
    })
}

fn parse_options(raw: &str) -> Vec<String> {
    raw.lines().map(str::to_string).collect()
}

impl RawFieldDescriptor {
    fn into_descriptor(self, form: &str) -> Result<FieldDescriptor> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FormError::invalid(form, "a field is missing its name"));
        }
        if !field_name_re().is_match(&name) {
            return Err(FormError::invalid(
                form,
                format!("field name '{}' is not a valid identifier", name),
            ));
        }
        if metadata::is_reserved_column(&name) {
            return Err(FormError::invalid(
                form,
                format!("field name '{}' is reserved for row metadata", name),
            ));
        }

        let kind = match self.fieldtype.trim() {
            "string" => FieldKind::String,
            "email" => FieldKind::Email,
            "date" => FieldKind::Date,
            "datetime" => FieldKind::Datetime,
            "int" => {
                let linked_table = table_name(self.linked_table.trim());
                FieldKind::Int {
                    min: parse_bound(form, &name, "min_value", &self.min_value)?,
                    max: parse_bound(form, &name, "max_value", &self.max_value)?,
                    linked_table: (!linked_table.is_empty()).then(|| linked_table.to_string()),
                }
            }
            "float" => FieldKind::Float {
                min: parse_bound(form, &name, "min_value", &self.min_value)?,
                max: parse_bound(form, &name, "max_value", &self.max_value)?,
            },
            "text" => FieldKind::Text,
            "select" => FieldKind::Select {
                options: parse_options(&self.select_options),
            },
            "multi_display_select" => FieldKind::MultiDisplaySelect {
                options: parse_options(&self.select_options),
            },
            "single_display_select" => FieldKind::SingleDisplaySelect {
                options: parse_options(&self.select_options),
            },
            "check" => FieldKind::Check,
            other => {
                return Err(FormError::invalid(
                    form,
                    format!("field {} has unknown fieldtype '{}'", name, other),
                ))
            }
        };

        if !self.linked_table.trim().is_empty() && kind.linked_table().is_none() {
            tracing::warn!(
                form,
                field = %name,
                "linked_table is only honoured on int fields; ignoring it"
            );
        }

        let label = if self.label.is_empty() {
            name.clone()
        } else {
            self.label
        };

        Ok(FieldDescriptor {
            name,
            label,
            attributes: Attributes::parse(&self.attributes),
            kind,
        })
    }
}

/// Decodes the JSON array stored in a descriptor file.
pub fn decode_descriptors(form_name: &str, bytes: &[u8]) -> Result<Vec<FieldDescriptor>> {
    let form = table_name(form_name);
    let raw: Vec<RawFieldDescriptor> =
        serde_json::from_slice(bytes).map_err(|source| FormError::Decode {
            form: form.to_string(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(raw.len());
    for entry in raw {
        let descriptor = entry.into_descriptor(form)?;
        if !seen.insert(descriptor.name.clone()) {
            return Err(FormError::invalid(
                form,
                format!("field {} is defined more than once", descriptor.name),
            ));
        }
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}
