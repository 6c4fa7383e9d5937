use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::error::{FormError, Result};
use crate::render::MULTI_VALUE_SEPARATOR;
use std::collections::{BTreeMap, HashMap};

/// Read access to the values of a submitted request, by field name.
pub trait SubmittedValues {
    /// First value submitted under `name`.
    fn value(&self, name: &str) -> Option<&str>;

    /// Every value submitted under `name`, in submission order.
    fn values(&self, name: &str) -> Vec<&str>;
}

impl SubmittedValues for HashMap<String, Vec<String>> {
    fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    fn values(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Name/value pairs of an `application/x-www-form-urlencoded` body. Repeated
/// names are kept, which is how checkbox groups arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSubmission {
    pairs: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_urlencoded(body: &[u8]) -> Self {
        url::form_urlencoded::parse(body).into_owned().collect()
    }

    pub fn push(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.push(name, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for FormSubmission {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl SubmittedValues for FormSubmission {
    fn value(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn values(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Flat field-name to value mapping for persistence. Multi-selects are joined
/// with `;`; absent optional fields become empty strings.
pub fn extract<S>(fields: &[FieldDescriptor], submitted: &S) -> Result<BTreeMap<String, String>>
where
    S: SubmittedValues + ?Sized,
{
    let mut data = BTreeMap::new();
    for field in fields {
        let value = match field.kind {
            FieldKind::MultiDisplaySelect { .. } => submitted
                .values(&field.name)
                .join(MULTI_VALUE_SEPARATOR),
            _ => submitted.value(&field.name).unwrap_or("").to_string(),
        };
        if field.is_required() && value.is_empty() {
            return Err(FormError::RequiredFieldMissing(field.name.clone()));
        }
        data.insert(field.name.clone(), value);
    }
    Ok(data)
}
