#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("forms path {0} does not exist")]
    FormsPathMissing(String),

    #[error("form {form} not found")]
    NotFound {
        form: String,
        #[source]
        source: opendal::Error,
    },

    #[error("form {form} is not valid JSON")]
    Decode {
        form: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("form {form}: {reason}")]
    InvalidDescriptor { form: String, reason: String },

    #[error("the linked-to table '{table}' of form {form} is not in the backend or the list of forms")]
    UnresolvedReference { form: String, table: String },

    #[error("forms reference each other in a cycle: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    #[error("backend error while {context}")]
    Backend {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("field {0} is required")]
    RequiredFieldMissing(String),

    #[error("invalid config: {context}")]
    Config {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Storage(#[from] opendal::Error),
}

impl FormError {
    pub(crate) fn backend(context: impl Into<String>, source: anyhow::Error) -> Self {
        FormError::Backend {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn config(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        FormError::Config {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid(form: &str, reason: impl Into<String>) -> Self {
        FormError::InvalidDescriptor {
            form: form.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
