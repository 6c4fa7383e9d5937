use crate::descriptor::{self, FieldDescriptor, FORM_FILE_SUFFIX};
use crate::error::{FormError, Result};
use futures::TryStreamExt;
use opendal::{EntryMode, ErrorKind, Operator};

/// Descriptor files living under one directory of an operator.
///
/// Nothing is cached: every `load` reads the file again.
#[derive(Clone, Debug)]
pub struct FormStore {
    op: Operator,
    forms_path: String,
}

impl FormStore {
    pub fn new(op: Operator, forms_path: &str) -> Self {
        let trimmed = forms_path.trim_matches('/');
        let forms_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        };
        Self { op, forms_path }
    }

    pub fn forms_path(&self) -> &str {
        &self.forms_path
    }

    fn form_path(&self, form_name: &str) -> String {
        format!(
            "{}{}",
            self.forms_path,
            descriptor::form_file_name(form_name)
        )
    }

    pub async fn ensure_exists(&self) -> Result<()> {
        if self.forms_path.is_empty() || self.op.exists(&self.forms_path).await? {
            return Ok(());
        }
        Err(FormError::FormsPathMissing(self.forms_path.clone()))
    }

    pub async fn load(&self, form_name: &str) -> Result<Vec<FieldDescriptor>> {
        let path = self.form_path(form_name);
        tracing::debug!(path = %path, "loading form descriptors");
        let bytes = self.op.read(&path).await.map_err(|source| FormError::NotFound {
            form: descriptor::table_name(form_name).to_string(),
            source,
        })?;
        descriptor::decode_descriptors(form_name, &bytes.to_vec())
    }

    pub async fn save_raw(&self, form_name: &str, content: &[u8]) -> Result<()> {
        self.op
            .write(&self.form_path(form_name), content.to_vec())
            .await?;
        Ok(())
    }

    /// Form names (suffix stripped) of every descriptor file, sorted.
    pub async fn list_forms(&self) -> Result<Vec<String>> {
        let mut lister = match self.op.lister(&self.forms_path).await {
            Ok(lister) => lister,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(err.into()),
        };

        let mut forms = Vec::new();
        while let Some(entry) = lister.try_next().await? {
            if entry.metadata().mode() != EntryMode::FILE {
                continue;
            }
            let file_name = entry.name().rsplit('/').next().unwrap_or(entry.name());
            match file_name.strip_suffix(FORM_FILE_SUFFIX) {
                Some(form) if !form.is_empty() => forms.push(form.to_string()),
                _ => tracing::debug!(file = %file_name, "skipping non-form file"),
            }
        }
        forms.sort();
        forms.dedup();
        Ok(forms)
    }
}
