use crate::backend::{value_to_form_string, TableBackend};
use crate::dependency;
use crate::descriptor::{self, Form};
use crate::error::{FormError, Result};
use crate::render;
use crate::statement::{self, TableStatement};
use crate::store::FormStore;
use crate::submission::{self, SubmittedValues};
use std::collections::BTreeMap;

/// Descriptor store plus table backend; the entry point for request handlers.
pub struct FormsClient<B> {
    store: FormStore,
    backend: B,
}

impl<B: TableBackend> FormsClient<B> {
    /// Creates the tables of every form, referenced tables first.
    /// Must finish before any request is served.
    pub async fn init(store: FormStore, backend: B) -> Result<Self> {
        store.ensure_exists().await?;
        backend
            .ping()
            .await
            .map_err(|e| FormError::backend("pinging the backend", e))?;

        let client = Self::connect(store, backend);
        let forms = client.load_all().await?;
        let order = dependency::order(&forms, &client.backend).await?;
        tracing::info!(forms = forms.len(), order = ?order, "synchronizing form tables");
        dependency::sync_schemas(&forms, &order, &client.backend).await?;
        Ok(client)
    }

    /// Wraps an already initialized store and backend without touching tables.
    pub fn connect(store: FormStore, backend: B) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn list_forms(&self) -> Result<Vec<String>> {
        self.store.list_forms().await
    }

    pub async fn load_form(&self, form_name: &str) -> Result<Form> {
        let fields = self.store.load(form_name).await?;
        Ok(Form::new(form_name, fields))
    }

    pub async fn load_all(&self) -> Result<Vec<Form>> {
        let mut forms = Vec::new();
        for name in self.store.list_forms().await? {
            forms.push(self.load_form(&name).await?);
        }
        Ok(forms)
    }

    pub async fn statement(&self, form_name: &str) -> Result<TableStatement> {
        let form = self.load_form(form_name).await?;
        Ok(statement::build(&form.name, &form.fields))
    }

    pub async fn new_form(&self, form_name: &str) -> Result<String> {
        let form = self.load_form(form_name).await?;
        Ok(render::render_new(&form.fields))
    }

    pub async fn edit_form(&self, form_name: &str, row_id: i64) -> Result<String> {
        let form = self.load_form(form_name).await?;
        let row = self
            .backend
            .search_for_one(&form.name, row_id)
            .await
            .map_err(|e| FormError::backend(format!("reading row {} of {}", row_id, form.name), e))?;
        let values: BTreeMap<String, String> = row
            .iter()
            .map(|(k, v)| (k.clone(), value_to_form_string(v)))
            .collect();
        Ok(render::render_edit(&form.fields, &values))
    }

    pub async fn submitted_data<S>(
        &self,
        form_name: &str,
        submitted: &S,
    ) -> Result<BTreeMap<String, String>>
    where
        S: SubmittedValues + Sync + ?Sized,
    {
        let form = self.load_form(form_name).await?;
        submission::extract(&form.fields, submitted)
    }

    /// Extracts the submission and stores it as a new row; returns its id.
    pub async fn insert_submission<S>(&self, form_name: &str, submitted: &S) -> Result<i64>
    where
        S: SubmittedValues + Sync + ?Sized,
    {
        let data = self.submitted_data(form_name, submitted).await?;
        let table = descriptor::table_name(form_name);
        let id = self
            .backend
            .insert_row(table, &data)
            .await
            .map_err(|e| FormError::backend(format!("inserting into {}", table), e))?;
        tracing::debug!(table, id, "inserted submission");
        Ok(id)
    }

    pub async fn update_submission<S>(
        &self,
        form_name: &str,
        row_id: i64,
        submitted: &S,
    ) -> Result<()>
    where
        S: SubmittedValues + Sync + ?Sized,
    {
        let data = self.submitted_data(form_name, submitted).await?;
        let table = descriptor::table_name(form_name);
        self.backend
            .update_row(table, row_id, &data)
            .await
            .map_err(|e| FormError::backend(format!("updating row {} of {}", row_id, table), e))?;
        tracing::debug!(table, id = row_id, "updated submission");
        Ok(())
    }
}
