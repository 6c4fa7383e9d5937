use _formwright_core::{FormStore, OpendalBackend};
use anyhow::Result;
use opendal::services::Memory;
use opendal::Operator;

#[allow(dead_code)]
pub const PEOPLE_FORM: &str = r#"[
    {"name": "full_name", "label": "Full name", "fieldtype": "string", "attributes": "required"},
    {"name": "email", "label": "Email", "fieldtype": "email"},
    {"name": "born", "label": "Born", "fieldtype": "date"},
    {"name": "last_seen", "label": "Last seen", "fieldtype": "datetime"},
    {"name": "age", "label": "Age", "fieldtype": "int", "min_value": "0", "max_value": "150", "attributes": "required"},
    {"name": "score", "label": "Score", "fieldtype": "float", "min_value": "0", "max_value": "10"},
    {"name": "bio", "label": "Bio", "fieldtype": "text"},
    {"name": "colour", "label": "Colour", "fieldtype": "select", "select_options": "red\ngreen\nblue"},
    {"name": "hobbies", "label": "Hobbies", "fieldtype": "multi_display_select", "select_options": "chess\nrowing\nknitting"},
    {"name": "size", "label": "Size", "fieldtype": "single_display_select", "select_options": "S\nM\nL"},
    {"name": "subscribed", "label": "Subscribed", "fieldtype": "check"},
    {"name": "internal_ref", "label": "Internal", "fieldtype": "string", "attributes": "hidden"}
]"#;

#[allow(dead_code)]
pub const PETS_FORM: &str = r#"[
    {"name": "pet_name", "label": "Pet name", "fieldtype": "string", "attributes": "required"},
    {"name": "owner", "label": "Owner", "fieldtype": "int", "linked_table": "people"}
]"#;

#[allow(dead_code)]
pub fn setup_operator() -> Result<Operator> {
    let builder = Memory::default();
    let op = Operator::new(builder)?.finish();
    Ok(op)
}

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub async fn write_form(op: &Operator, name: &str, json: &str) -> Result<()> {
    op.write(
        &format!("forms/{}.form.json", name),
        json.as_bytes().to_vec(),
    )
    .await?;
    Ok(())
}

#[allow(dead_code)]
pub fn setup_store_and_backend(op: &Operator) -> (FormStore, OpendalBackend) {
    (
        FormStore::new(op.clone(), "forms"),
        OpendalBackend::new(op.clone(), "tables"),
    )
}
