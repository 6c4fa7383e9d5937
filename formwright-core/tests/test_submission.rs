mod common;
use _formwright_core::descriptor::decode_descriptors;
use _formwright_core::submission::{extract, FormSubmission};
use _formwright_core::FormError;
use common::PEOPLE_FORM;
use std::collections::HashMap;

#[test]
fn test_submission_extracts_every_field() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let submitted = FormSubmission::new()
        .with("full_name", "Ada Lovelace")
        .with("age", "36")
        .with("colour", "blue")
        .with("unrelated", "ignored");

    let data = extract(&fields, &submitted)?;
    assert_eq!(data.len(), fields.len());
    assert_eq!(data["full_name"], "Ada Lovelace");
    assert_eq!(data["age"], "36");
    assert_eq!(data["colour"], "blue");
    assert_eq!(data["email"], "");
    assert_eq!(data["hobbies"], "");
    assert_eq!(data["internal_ref"], "");
    assert!(!data.contains_key("unrelated"));
    Ok(())
}

#[test]
fn test_submission_joins_multi_select_values() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let submitted = FormSubmission::from_urlencoded(
        b"full_name=Grace&age=45&hobbies=chess&hobbies=knitting&size=M&size=L",
    );

    assert!(!submitted.is_empty());
    let data = extract(&fields, &submitted)?;
    assert_eq!(data["hobbies"], "chess;knitting");
    // Only multi-selects collect repeated values.
    assert_eq!(data["size"], "M");
    Ok(())
}

#[test]
fn test_submission_required_field_missing() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;

    let empty = FormSubmission::from_urlencoded(b"");
    assert!(empty.is_empty());
    assert!(matches!(
        extract(&fields, &empty),
        Err(FormError::RequiredFieldMissing(_))
    ));

    let absent = FormSubmission::new().with("age", "3");
    match extract(&fields, &absent) {
        Err(FormError::RequiredFieldMissing(name)) => assert_eq!(name, "full_name"),
        other => panic!("expected RequiredFieldMissing, got {:?}", other),
    }

    let blank = FormSubmission::new().with("full_name", "Ada").with("age", "");
    let err = extract(&fields, &blank).unwrap_err();
    assert_eq!(err.to_string(), "field age is required");
    Ok(())
}

#[test]
fn test_submission_required_multi_select() -> anyhow::Result<()> {
    let json = r#"[{"name": "tags", "fieldtype": "multi_display_select", "select_options": "a\nb", "attributes": "required"}]"#;
    let fields = decode_descriptors("posts", json.as_bytes())?;

    assert!(matches!(
        extract(&fields, &FormSubmission::new()),
        Err(FormError::RequiredFieldMissing(_))
    ));
    let data = extract(&fields, &FormSubmission::new().with("tags", "b"))?;
    assert_eq!(data["tags"], "b");
    Ok(())
}

#[test]
fn test_submission_from_hash_map() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let mut form_data: HashMap<String, Vec<String>> = HashMap::new();
    form_data.insert("full_name".into(), vec!["Linus".into()]);
    form_data.insert("age".into(), vec!["54".into()]);
    form_data.insert("hobbies".into(), vec!["rowing".into(), "chess".into()]);

    let data = extract(&fields, &form_data)?;
    assert_eq!(data["full_name"], "Linus");
    assert_eq!(data["hobbies"], "rowing;chess");
    Ok(())
}
