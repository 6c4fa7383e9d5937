mod common;
use _formwright_core::descriptor::decode_descriptors;
use _formwright_core::render::{render_edit, render_new};
use _formwright_core::submission::{self, FormSubmission};
use common::PEOPLE_FORM;
use std::collections::BTreeMap;

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_render_new_number_input_with_bounds() -> anyhow::Result<()> {
    let json = r#"[{"name": "age", "label": "Age", "fieldtype": "int", "min_value": "0", "max_value": "150", "attributes": "required"}]"#;
    let fields = decode_descriptors("people", json.as_bytes())?;
    assert_eq!(
        render_new(&fields),
        "<div><div><label for='id_age'>Age</label></div>\
         <input type='number' name='age' id='id_age' min='0' max='150' required/></div>"
    );
    Ok(())
}

#[test]
fn test_render_new_float_input_has_step() -> anyhow::Result<()> {
    let json = r#"[{"name": "score", "label": "Score", "fieldtype": "float", "max_value": "9.5"}]"#;
    let fields = decode_descriptors("people", json.as_bytes())?;
    let html = render_new(&fields);
    assert!(html.contains("<input type='number' name='score' id='id_score' max='9.5' step='0.0001'/>"));
    assert!(!html.contains("min="));
    Ok(())
}

#[test]
fn test_render_new_covers_every_visible_field() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let html = render_new(&fields);

    assert!(html.contains("<input type='text' name='full_name' id='id_full_name' required/>"));
    assert!(html.contains("<input type='email' name='email' id='id_email'/>"));
    assert!(html.contains("<input type='date' name='born' id='id_born'/>"));
    assert!(html.contains("<input type='datetime-local' name='last_seen' id='id_last_seen'/>"));
    assert!(html.contains("<textarea id='id_bio' name='bio'></textarea>"));
    assert!(html.contains(
        "<select id='id_colour' name='colour'><option>red</option><option>green</option>\
         <option>blue</option></select>"
    ));
    assert!(html.contains(
        "<input type='checkbox' id='id_hobbies_1' name='hobbies' value='rowing' /> rowing"
    ));
    assert!(html.contains("<input type='radio' id='id_size_2' name='size' value='L' /> L"));
    assert!(html.contains("<input type='checkbox' id='id_subscribed' name='subscribed' /> Subscribed"));
    assert!(!html.contains("internal_ref"));
    assert_eq!(html.matches("<label for=").count(), fields.len() - 1);
    Ok(())
}

#[test]
fn test_render_edit_prefills_values() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let html = render_edit(
        &fields,
        &values(&[
            ("full_name", "Ada"),
            ("age", "36"),
            ("bio", "Counts things."),
            ("colour", "green"),
            ("size", "M"),
        ]),
    );

    assert!(html.contains("name='full_name' id='id_full_name' value='Ada' required/>"));
    assert!(html.contains("id='id_age' min='0' max='150' value='36' required/>"));
    assert!(html.contains("<textarea id='id_bio' name='bio'>Counts things.</textarea>"));
    assert!(html.contains("<option>red</option><option selected>green</option>"));
    assert!(html.contains("id='id_size_1' name='size' value='M' checked /> M"));
    assert!(html.contains("id='id_size_0' name='size' value='S' /> S"));
    // Absent values still render an empty value attribute.
    assert!(html.contains("<input type='email' name='email' id='id_email' value=''/>"));
    Ok(())
}

#[test]
fn test_render_edit_check_box_truthy_values() -> anyhow::Result<()> {
    let json = r#"[{"name": "ok", "label": "OK", "fieldtype": "check"}]"#;
    let fields = decode_descriptors("flags", json.as_bytes())?;

    for on in ["on", "true", "yes"] {
        let html = render_edit(&fields, &values(&[("ok", on)]));
        assert!(html.contains("name='ok' checked />"), "{} should tick the box", on);
    }
    for off in ["no", "", "0"] {
        let html = render_edit(&fields, &values(&[("ok", off)]));
        assert!(!html.contains("checked"), "{} should leave the box clear", off);
    }
    Ok(())
}

#[test]
fn test_render_edit_multi_select_ticks_each_stored_value() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let html = render_edit(&fields, &values(&[("hobbies", "chess;knitting")]));

    assert!(html.contains("id='id_hobbies_0' name='hobbies' value='chess' checked />"));
    assert!(html.contains("id='id_hobbies_1' name='hobbies' value='rowing' />"));
    assert!(html.contains("id='id_hobbies_2' name='hobbies' value='knitting' checked />"));
    Ok(())
}

#[test]
fn test_render_escapes_labels_options_and_values() -> anyhow::Result<()> {
    let json = r#"[
        {"name": "note", "label": "<b>Note</b>", "fieldtype": "string"},
        {"name": "pick", "label": "Pick", "fieldtype": "select", "select_options": "a&b\n'quoted'"}
    ]"#;
    let fields = decode_descriptors("misc", json.as_bytes())?;
    let html = render_edit(&fields, &values(&[("note", "x' onfocus='alert(1)")]));

    assert!(html.contains("<label for='id_note'>&lt;b&gt;Note&lt;/b&gt;</label>"));
    assert!(html.contains("value='x&#39; onfocus=&#39;alert(1)'"));
    assert!(html.contains("<option>a&amp;b</option><option>&#39;quoted&#39;</option>"));
    assert!(!html.contains("<b>"));
    Ok(())
}

#[test]
fn test_render_edit_round_trips_extracted_submission() -> anyhow::Result<()> {
    let fields = decode_descriptors("people", PEOPLE_FORM.as_bytes())?;
    let submitted = FormSubmission::new()
        .with("full_name", "Grace")
        .with("age", "45")
        .with("hobbies", "chess")
        .with("hobbies", "rowing")
        .with("size", "S")
        .with("subscribed", "on");
    let stored = submission::extract(&fields, &submitted)?;

    let html = render_edit(&fields, &stored);
    assert!(html.contains("value='Grace'"));
    assert!(html.contains("value='45'"));
    assert!(html.contains("value='chess' checked"));
    assert!(html.contains("value='rowing' checked"));
    assert!(html.contains("value='knitting' />"));
    assert!(html.contains("value='S' checked"));
    assert!(html.contains("name='subscribed' checked"));
    Ok(())
}
