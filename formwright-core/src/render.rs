use crate::descriptor::{FieldDescriptor, FieldKind};
use std::collections::BTreeMap;
use std::fmt;

/// Values a `check` field counts as ticked.
const CHECKED_VALUES: &[&str] = &["on", "true", "yes"];

/// Separator used when a multi-select value is stored as one string.
pub const MULTI_VALUE_SEPARATOR: &str = ";";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Markup for an empty form. Hidden fields are left out.
pub fn render_new(fields: &[FieldDescriptor]) -> String {
    render(fields, None)
}

/// Markup for a form pre-filled with `values`, keyed by field name.
pub fn render_edit(fields: &[FieldDescriptor], values: &BTreeMap<String, String>) -> String {
    render(fields, Some(values))
}

fn render(fields: &[FieldDescriptor], values: Option<&BTreeMap<String, String>>) -> String {
    let mut html = String::new();
    for field in fields.iter().filter(|f| !f.is_hidden()) {
        let current = values.map(|v| v.get(&field.name).map(String::as_str).unwrap_or(""));
        html.push_str("<div>");
        html.push_str(&format!(
            "<div><label for='id_{}'>{}</label></div>",
            escape_html(&field.name),
            escape_html(&field.label)
        ));
        render_input(&mut html, field, current);
        html.push_str("</div>");
    }
    html
}

fn bound_attrs<T: fmt::Display>(min: &Option<T>, max: &Option<T>) -> String {
    let mut attrs = String::new();
    if let Some(min) = min {
        attrs.push_str(&format!(" min='{}'", min));
    }
    if let Some(max) = max {
        attrs.push_str(&format!(" max='{}'", max));
    }
    attrs
}

fn value_attr(current: Option<&str>) -> String {
    current
        .map(|v| format!(" value='{}'", escape_html(v)))
        .unwrap_or_default()
}

fn render_input(html: &mut String, field: &FieldDescriptor, current: Option<&str>) {
    let name = escape_html(&field.name);
    let required = if field.is_required() { " required" } else { "" };

    match &field.kind {
        FieldKind::Int { min, max, .. } => {
            html.push_str(&format!(
                "<input type='number' name='{0}' id='id_{0}'{1}{2}{3}/>",
                name,
                bound_attrs(min, max),
                value_attr(current),
                required
            ));
        }
        FieldKind::Float { min, max } => {
            html.push_str(&format!(
                "<input type='number' name='{0}' id='id_{0}'{1} step='0.0001'{2}{3}/>",
                name,
                bound_attrs(min, max),
                value_attr(current),
                required
            ));
        }
        FieldKind::String | FieldKind::Email | FieldKind::Date | FieldKind::Datetime => {
            let input_type = match field.kind {
                FieldKind::String => "text",
                FieldKind::Email => "email",
                FieldKind::Date => "date",
                _ => "datetime-local",
            };
            html.push_str(&format!(
                "<input type='{0}' name='{1}' id='id_{1}'{2}{3}/>",
                input_type,
                name,
                value_attr(current),
                required
            ));
        }
        FieldKind::Select { options } => {
            html.push_str(&format!("<select id='id_{0}' name='{0}'{1}>", name, required));
            for opt in options {
                let selected = if current == Some(opt.as_str()) {
                    " selected"
                } else {
                    ""
                };
                html.push_str(&format!(
                    "<option{}>{}</option>",
                    selected,
                    escape_html(opt)
                ));
            }
            html.push_str("</select>");
        }
        FieldKind::MultiDisplaySelect { options } => {
            let picked: Vec<&str> = current
                .map(|v| v.split(MULTI_VALUE_SEPARATOR).collect())
                .unwrap_or_default();
            render_choices(html, &name, "checkbox", options, |opt| {
                picked.iter().any(|p| *p == opt)
            });
        }
        FieldKind::SingleDisplaySelect { options } => {
            render_choices(html, &name, "radio", options, |opt| current == Some(opt));
        }
        FieldKind::Text => {
            html.push_str(&format!(
                "<textarea id='id_{0}' name='{0}'{1}>{2}</textarea>",
                name,
                required,
                escape_html(current.unwrap_or(""))
            ));
        }
        FieldKind::Check => {
            let checked = current.is_some_and(|v| CHECKED_VALUES.contains(&v));
            html.push_str(&format!(
                "<input type='checkbox' id='id_{0}' name='{0}'{1} /> {2}",
                name,
                if checked { " checked" } else { "" },
                escape_html(&field.label)
            ));
        }
    }
}

fn render_choices<F>(
    html: &mut String,
    name: &str,
    input_type: &str,
    options: &[String],
    is_on: F,
) where
    F: Fn(&str) -> bool,
{
    html.push_str("<div>");
    for (i, opt) in options.iter().enumerate() {
        let escaped = escape_html(opt);
        html.push_str(&format!(
            "<input type='{0}' id='id_{1}_{2}' name='{1}' value='{3}'{4} /> {3}",
            input_type,
            name,
            i,
            escaped,
            if is_on(opt) { " checked" } else { "" }
        ));
    }
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn bounds_are_only_emitted_when_set() {
        assert_eq!(bound_attrs::<i64>(&None, &None), "");
        assert_eq!(bound_attrs(&Some(1), &None), " min='1'");
        assert_eq!(bound_attrs(&Some(0.5), &Some(2.0)), " min='0.5' max='2'");
    }
}
