use crate::backend::TableBackend;
use crate::descriptor::Form;
use crate::error::{FormError, Result};
use crate::statement;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Pending,
    Active,
    Done,
}

/// Creation order for `forms`: every referenced local table comes before the
/// tables referencing it. Targets that are not local forms must already exist
/// in the backend.
pub async fn order<B: TableBackend>(forms: &[Form], backend: &B) -> Result<Vec<String>> {
    let local: HashSet<&str> = forms.iter().map(|f| f.name.as_str()).collect();
    let mut backend_tables: Option<Vec<String>> = None;

    for form in forms {
        for target in form.linked_tables() {
            if local.contains(target) {
                continue;
            }
            if backend_tables.is_none() {
                let tables = backend
                    .list_tables()
                    .await
                    .map_err(|e| FormError::backend("listing tables", e))?;
                backend_tables = Some(tables);
            }
            let known = backend_tables
                .as_ref()
                .is_some_and(|tables| tables.iter().any(|t| t == target));
            if !known {
                return Err(FormError::UnresolvedReference {
                    form: form.name.clone(),
                    table: target.to_string(),
                });
            }
            tracing::debug!(form = %form.name, table = target, "link resolved in backend");
        }
    }

    topological_order(forms)
}

/// Depth-first topological sort over local links, leaves first. Ties keep the
/// order of `forms`. Links to tables outside `forms` are ignored here.
pub fn topological_order(forms: &[Form]) -> Result<Vec<String>> {
    let index: HashMap<&str, usize> = forms
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.as_str(), i))
        .collect();
    let mut state = vec![Visit::Pending; forms.len()];
    let mut stack = Vec::new();
    let mut ordered = Vec::with_capacity(forms.len());

    for i in 0..forms.len() {
        visit(i, forms, &index, &mut state, &mut stack, &mut ordered)?;
    }
    Ok(ordered)
}

fn visit(
    i: usize,
    forms: &[Form],
    index: &HashMap<&str, usize>,
    state: &mut [Visit],
    stack: &mut Vec<usize>,
    ordered: &mut Vec<String>,
) -> Result<()> {
    match state[i] {
        Visit::Done => return Ok(()),
        Visit::Active => {
            let start = stack.iter().position(|&s| s == i).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..]
                .iter()
                .map(|&s| forms[s].name.clone())
                .collect();
            cycle.push(forms[i].name.clone());
            return Err(FormError::CyclicReference(cycle));
        }
        Visit::Pending => {}
    }

    state[i] = Visit::Active;
    stack.push(i);
    for target in forms[i].linked_tables() {
        match index.get(target) {
            // A self link needs no ordering.
            Some(&j) if j != i => visit(j, forms, index, state, stack, ordered)?,
            _ => {}
        }
    }
    stack.pop();
    state[i] = Visit::Done;
    ordered.push(forms[i].name.clone());
    Ok(())
}

/// Issues create-or-update for each table in `order`. Stops at the first
/// backend failure; tables created before it stay created.
pub async fn sync_schemas<B: TableBackend>(
    forms: &[Form],
    order: &[String],
    backend: &B,
) -> Result<()> {
    for table in order {
        let Some(form) = forms.iter().find(|f| &f.name == table) else {
            continue;
        };
        let statement = statement::build(&form.name, &form.fields);
        backend
            .create_or_update_table(&statement)
            .await
            .map_err(|e| FormError::backend(format!("creating table {}", table), e))?;
        tracing::info!(table = %table, columns = statement.fields.len(), "table schema synchronized");
    }
    Ok(())
}
