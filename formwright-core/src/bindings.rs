use crate::backend::OpendalBackend;
use crate::client::FormsClient;
use crate::config::FormsConfig;
use crate::descriptor;
use crate::error::FormError;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashMap;
use std::error::Error as _;

// --- Helpers ---

fn error_message(err: &FormError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn to_py_err(err: FormError) -> PyErr {
    let message = error_message(&err);
    match err {
        FormError::RequiredFieldMissing(_)
        | FormError::InvalidDescriptor { .. }
        | FormError::Decode { .. }
        | FormError::Config { .. } => PyValueError::new_err(message),
        _ => PyRuntimeError::new_err(message),
    }
}

fn get_config(config: &Bound<'_, PyDict>) -> PyResult<FormsConfig> {
    let forms_uri: String = config
        .get_item("forms_uri")?
        .ok_or_else(|| PyValueError::new_err("Missing 'forms_uri' in config"))?
        .extract()?;
    let backend_uri: String = config
        .get_item("backend_uri")?
        .ok_or_else(|| PyValueError::new_err("Missing 'backend_uri' in config"))?
        .extract()?;

    let mut forms_config = FormsConfig::new(&forms_uri, &backend_uri);
    if let Some(path) = config.get_item("forms_path")? {
        forms_config.forms.path = path.extract()?;
    }
    if let Some(root) = config.get_item("backend_root")? {
        forms_config.backend.root = root.extract()?;
    }
    Ok(forms_config)
}

fn get_client(config: &Bound<'_, PyDict>) -> PyResult<FormsClient<OpendalBackend>> {
    let forms_config = get_config(config)?;
    let store = forms_config.form_store().map_err(to_py_err)?;
    let backend = forms_config.backend().map_err(to_py_err)?;
    Ok(FormsClient::connect(store, backend))
}

// --- Bindings ---

/// Creates or updates every form table; returns the form names.
#[pyfunction]
fn sync_forms<'a>(py: Python<'a>, config: Bound<'a, PyDict>) -> PyResult<Bound<'a, PyAny>> {
    let forms_config = get_config(&config)?;
    let store = forms_config.form_store().map_err(to_py_err)?;
    let backend = forms_config.backend().map_err(to_py_err)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let client = FormsClient::init(store, backend).await.map_err(to_py_err)?;
        let forms = client.list_forms().await.map_err(to_py_err)?;
        Ok(forms)
    })
}

#[pyfunction]
fn list_forms<'a>(py: Python<'a>, config: Bound<'a, PyDict>) -> PyResult<Bound<'a, PyAny>> {
    let client = get_client(&config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let forms = client.list_forms().await.map_err(to_py_err)?;
        Ok(forms)
    })
}

#[pyfunction]
fn list_field_types(py: Python<'_>) -> PyResult<Bound<'_, PyAny>> {
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        Ok(descriptor::list_field_types())
    })
}

#[pyfunction]
fn get_new_form<'a>(
    py: Python<'a>,
    config: Bound<'a, PyDict>,
    form_name: String,
) -> PyResult<Bound<'a, PyAny>> {
    let client = get_client(&config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let html = client.new_form(&form_name).await.map_err(to_py_err)?;
        Ok(html)
    })
}

#[pyfunction]
fn get_edit_form<'a>(
    py: Python<'a>,
    config: Bound<'a, PyDict>,
    form_name: String,
    row_id: i64,
) -> PyResult<Bound<'a, PyAny>> {
    let client = get_client(&config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let html = client
            .edit_form(&form_name, row_id)
            .await
            .map_err(to_py_err)?;
        Ok(html)
    })
}

/// `form_data` maps each submitted name to all of its values.
#[pyfunction]
fn get_submitted_data<'a>(
    py: Python<'a>,
    config: Bound<'a, PyDict>,
    form_name: String,
    form_data: HashMap<String, Vec<String>>,
) -> PyResult<Bound<'a, PyAny>> {
    let client = get_client(&config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let data = client
            .submitted_data(&form_name, &form_data)
            .await
            .map_err(to_py_err)?;
        Ok(data)
    })
}

#[pyfunction]
fn insert_submission<'a>(
    py: Python<'a>,
    config: Bound<'a, PyDict>,
    form_name: String,
    form_data: HashMap<String, Vec<String>>,
) -> PyResult<Bound<'a, PyAny>> {
    let client = get_client(&config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let id = client
            .insert_submission(&form_name, &form_data)
            .await
            .map_err(to_py_err)?;
        Ok(id)
    })
}

#[pyfunction]
fn update_submission<'a>(
    py: Python<'a>,
    config: Bound<'a, PyDict>,
    form_name: String,
    row_id: i64,
    form_data: HashMap<String, Vec<String>>,
) -> PyResult<Bound<'a, PyAny>> {
    let client = get_client(&config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        client
            .update_submission(&form_name, row_id, &form_data)
            .await
            .map_err(to_py_err)?;
        Ok(())
    })
}

/// A Python module implemented in Rust.
#[pymodule]
fn _formwright_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(sync_forms, m)?)?;
    m.add_function(wrap_pyfunction!(list_forms, m)?)?;
    m.add_function(wrap_pyfunction!(list_field_types, m)?)?;
    m.add_function(wrap_pyfunction!(get_new_form, m)?)?;
    m.add_function(wrap_pyfunction!(get_edit_form, m)?)?;
    m.add_function(wrap_pyfunction!(get_submitted_data, m)?)?;
    m.add_function(wrap_pyfunction!(insert_submission, m)?)?;
    m.add_function(wrap_pyfunction!(update_submission, m)?)?;
    Ok(())
}
