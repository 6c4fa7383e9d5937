use anyhow::{anyhow, Context, Result};
use opendal::Operator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Process-wide map from a string key to a shared handle, filled on first use.
struct Registry<T> {
    entries: OnceLock<Mutex<HashMap<String, T>>>,
}

impl<T: Clone> Registry<T> {
    const fn new() -> Self {
        Self {
            entries: OnceLock::new(),
        }
    }

    fn get_or_try_insert(&self, key: &str, make: impl FnOnce() -> Result<T>) -> Result<T> {
        let mut entries = self
            .entries
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .map_err(|_| anyhow!("storage registry lock poisoned"))?;
        if let Some(found) = entries.get(key) {
            return Ok(found.clone());
        }
        let value = make()?;
        entries.insert(key.to_string(), value.clone());
        Ok(value)
    }
}

static MEMORY_OPERATORS: Registry<Operator> = Registry::new();
static WRITE_LOCKS: Registry<Arc<AsyncMutex<()>>> = Registry::new();

/// Creates an OpenDAL Operator from a URI string.
///
/// Supported schemes:
/// - file:///path/to/dir -> local filesystem
/// - s3://bucket/path -> AWS S3 (credentials from the usual env vars)
/// - memory://name -> in-memory; the same URI always yields the same store
pub fn operator_from_uri(uri: &str) -> Result<Operator> {
    if uri.starts_with("memory://") {
        return MEMORY_OPERATORS.get_or_try_insert(uri, || {
            Ok(Operator::new(opendal::services::Memory::default())?.finish())
        });
    }

    // OpenDAL registers the local filesystem as "fs".
    let uri = match uri.strip_prefix("file://") {
        Some(rest) => format!("fs://{}", rest),
        None => uri.to_string(),
    };
    Operator::from_uri(uri.as_str()).with_context(|| format!("Invalid storage URI: {}", uri))
}

/// Serializes writers of the data under `prefix` of `op`, across every handle
/// built on an operator with the same service, name and root.
///
/// The guard must be held until the last write of a read-modify-write cycle
/// has completed.
pub async fn lock_writes(op: &Operator, prefix: &str) -> Result<OwnedMutexGuard<()>> {
    let info = op.info();
    let key = format!(
        "{}:{}:{}:{}",
        info.scheme(),
        info.name(),
        info.root(),
        prefix
    );
    let lock = WRITE_LOCKS.get_or_try_insert(&key, || Ok(Arc::new(AsyncMutex::new(()))))?;
    Ok(lock.lock_owned().await)
}
