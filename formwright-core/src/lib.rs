#![warn(warnings)]
#![deny(clippy::all)]

pub mod backend;
pub mod client;
pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod metadata;
pub mod render;
pub mod statement;
pub mod storage;
pub mod store;
pub mod submission;

#[cfg(feature = "python")]
mod bindings;

pub use backend::{OpendalBackend, Row, TableBackend};
pub use client::FormsClient;
pub use config::FormsConfig;
pub use descriptor::{Attributes, FieldDescriptor, FieldKind, Form, FORM_FILE_SUFFIX};
pub use error::{FormError, Result};
pub use statement::{ColumnEntry, ForeignKey, OnDelete, StorageType, TableStatement};
pub use store::FormStore;
pub use submission::{FormSubmission, SubmittedValues};
