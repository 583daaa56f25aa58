//! Error types for the editor

use crate::document::DocumentError;
use thiserror::Error;

/// Registration failures shared by the meta and setter registries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate registration: {kind} '{name}' already exists")]
    DuplicateRegistration { kind: &'static str, name: String },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("No document is open")]
    NoActiveDocument,
}
