use std::io;
use thiserror::Error;

use crate::layout::{Field, Variant};

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("{field} is {actual} bytes long; the limit is {limit}")]
    Validation { field: Field, limit: usize, actual: usize },
    #[error("{field} has no slot in the {variant} header layout")]
    FieldNotInLayout { field: Field, variant: Variant },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a recognized container: {0}")]
    Format(String),
    #[error("Checksum mismatch: header says {expected}, payload hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("Archiver failed: {0}")]
    Archiver(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Model '{model}' is not in the supported model list")]
    UnsupportedModel { model: String },
}

pub type Result<T> = std::result::Result<T, ContainerError>;
