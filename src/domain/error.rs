//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{key} not found in {}", path.display())]
    MissingSecret { key: String, path: PathBuf },
}
