use std::fmt;

use thiserror::Error;

/// Kinds of named references the engine resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Template,
    Tier,
    Opportunity,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Company => "company",
            EntityKind::Template => "template",
            EntityKind::Tier => "tier",
            EntityKind::Opportunity => "opportunity",
        };
        f.write_str(label)
    }
}

/// Endpoint of a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Source,
    Target,
}

impl fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSide::Source => f.write_str("source"),
            EdgeSide::Target => f.write_str("target"),
        }
    }
}

/// Coarse grouping used by embedders to translate errors into transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Structural,
    Io,
}

#[derive(Error, Debug)]
pub enum SynergyError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    #[error("edge {side} `{slug}` is not a registered company")]
    DanglingEdge { side: EdgeSide, slug: String },

    #[error("company `{0}` is already registered")]
    DuplicateNode(String),

    #[error("graph inconsistency: {0}")]
    Inconsistent(String),

    #[error("template bundle error: {0}")]
    Bundle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynergyError {
    pub fn validation(message: impl Into<String>) -> Self {
        SynergyError::Validation(message.into())
    }

    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        SynergyError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn bundle(message: impl Into<String>) -> Self {
        SynergyError::Bundle(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SynergyError::Validation(_) | SynergyError::Bundle(_) => ErrorCategory::Validation,
            SynergyError::NotFound { .. } => ErrorCategory::NotFound,
            SynergyError::DanglingEdge { .. }
            | SynergyError::DuplicateNode(_)
            | SynergyError::Inconsistent(_) => ErrorCategory::Structural,
            SynergyError::Io(_) => ErrorCategory::Io,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn is_structural(&self) -> bool {
        self.category() == ErrorCategory::Structural
    }
}

pub type Result<T> = std::result::Result<T, SynergyError>;
