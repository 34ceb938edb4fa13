use log::warn;
use serde::Serialize;

use crate::errors::Result;

/// One part of the result document: its data, or why it could not be built.
///
/// A failing section never takes its siblings down with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Ready(T),
    Failed { error: String },
}

impl<T> Section<T> {
    /// Wrap `result`, prefixing a failure with `context`.
    pub fn capture(context: &str, result: Result<T>) -> Self {
        match result {
            Ok(data) => Section::Ready(data),
            Err(err) => {
                warn!("{context}: {err}");
                Section::Failed {
                    error: format!("{context}: {err}"),
                }
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(data) => Some(data),
            Section::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed { .. })
    }
}
