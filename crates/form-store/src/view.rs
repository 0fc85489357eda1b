use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::{KeyValueBackend, VIEW_KEY};
use crate::error::StoreError;

/// Which side of the application is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Builder,
    Preview,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Builder => "builder",
            ViewMode::Preview => "preview",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Builder => ViewMode::Preview,
            ViewMode::Preview => ViewMode::Builder,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "builder" => Ok(ViewMode::Builder),
            "preview" => Ok(ViewMode::Preview),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// Reads the stored view; missing or unreadable values mean the builder.
pub fn load_view(backend: &dyn KeyValueBackend) -> ViewMode {
    backend
        .get(VIEW_KEY)
        .ok()
        .flatten()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

pub fn store_view(backend: &dyn KeyValueBackend, view: ViewMode) -> Result<(), StoreError> {
    backend.set(VIEW_KEY, view.as_str().to_string())
}
