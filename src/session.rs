use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::catalog::write_json_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    Library,
    CheatSheets,
    CheatSheet,
    Dsa,
    DsaResources,
    DsaCompanyWise,
}

/// The view the user was on, plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub view: View,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl ViewState {
    pub fn new(view: View) -> Self {
        Self {
            view,
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(view: View, params: BTreeMap<String, String>) -> Self {
        Self { view, params }
    }

    pub fn param<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key).and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<Option<ViewState>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read session: {}", self.path.display()));
            }
        };
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse session: {}", self.path.display()))?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &ViewState) -> anyhow::Result<()> {
        write_json_atomic(&self.path, state)
            .with_context(|| format!("write session: {}", self.path.display()))
    }
}
