use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Bytes;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::debug;

pub const PROXY: &str = "Proxy";
pub const CONTROLLER: &str = "LockedController";

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Artifact {0} has no bytecode")]
    EmptyBytecode(String),
    #[error("Artifact {0} has unlinked library references")]
    Unlinked(String),
    #[error("Invalid bytecode in artifact {name}: {message}")]
    InvalidBytecode { name: String, message: String },
    #[error("Artifact {name} does not expose function {function}")]
    MissingFunction { name: String, function: String },
    #[error("Unknown artifact {0}")]
    Unknown(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: Option<String>,
    #[serde(default)]
    abi: Value,
    #[serde(default)]
    bytecode: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Artifact {
    pub contract_name: String,
    pub bytecode: Bytes,
    pub abi: Value,
}

impl Artifact {
    pub fn new(contract_name: impl Into<String>, bytecode: Bytes, abi: Value) -> Self {
        Self {
            contract_name: contract_name.into(),
            bytecode,
            abi,
        }
    }

    fn from_json(name: &str, text: &str, path: &Path) -> Result<Self, Error> {
        let file: ArtifactFile = serde_json::from_str(text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let hex = file.bytecode.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        if hex.is_empty() {
            return Err(Error::EmptyBytecode(name.to_string()));
        }
        // Unlinked references look like __LibraryName______________________
        if hex.contains("__") {
            return Err(Error::Unlinked(name.to_string()));
        }
        let bytecode = hex
            .parse::<Bytes>()
            .map_err(|e| Error::InvalidBytecode {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            contract_name: file.contract_name.unwrap_or_else(|| name.to_string()),
            bytecode,
            abi: file.abi,
        })
    }

    pub fn has_function(&self, function: &str) -> bool {
        self.abi.as_array().is_some_and(|entries| {
            entries.iter().any(|entry| {
                entry["type"] == "function" && entry["name"].as_str() == Some(function)
            })
        })
    }

    pub fn require_functions(&self, functions: &[&str]) -> Result<(), Error> {
        for function in functions {
            if !self.has_function(function) {
                return Err(Error::MissingFunction {
                    name: self.contract_name.clone(),
                    function: function.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Compiled artifacts keyed by logical contract name, resolved once before
/// any stage runs.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    artifacts: IndexMap<String, Artifact>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `<dir>/<name>.json` for every name.
    pub fn load(dir: &Path, names: &[&str]) -> Result<Self, Error> {
        let mut registry = Self::new();
        for name in names {
            let path = dir.join(format!("{}.json", name));
            let text = fs::read_to_string(&path).map_err(|source| Error::Read {
                path: path.clone(),
                source,
            })?;
            let artifact = Artifact::from_json(name, &text, &path)?;
            debug!(
                "Loaded artifact {} ({} bytes) from {}",
                name,
                artifact.bytecode.len(),
                path.display()
            );
            registry.insert(name, artifact);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, name: &str, artifact: Artifact) {
        self.artifacts.insert(name.to_string(), artifact);
    }

    pub fn with(mut self, name: &str, artifact: Artifact) -> Self {
        self.insert(name, artifact);
        self
    }

    pub fn require(&self, name: &str) -> Result<&Artifact, Error> {
        self.artifacts
            .get(name)
            .ok_or_else(|| Error::Unknown(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }
}
