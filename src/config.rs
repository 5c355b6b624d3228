// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the declarative documents that a component directory
//! may carry to simplify the process of deserialization. File I/O is left to
//! the caller to figure out.
//!
//! # Component Documents
//!
//! Every component directory can optionally hold the following YAML
//! documents at its top-level:
//!
//! - `entry.yml`: initial tags to seed tag resolution with.
//! - `tags.yml`: tag implication graph.
//! - `paths.yml`: capabilities to collect from the host.
//! - `rules.yml`: output files and the fragments that make them up.
//!
//! An empty document is treated as a document without any entries.

use crate::tag::{TagGraph, TagMap};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};

/// File name of entry tag document.
pub const ENTRY_DOCUMENT: &str = "entry.yml";

/// File name of tag implication document.
pub const TAGS_DOCUMENT: &str = "tags.yml";

/// File name of capability document.
pub const PATHS_DOCUMENT: &str = "paths.yml";

/// File name of rule document.
pub const RULES_DOCUMENT: &str = "rules.yml";

/// Initial tag layout.
///
/// Maps raw tags to their values. A tag listed without a value takes its own
/// raw name as its value, e.g., `linux:` becomes `linux = "linux"` and
/// `"!emacs":` becomes `!emacs = "!emacs"`.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EntryDocument(BTreeMap<String, Option<String>>);

impl EntryDocument {
    /// Convert into tag map, filling in missing values.
    pub fn into_tags(self) -> TagMap {
        self.0
            .into_iter()
            .map(|(tag, value)| {
                let value = value.filter(|value| !value.is_empty()).unwrap_or_else(|| tag.clone());
                (tag, value)
            })
            .collect()
    }
}

impl FromStr for EntryDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        from_yaml(data)
    }
}

/// Tag implication layout.
///
/// Maps a parent tag to the child tags it implies. Children follow the same
/// value rules as [`EntryDocument`].
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TagsDocument(BTreeMap<String, Option<EntryDocument>>);

impl TagsDocument {
    /// Convert into tag implication graph, filling in missing values.
    pub fn into_graph(self) -> TagGraph {
        self.0
            .into_iter()
            .map(|(tag, children)| (tag, children.unwrap_or_default().into_tags()))
            .collect()
    }
}

impl FromStr for TagsDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        from_yaml(data)
    }
}

/// Capability layout.
///
/// Maps capability names to what kind of host fact they refer to.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PathsDocument(pub BTreeMap<String, CapabilityDeclaration>);

impl FromStr for PathsDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        from_yaml(data)
    }
}

/// Single capability declaration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct CapabilityDeclaration {
    /// Kind of capability: "exec", "file", "dir", or "env".
    #[serde(rename = "type")]
    pub kind: String,

    /// File path, directory path, or environment variable name.
    #[serde(default)]
    pub path: String,
}

/// Rule layout.
///
/// Maps output file paths to the rule that weaves them.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RulesDocument(pub BTreeMap<String, RuleDeclaration>);

impl FromStr for RulesDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        from_yaml(data)
    }
}

/// Raw rule declaration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct RuleDeclaration {
    /// Single search directory, relative to each component directory.
    #[serde(default, alias = "directory", skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Search directories, relative to each component directory.
    #[serde(default, alias = "directories", skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<String>,

    /// Regular expression matched against fragment paths relative to a
    /// search directory.
    #[serde(default, alias = "pattern")]
    pub pat: String,

    /// Octal permission bits of output file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

fn from_yaml<T>(data: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    // INVARIANT: Empty documents, or documents with nothing but comments, are
    //   treated as empty maps.
    let blank = data.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    });
    if blank {
        return Ok(T::default());
    }

    let document: Option<T> = serde_yaml::from_str(data)?;
    Ok(document.unwrap_or_default())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] serde_yaml::Error),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
