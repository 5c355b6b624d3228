// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Capability collection.
//!
//! A __capability__ is a fact about the host that a component directory wants
//! to know before weaving: where an executable lives, whether a file or
//! directory exists, or what an environment variable holds. Capabilities that
//! resolve become properties, which act just like accepted tags. Fragments can
//! be gated on them, and templates can refer to their values.

use crate::{
    config::{CapabilityDeclaration, PathsDocument},
    host::{EntryKind, Host},
    path::expand_home,
    tag::TagMap,
};

use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Kind of host fact a capability refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Executable on search path, looked up by capability name.
    Exec,

    /// Existing regular file.
    File,

    /// Existing directory.
    Dir,

    /// Environment variable.
    Env,
}

impl FromStr for CapabilityKind {
    type Err = CollectError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "exec" => Ok(Self::Exec),
            "file" => Ok(Self::File),
            "dir" => Ok(Self::Dir),
            "env" => Ok(Self::Env),
            unknown => Err(CollectError::UnknownKind(unknown.to_string())),
        }
    }
}

/// Collect capabilities from host.
#[derive(Debug)]
pub struct Collector<'h, H>
where
    H: Host,
{
    host: &'h H,
}

impl<'h, H> Collector<'h, H>
where
    H: Host,
{
    /// Construct new collector over host.
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Resolve every capability of a document into properties.
    ///
    /// Capabilities that do not resolve are left out.
    ///
    /// # Errors
    ///
    /// - Return [`CollectError::UnknownKind`] if any capability declares a
    ///   kind other than "exec", "file", "dir", or "env".
    #[instrument(skip_all, level = "debug")]
    pub fn collect(&self, document: &PathsDocument) -> Result<TagMap> {
        let mut properties = TagMap::new();
        for (name, declaration) in &document.0 {
            if let Some(value) = self.resolve(name, declaration)? {
                properties.insert(name.clone(), value);
            }
        }

        Ok(properties)
    }

    fn resolve(&self, name: &str, declaration: &CapabilityDeclaration) -> Result<Option<String>> {
        let kind = declaration.kind.parse::<CapabilityKind>()?;
        let value = match kind {
            CapabilityKind::Exec => self
                .host
                .which(name)
                .map(|path| path.to_string_lossy().into_owned()),
            CapabilityKind::File | CapabilityKind::Dir => self.resolve_path(name, kind, &declaration.path),
            CapabilityKind::Env => Some(self.host.env_var(&declaration.path)),
        };

        if value.is_none() {
            debug!("capability {name:?} does not resolve");
        }

        Ok(value)
    }

    fn resolve_path(&self, name: &str, kind: CapabilityKind, path: &str) -> Option<String> {
        let path = match expand_home(self.host, path) {
            Ok(path) => path,
            Err(error) => {
                warn!("skip capability {name:?}: {error}");
                return None;
            }
        };

        let found = self.host.kind(&path)?;
        let expect = match kind {
            CapabilityKind::Dir => EntryKind::Dir,
            _ => EntryKind::File,
        };
        if found != expect {
            return None;
        }

        self.host
            .absolute(&path)
            .ok()
            .map(|path| path.to_string_lossy().into_owned())
    }
}

/// Capability collection error types.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Capability declares kind that is not understood.
    #[error("unknown capability type {0:?}")]
    UnknownKind(String),
}

/// Friendly result alias :3
type Result<T, E = CollectError> = std::result::Result<T, E>;
