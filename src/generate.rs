// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Output generation.
//!
//! Writes each woven entry to its target path by appending its fragments in
//! order. Literal fragments are copied byte for byte. Template fragments are
//! rendered with [Tera](https://keats.github.io/tera/) against the resolved
//! tag map, so `{{ linux }}` expands to the value of the "linux" tag.
//! Referencing a tag that does not hold is a render error.
//!
//! Output is not transactional. If a fragment fails, the target file keeps
//! whatever was appended before the failure.

use crate::{
    host::Host,
    path::{expand_home, NoWayHome},
    tag::TagMap,
    weave::{DotEntry, DotSource, SourceKind},
};

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    string::FromUtf8Error,
};
use tera::{Context, Tera};
use tracing::{debug, info, instrument};

/// Generate output files from woven entries.
#[derive(Debug)]
pub struct Generator<'h, H>
where
    H: Host,
{
    host: &'h H,
}

impl<'h, H> Generator<'h, H>
where
    H: Host,
{
    /// Construct new generator over host.
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Write entry to its target path.
    ///
    /// Missing parent directories are created with the permission bits of the
    /// directory holding the running executable. The target itself receives
    /// the entry's mode, or `644` if it has none.
    ///
    /// # Errors
    ///
    /// - Return [`GenerateError::Home`] if target needs home expansion, but
    ///   home directory cannot be determined.
    /// - Return [`GenerateError::CreateDir`] if parent directory cannot be
    ///   created.
    /// - Return [`GenerateError::Create`] if target cannot be opened.
    /// - Return [`GenerateError::Read`] if a fragment cannot be read.
    /// - Return [`GenerateError::Encoding`] if a template is not UTF-8.
    /// - Return [`GenerateError::Render`] if a template fails to render.
    /// - Return [`GenerateError::Write`] if target cannot be written to.
    #[instrument(skip_all, fields(output = %entry.path()), level = "debug")]
    pub fn generate(&self, entry: &DotEntry, tags: &TagMap) -> Result<()> {
        let path = expand_home(self.host, entry.path())?;
        self.ensure_parent(&path)?;

        let mode = entry.target.mode.unwrap_or_default();
        info!("generate {:?} (mode: {mode})", path.display());
        let mut output = self
            .host
            .create_file(&path, mode.bits())
            .map_err(|source| GenerateError::Create {
                source,
                path: path.clone(),
            })?;

        let context = template_context(tags);
        for source in &entry.sources {
            self.append(&mut output, &path, source, &context)?;
        }

        output.flush().map_err(|source| GenerateError::Write {
            source,
            path: path.clone(),
        })?;

        Ok(())
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
            return Ok(());
        };

        if self.host.kind(parent).is_some() {
            return Ok(());
        }

        let mode = self
            .host
            .executable_dir()
            .and_then(|dir| self.host.dir_mode(&dir))
            .map_err(GenerateError::ExecutableDir)?;
        debug!("create {:?} (mode: {mode:o})", parent.display());
        self.host
            .create_dir_all(parent, mode)
            .map_err(|source| GenerateError::CreateDir {
                source,
                path: parent.to_path_buf(),
            })
    }

    fn append(
        &self,
        output: &mut H::Output,
        path: &Path,
        source: &DotSource,
        context: &Context,
    ) -> Result<()> {
        let contents = self
            .host
            .read(&source.path)
            .map_err(|error| GenerateError::Read {
                source: error,
                path: source.path.clone(),
            })?;

        let contents = match source.kind {
            SourceKind::Literal => contents,
            SourceKind::Template => {
                let template =
                    String::from_utf8(contents).map_err(|error| GenerateError::Encoding {
                        source: error,
                        path: source.path.clone(),
                    })?;
                Tera::one_off(&template, context, false)
                    .map_err(|error| GenerateError::Render {
                        source: error,
                        path: source.path.clone(),
                    })?
                    .into_bytes()
            }
        };

        output
            .write_all(&contents)
            .map_err(|error| GenerateError::Write {
                source: error,
                path: path.to_path_buf(),
            })
    }
}

fn template_context(tags: &TagMap) -> Context {
    let mut context = Context::new();
    for (tag, value) in tags {
        context.insert(tag.as_str(), value);
    }

    context
}

/// Output generation error types.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Target path needs home directory, but it cannot be determined.
    #[error(transparent)]
    Home(#[from] NoWayHome),

    /// Permission bits of executable's directory cannot be determined.
    #[error("failed to inspect directory of running executable")]
    ExecutableDir(#[source] io::Error),

    /// Parent directory of target cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Target cannot be created or truncated.
    #[error("failed to create {:?}", path.display())]
    Create {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Fragment cannot be read.
    #[error("failed to read fragment {:?}", path.display())]
    Read {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Template fragment is not valid UTF-8.
    #[error("template fragment {:?} is not valid UTF-8", path.display())]
    Encoding {
        #[source]
        source: FromUtf8Error,
        path: PathBuf,
    },

    /// Template fragment fails to render.
    #[error("failed to render template fragment {:?}", path.display())]
    Render {
        #[source]
        source: tera::Error,
        path: PathBuf,
    },

    /// Target cannot be written to.
    #[error("failed to write to {:?}", path.display())]
    Write {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = GenerateError> = std::result::Result<T, E>;
