// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Application pipeline.
//!
//! Polkadot runs in two phases. The __prepare__ phase loads the documents of
//! every component directory, resolves tags, collects capabilities, and weaves
//! fragments into entries. Nothing is written during preparation, which is
//! what makes dry runs possible. The __execute__ phase generates every entry
//! of a prepared [`Plan`].

use crate::{
    collect::{CollectError, Collector},
    config::{
        ConfigError, EntryDocument, PathsDocument, RulesDocument, TagsDocument, ENTRY_DOCUMENT,
        PATHS_DOCUMENT, RULES_DOCUMENT, TAGS_DOCUMENT,
    },
    generate::{GenerateError, Generator},
    host::{EntryKind, Host, OsHost},
    rule::{Rule, RuleError},
    tag::{Expander, Resolution, TagGraph, TagMap},
    weave::{DotEntry, Weaver, TEMPLATE_TAG},
};

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info, instrument};

/// Tag that always holds.
pub const DEFAULT_TAG: &str = "default";

/// Tag holding path to the dotfiles directory.
pub const DOTFILES_TAG: &str = "dotfiles";

/// Everything needed to generate output files.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Initial tags loaded from entry documents.
    pub entry: TagMap,

    /// Accepted and rejected tags.
    pub resolution: Resolution,

    /// Properties collected from host.
    pub collected: TagMap,

    /// Final tag map that gates fragments and feeds templates.
    pub tags: TagMap,

    /// Woven entries sorted by target path.
    pub entries: Vec<DotEntry>,
}

/// Polkadot application.
#[derive(Debug)]
pub struct App<H = OsHost>
where
    H: Host,
{
    dotfiles_dir: PathBuf,
    entry_path: PathBuf,
    component_dirs: Vec<PathBuf>,
    host: H,
}

impl App<OsHost> {
    /// Construct new application over the operating system.
    ///
    /// A relative entry path is resolved against the dotfiles directory.
    pub fn new(
        dotfiles_dir: impl Into<PathBuf>,
        entry_path: impl Into<PathBuf>,
        component_dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        Self::with_host(dotfiles_dir, entry_path, component_dirs, OsHost::new())
    }
}

impl<H> App<H>
where
    H: Host,
{
    /// Construct new application over a specific host.
    pub fn with_host(
        dotfiles_dir: impl Into<PathBuf>,
        entry_path: impl Into<PathBuf>,
        component_dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
        host: H,
    ) -> Self {
        let dotfiles_dir = dotfiles_dir.into();
        let entry_path = dotfiles_dir.join(entry_path.into());
        let component_dirs = component_dirs.into_iter().map(Into::into).collect();

        Self {
            dotfiles_dir,
            entry_path,
            component_dirs,
            host,
        }
    }

    /// Load documents, resolve tags, and weave entries without writing
    /// anything.
    ///
    /// # Errors
    ///
    /// - Return [`AppError::Read`] if a document exists, but cannot be read.
    /// - Return [`AppError::Config`] if a document is malformed.
    /// - Return [`AppError::Rule`] if a rule fails to compile.
    /// - Return [`AppError::Collect`] if a capability has an unknown type.
    #[instrument(skip(self), level = "debug")]
    pub fn prepare(&self) -> Result<Plan> {
        info!("dotfiles dir: {:?}", self.dotfiles_dir.display());
        info!("component dirs: {:?}", self.component_dirs);

        let entry = self.load_entry_tags()?;
        info!("entry tags: {entry:?}");

        let graph = self.load_tag_graph()?;
        let rules = self.load_rules()?;

        let resolution = Expander::new(&graph).expand(&entry);
        info!("accepted tags: {:?}", resolution.accepted);
        info!("rejected tags: {:?}", resolution.rejected);

        let collected = self.collect()?;
        info!("collected tags: {collected:?}");

        let mut seeded = collected.clone();
        seeded.insert(
            DOTFILES_TAG.into(),
            self.dotfiles_dir.to_string_lossy().into_owned(),
        );
        seeded.insert(TEMPLATE_TAG.into(), TEMPLATE_TAG.into());
        let tags = resolution.merge(seeded);
        info!("resolved tags: {tags:?}");

        let entries = Weaver::new(&self.host).weave(&self.component_dirs, &tags, &rules);

        Ok(Plan {
            entry,
            resolution,
            collected,
            tags,
            entries,
        })
    }

    /// Generate every entry of a plan in order.
    ///
    /// # Errors
    ///
    /// - Return [`AppError::Generate`] at the first entry that fails. Entries
    ///   before it stay written.
    #[instrument(skip_all, level = "debug")]
    pub fn execute(&self, plan: &Plan) -> Result<()> {
        let generator = Generator::new(&self.host);
        for entry in &plan.entries {
            generator.generate(entry, &plan.tags)?;
        }

        Ok(())
    }

    /// Load initial tags from every component directory, followed by the
    /// entry document of the dotfiles directory.
    pub fn load_entry_tags(&self) -> Result<TagMap> {
        let mut tags = TagMap::new();
        let paths = self
            .component_dirs
            .iter()
            .map(|dir| dir.join(ENTRY_DOCUMENT))
            .chain(std::iter::once(self.entry_path.clone()));
        for path in paths {
            if let Some(document) = self.read_document::<EntryDocument>(&path)? {
                tags.extend(document.into_tags());
            }
        }
        tags.insert(DEFAULT_TAG.into(), DEFAULT_TAG.into());

        Ok(tags)
    }

    /// Load tag implication graph.
    ///
    /// Later component directories replace the children of a tag wholesale.
    pub fn load_tag_graph(&self) -> Result<TagGraph> {
        let mut graph = TagGraph::new();
        for dir in &self.component_dirs {
            if let Some(document) = self.read_document::<TagsDocument>(&dir.join(TAGS_DOCUMENT))? {
                graph.extend(document.into_graph());
            }
        }

        Ok(graph)
    }

    /// Load and compile rules keyed by target path.
    ///
    /// Later component directories replace the rule of a target.
    pub fn load_rules(&self) -> Result<BTreeMap<String, Rule>> {
        let mut rules = BTreeMap::new();
        for dir in &self.component_dirs {
            let Some(document) = self.read_document::<RulesDocument>(&dir.join(RULES_DOCUMENT))?
            else {
                continue;
            };

            for (target, declaration) in document.0 {
                let rule = Rule::compile(declaration).map_err(|source| AppError::Rule {
                    source,
                    target: target.clone(),
                })?;
                rules.insert(target, rule);
            }
        }

        Ok(rules)
    }

    /// Collect capabilities of every component directory.
    ///
    /// Later component directories overwrite earlier properties.
    pub fn collect(&self) -> Result<TagMap> {
        let collector = Collector::new(&self.host);
        let mut properties = TagMap::new();
        for dir in &self.component_dirs {
            let path = dir.join(PATHS_DOCUMENT);
            let Some(document) = self.read_document::<PathsDocument>(&path)? else {
                continue;
            };

            let collected = collector
                .collect(&document)
                .map_err(|source| AppError::Collect { source, path })?;
            properties.extend(collected);
        }

        Ok(properties)
    }

    fn read_document<T>(&self, path: &Path) -> Result<Option<T>>
    where
        T: FromStr<Err = ConfigError>,
    {
        if self.host.kind(path) != Some(EntryKind::File) {
            debug!("skip {:?}: no such document", path.display());
            return Ok(None);
        }

        let data = self
            .host
            .read(path)
            .and_then(|data| {
                String::from_utf8(data)
                    .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
            })
            .map_err(|source| AppError::Read {
                source,
                path: path.to_path_buf(),
            })?;

        let document = data.parse::<T>().map_err(|source| AppError::Config {
            source,
            path: path.to_path_buf(),
        })?;

        Ok(Some(document))
    }
}

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Document exists, but cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Document is malformed.
    #[error("malformed document {:?}", path.display())]
    Config {
        #[source]
        source: ConfigError,
        path: PathBuf,
    },

    /// Rule fails to compile.
    #[error("invalid rule for {target:?}")]
    Rule {
        #[source]
        source: RuleError,
        target: String,
    },

    /// Capability document cannot be collected.
    #[error("failed to collect capabilities of {:?}", path.display())]
    Collect {
        #[source]
        source: CollectError,
        path: PathBuf,
    },

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Friendly result alias :3
type Result<T, E = AppError> = std::result::Result<T, E>;
