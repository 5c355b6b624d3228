// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Fragment weaving.
//!
//! __Weaving__ decides which fragment files make up each output file, and in
//! what order. For every rule, each search directory of the rule is walked in
//! every component directory. A fragment qualifies when its path relative to
//! the search directory matches the rule's pattern, and every tag in its file
//! name holds.
//!
//! # Fragment File Names
//!
//! A fragment's base name, with all extensions removed, is split on `_`. The
//! first segment identifies the fragment, and every following segment is a
//! tag that must hold for the fragment to be used. For example,
//! `10-aliases_linux_zsh.sh` requires both "linux" and "zsh". Fragments tagged
//! with [`TEMPLATE_TAG`] are rendered as templates instead of being copied.
//!
//! # Ordering
//!
//! Fragments are ordered by their relative path. Fragments sharing a relative
//! path across search directories or component directories keep discovery
//! order, i.e., search directory first, then component directory.

use crate::{
    host::Host,
    rule::{Mode, Rule},
    tag::TagMap,
};

use std::{
    collections::{BTreeMap, HashSet},
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, trace};

/// Reserved tag that marks a fragment as a template.
pub const TEMPLATE_TAG: &str = "gtp";

/// How a fragment contributes to its output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Copy bytes verbatim.
    Literal,

    /// Render against resolved tags.
    Template,
}

impl SourceKind {
    /// Determine kind from fragment file name tags.
    pub fn from_tags(tags: &[String]) -> Self {
        if tags.iter().any(|tag| tag == TEMPLATE_TAG) {
            Self::Template
        } else {
            Self::Literal
        }
    }
}

/// Fragment file selected for an output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotSource {
    /// Path relative to the search directory it was found in.
    pub name: String,

    /// Full path to fragment.
    pub path: PathBuf,

    /// Tags extracted from file name.
    pub tags: Vec<String>,

    /// How fragment gets appended.
    pub kind: SourceKind,
}

impl DotSource {
    /// Construct new source, extracting tags from its name.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let tags = extract_tags(&name);
        let kind = SourceKind::from_tags(&tags);

        Self {
            name,
            path: path.into(),
            tags,
            kind,
        }
    }
}

/// Output file to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotTarget {
    /// Path to output file, possibly starting with `~`.
    pub path: String,

    /// Permission bits of output file.
    pub mode: Option<Mode>,
}

impl Display for DotTarget {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self.mode {
            Some(mode) => write!(fmt, "{} (mode: {mode})", self.path),
            None => fmt.write_str(&self.path),
        }
    }
}

/// Output file paired with its ordered fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotEntry {
    /// Output file.
    pub target: DotTarget,

    /// Fragments in append order.
    pub sources: Vec<DotSource>,
}

impl DotEntry {
    /// Path to output file.
    pub fn path(&self) -> &str {
        &self.target.path
    }
}

/// Weave fragments into entries by rule.
#[derive(Debug)]
pub struct Weaver<'h, H>
where
    H: Host,
{
    host: &'h H,
}

impl<'h, H> Weaver<'h, H>
where
    H: Host,
{
    /// Construct new weaver over host.
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Weave every rule into an entry.
    ///
    /// Entries come back sorted by target path.
    #[instrument(skip_all, level = "debug")]
    pub fn weave(
        &self,
        roots: &[PathBuf],
        tags: &TagMap,
        rules: &BTreeMap<String, Rule>,
    ) -> Vec<DotEntry> {
        let mut entries = rules
            .iter()
            .map(|(target, rule)| DotEntry {
                target: DotTarget {
                    path: target.clone(),
                    mode: rule.mode,
                },
                sources: self.weave_rule(roots, tags, rule),
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        entries
    }

    fn weave_rule(&self, roots: &[PathBuf], tags: &TagMap, rule: &Rule) -> Vec<DotSource> {
        let mut groups: BTreeMap<String, Vec<DotSource>> = BTreeMap::new();
        for directory in &rule.directories {
            for root in roots {
                let base = root.join(directory.trim_start_matches('/'));
                for source in self.walk(&base, tags, rule) {
                    groups.entry(source.name.clone()).or_default().push(source);
                }
            }
        }

        merge_groups(groups)
    }

    /// Collect qualifying fragments below a search directory.
    fn walk(&self, base: &Path, tags: &TagMap, rule: &Rule) -> Vec<DotSource> {
        let mut sources = Vec::new();
        for path in self.host.walk_files(base) {
            let Some(name) = relative_name(base, &path) else {
                continue;
            };

            if !rule.pattern.is_match(&name) {
                trace!("skip {name:?}: pattern mismatch");
                continue;
            }

            // INVARIANT: Sources are keyed by absolute path, no matter how
            //   the component directory was spelled.
            let path = self.host.absolute(&path).unwrap_or(path);
            let source = DotSource::new(name, path);
            if let Some(missing) = source.tags.iter().find(|tag| !tags.contains_key(*tag)) {
                debug!("skip {:?}: tag {missing:?} does not hold", source.name);
                continue;
            }

            sources.push(source);
        }

        sources
    }
}

/// Extract tags from fragment file name.
///
/// Strips every extension off the base name, splits it on `_`, and drops the
/// leading identifier.
pub fn extract_tags(path: impl AsRef<str>) -> Vec<String> {
    let path = path.as_ref();
    let base = path.rsplit('/').next().unwrap_or(path);

    let mut stem = base;
    while let Some((head, _)) = stem.rsplit_once('.') {
        stem = head;
    }

    stem.split('_').skip(1).map(str::to_string).collect()
}

fn relative_name(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let name = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    (!name.is_empty()).then_some(name)
}

/// Flatten groups in name order, then drop repeated paths.
fn merge_groups(groups: BTreeMap<String, Vec<DotSource>>) -> Vec<DotSource> {
    let mut seen = HashSet::new();
    groups
        .into_values()
        .flatten()
        .filter(|source| seen.insert(source.path.clone()))
        .collect()
}
