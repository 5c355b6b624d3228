// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tag resolution.
//!
//! A __tag__ is a named fact about the machine polkadot runs on, e.g.,
//! "linux", "laptop", or "emacs". Every tag carries a string value, which
//! defaults to the tag's own name. Tags gate which fragments end up in an
//! output file, and their values are available to template fragments.
//!
//! # Implication Graph
//!
//! Component directories declare which tags imply other tags through a
//! __tag implication graph__. Starting from a set of initial tags, the graph is
//! walked breadth first to find every tag that follows from them.
//!
//! # Negation
//!
//! A raw tag may be prefixed with any number of `!` markers. The number of
//! markers is the tag's __importance__, and an odd number of markers makes the
//! tag negative, i.e., rejected. Negative tags never imply anything. When the
//! same tag is reached more than once, the occurrence with the highest
//! importance wins, followed by the shallowest depth. Thus `!!systemctl`
//! overrides `!systemctl`, which in turn overrides plain `systemctl`.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
};
use tracing::{debug, instrument};

/// Marker that negates a tag.
pub const NEGATION: char = '!';

/// Mapping of tag names to values.
pub type TagMap = BTreeMap<String, String>;

/// Mapping of tag names to the raw child tags they imply.
pub type TagGraph = BTreeMap<String, TagMap>;

/// Single occurrence of a tag found while walking the implication graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagItem {
    /// Tag name without negation markers.
    pub tag: String,

    /// Value of the tag.
    pub value: String,

    /// Distance from the initial tag set.
    pub depth: usize,

    /// Whether the tag is rejected.
    pub negative: bool,

    /// Number of negation markers stripped from the raw tag.
    pub importance: usize,
}

impl TagItem {
    /// Parse raw tag into tag item.
    pub fn parse(raw: &str, value: impl Into<String>, depth: usize) -> Self {
        let tag = raw.trim_start_matches(NEGATION);
        let importance = raw.len() - tag.len();

        Self {
            tag: tag.to_string(),
            value: value.into(),
            depth,
            negative: importance % 2 == 1,
            importance,
        }
    }

    /// Order by importance descending, depth, tag, and value.
    fn priority(&self, other: &Self) -> Ordering {
        other
            .importance
            .cmp(&self.importance)
            .then_with(|| self.depth.cmp(&other.depth))
            .then_with(|| self.tag.cmp(&other.tag))
            .then_with(|| self.value.cmp(&other.value))
    }
}

/// Outcome of tag resolution.
///
/// # Invariant
///
/// - A tag name is either accepted or rejected, never both.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Tags that hold.
    pub accepted: TagMap,

    /// Tags that were explicitly negated.
    pub rejected: TagMap,
}

impl Resolution {
    /// Merge resolution into collected properties.
    ///
    /// Collected properties come first, accepted tags override them, and
    /// rejected tags are removed outright.
    pub fn merge(&self, collected: TagMap) -> TagMap {
        let mut tags = collected;
        tags.extend(
            self.accepted
                .iter()
                .map(|(tag, value)| (tag.clone(), value.clone())),
        );
        for tag in self.rejected.keys() {
            tags.remove(tag);
        }

        tags
    }
}

/// Expand initial tags through tag implication graph.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'g> {
    graph: &'g TagGraph,
}

impl<'g> Expander<'g> {
    /// Construct new expander over implication graph.
    pub fn new(graph: &'g TagGraph) -> Self {
        Self { graph }
    }

    /// Expand initial tags into accepted and rejected tags.
    #[instrument(skip(self, initial), level = "debug")]
    pub fn expand(&self, initial: &TagMap) -> Resolution {
        let mut resolution = Resolution::default();
        for item in self.walk(initial) {
            if item.negative {
                resolution.rejected.insert(item.tag, item.value);
            } else {
                resolution.accepted.insert(item.tag, item.value);
            }
        }

        resolution
    }

    /// Walk graph breadth first, then pick one occurrence per tag.
    fn walk(&self, initial: &TagMap) -> Vec<TagItem> {
        let mut queue = initial
            .iter()
            .map(|(raw, value)| TagItem::parse(raw, value.as_str(), 0))
            .collect::<VecDeque<_>>();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut items = Vec::new();

        while let Some(item) = queue.pop_front() {
            // INVARIANT: Revisits stay in the running for priority, but never
            //   expand again. Keeps cyclic graphs finite.
            let revisit = seen.get(&item.tag).is_some_and(|depth| *depth <= item.depth);
            if !revisit {
                seen.insert(item.tag.clone(), item.depth);
                if !item.negative {
                    if let Some(children) = self.graph.get(&item.tag) {
                        let depth = item.depth + 1;
                        queue.extend(
                            children
                                .iter()
                                .map(|(raw, value)| TagItem::parse(raw, value.as_str(), depth)),
                        );
                    }
                }
            }
            items.push(item);
        }

        items.sort_by(TagItem::priority);

        let mut unique = HashSet::new();
        items.retain(|item| unique.insert(item.tag.clone()));
        debug!("resolved {} unique tags", items.len());

        items
    }
}
