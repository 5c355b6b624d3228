// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Weave dotfiles out of tagged fragments.
//!
//! Polkadot builds configuration files by concatenating __fragments__ picked
//! from one or more __component directories__. Each fragment names the tags it
//! needs in its file name, so `aliases_linux_zsh.sh` only makes it into the
//! output when both "linux" and "zsh" hold. Tags come from entry documents,
//! are expanded through a tag implication graph with negation, and are joined
//! by capabilities collected from the host. Fragments tagged "gtp" are
//! rendered as templates against the final tag map.
//!
//! See [`app::App`] for the whole pipeline.

pub mod app;
pub mod collect;
pub mod config;
pub mod generate;
pub mod host;
pub mod path;
pub mod rule;
pub mod tag;
pub mod weave;

pub use app::{App, AppError, Plan};
pub use host::{Host, OsHost};
