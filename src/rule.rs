// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Weaving rules.
//!
//! A __rule__ binds an output file to the fragments that make it up. Each rule
//! names one or more search directories relative to every component
//! directory, a regular expression that fragment paths must match, and
//! optionally the permission bits of the output file.

use crate::config::RuleDeclaration;

use regex::Regex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    num::ParseIntError,
    str::FromStr,
};

/// Permission bits of an output file.
///
/// # Invariant
///
/// - Always within `0o000..=0o777`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mode(u32);

impl Mode {
    /// Largest permission bits allowed.
    pub const MAX: u32 = 0o777;

    /// Construct new mode from permission bits.
    ///
    /// # Errors
    ///
    /// - Return [`RuleError::ModeOutOfRange`] if bits exceed `0o777`.
    pub fn new(bits: u32) -> Result<Self> {
        if bits > Self::MAX {
            return Err(RuleError::ModeOutOfRange {
                mode: format!("{bits:o}"),
            });
        }

        Ok(Self(bits))
    }

    /// Raw permission bits.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self(0o644)
    }
}

impl FromStr for Mode {
    type Err = RuleError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        let bits = u32::from_str_radix(mode, 8).map_err(|source| RuleError::InvalidMode {
            mode: mode.to_string(),
            source,
        })?;

        Self::new(bits).map_err(|_| RuleError::ModeOutOfRange {
            mode: mode.to_string(),
        })
    }
}

impl Display for Mode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{:o}", self.0)
    }
}

/// Compiled weaving rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Search directories relative to each component directory.
    pub directories: Vec<String>,

    /// Pattern that fragment paths must match.
    pub pattern: Regex,

    /// Permission bits of output file.
    pub mode: Option<Mode>,
}

impl Rule {
    /// Compile raw rule declaration.
    ///
    /// The plural directory listing comes first, followed by the singular
    /// directory if one was given.
    ///
    /// # Errors
    ///
    /// - Return [`RuleError::Pattern`] if pattern is not a valid regular
    ///   expression.
    /// - Return [`RuleError::InvalidMode`] if mode is not an octal number.
    /// - Return [`RuleError::ModeOutOfRange`] if mode exceeds `0o777`.
    pub fn compile(declaration: RuleDeclaration) -> Result<Self> {
        let RuleDeclaration {
            dir,
            mut dirs,
            pat,
            mode,
        } = declaration;

        if let Some(dir) = dir.filter(|dir| !dir.is_empty()) {
            dirs.push(dir);
        }

        let pattern = Regex::new(&pat)?;
        let mode = mode
            .filter(|mode| !mode.is_empty())
            .map(|mode| mode.parse::<Mode>())
            .transpose()?;

        Ok(Self {
            directories: dirs,
            pattern,
            mode,
        })
    }
}

/// Rule compilation error types.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Mode is not an octal number.
    #[error("invalid octal mode {mode:?}")]
    InvalidMode {
        mode: String,
        #[source]
        source: ParseIntError,
    },

    /// Mode does not fit in permission bits.
    #[error("mode {mode:?} out of range 0..=777")]
    ModeOutOfRange { mode: String },

    /// Pattern is not a valid regular expression.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Friendly result alias :3
pub type Result<T, E = RuleError> = std::result::Result<T, E>;
