// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Rules and capability declarations are allowed to refer to the user's home
//! directory through the usual `~/` shorthand. Expansion goes through the
//! [`Host`] so that tests can pin the home directory to anything they like.

use crate::host::Host;

use std::path::PathBuf;

/// Expand leading home directory shorthand in a path.
///
/// Only a bare `~` or a leading `~/` is expanded. Everything else, including
/// `~user/...`, is returned untouched.
///
/// # Errors
///
/// - Return [`NoWayHome`] if the path needs expansion, but the home directory
///   cannot be determined.
pub fn expand_home(host: &impl Host, path: impl AsRef<str>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path != "~" && !path.starts_with("~/") {
        return Ok(PathBuf::from(path));
    }

    let home = host.home_dir().ok_or(NoWayHome)?;
    let expanded =
        shellexpand::tilde_with_context(path, || Some(home.to_string_lossy().into_owned()));

    Ok(PathBuf::from(expanded.into_owned()))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
