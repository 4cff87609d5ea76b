// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevant path information for the files that knot needs to
//! interact with, and normalize the paths the user hands to the CLI.

use std::{
    env,
    path::{Path, PathBuf},
};

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf, NoWayHome> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Resolve a user-supplied project path to absolute form.
///
/// Performs shell expansion on the input, trims any trailing path
/// separators, and anchors relative paths at the current working
/// directory. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`PathError::ShellExpansion`] if shell expansion fails.
/// - Return [`PathError::NoWorkingDirectory`] if the working directory
///   cannot be determined for a relative input.
pub fn project_path(input: impl AsRef<str>) -> Result<PathBuf> {
    let expanded = shellexpand::full(input.as_ref())?;
    let trimmed = expanded.trim_end_matches('/');
    let path = Path::new(trimmed);

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(PathError::NoWorkingDirectory)?
            .join(path)
    };

    // INVARIANT: Normalize away any `.` components picked up from input.
    Ok(absolute.components().collect())
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// All possible error types for path resolution.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Shell expansion of a user-supplied path fails.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Current working directory cannot be determined.
    #[error("cannot determine current working directory")]
    NoWorkingDirectory(#[source] std::io::Error),
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn project_path_anchors_relative_input() -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        assert_eq!(project_path("some/project")?, cwd.join("some/project"));
        Ok(())
    }

    #[sealed_test]
    fn project_path_normalizes_dot_input() -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        assert_eq!(project_path(".")?, cwd);
        Ok(())
    }

    #[test]
    fn project_path_trims_trailing_separators() -> anyhow::Result<()> {
        assert_eq!(project_path("/some/project///")?, Path::new("/some/project"));
        Ok(())
    }

    #[sealed_test(env = [("KNOT_TEST_PROJECT", "/expanded/project")])]
    fn project_path_expands_variables() -> anyhow::Result<()> {
        assert_eq!(
            project_path("$KNOT_TEST_PROJECT")?,
            Path::new("/expanded/project")
        );
        Ok(())
    }
}
