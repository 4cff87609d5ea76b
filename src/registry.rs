// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Global registry store.
//!
//! Knot records every installed knot in one user-global registry so that
//! any project directory can be matched up with the packages and targets
//! the user has declared elsewhere on the machine.
//!
//! # Registry Layout
//!
//! The registry lives in a dedicated hidden directory under the user's
//! home profile, at `$HOME/.knotcli/config.json`. It is a JSON mapping
//! with exactly two keys, "package" and "target", each holding a list of
//! `{name, path}` entries where the path names the directory containing a
//! project descriptor, not the descriptor file itself.
//!
//! Within one list a name is unique, unless the user explicitly asks for
//! an overwrite. Entries are only ever appended; nothing in this module
//! shrinks or edits a list.
//!
//! # Soft Failure On Setup
//!
//! [`ensure_exists`] reports registry usability as a plain boolean rather
//! than a typed error. Callers treat "registry unusable" uniformly no
//! matter the root cause, so the underlying I/O error would have nowhere
//! to go anyway.

use crate::{
    descriptor::{self, DescriptorError, KnotType},
    path::{home_dir, NoWayHome},
    serial::{self, Format},
};

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Hidden directory under the home profile holding the registry.
pub const REGISTRY_DIR: &str = ".knotcli";

/// Registry filename inside [`REGISTRY_DIR`].
pub const REGISTRY_FILE: &str = "config.json";

/// User-global record of installed knots, partitioned by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Registry {
    /// Knots that provide a package.
    pub package: Vec<Entry>,

    /// Knots that consume a package.
    pub target: Vec<Entry>,
}

impl Registry {
    /// Entry list for the given knot kind.
    pub fn list(&self, kind: KnotType) -> &[Entry] {
        match kind {
            KnotType::Package => &self.package,
            KnotType::Target => &self.target,
        }
    }

    /// Check whether a name is already installed under the given kind.
    pub fn contains(&self, kind: KnotType, name: &str) -> bool {
        self.list(kind).iter().any(|entry| entry.name == name)
    }

    fn list_mut(&mut self, kind: KnotType) -> &mut Vec<Entry> {
        match kind {
            KnotType::Package => &mut self.package,
            KnotType::Target => &mut self.target,
        }
    }
}

/// One installed knot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entry {
    /// Name of the installed knot.
    pub name: String,

    /// Directory containing the knot's descriptor.
    pub path: PathBuf,
}

/// Determine absolute path to the user registry.
///
/// Derived from the home profile only; performs no I/O and does not check
/// that the path exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn locate() -> Result<PathBuf, NoWayHome> {
    Ok(home_dir()?.join(REGISTRY_DIR).join(REGISTRY_FILE))
}

/// Ensure the registry is in a usable state.
///
/// Creates the registry directory if missing, then an initialized empty
/// registry file if missing. Returns whether the registry is usable after
/// the call; any creation failure yields false instead of an error. An
/// already existing file is accepted as-is.
pub fn ensure_exists() -> bool {
    let Ok(path) = locate() else {
        return false;
    };
    let Some(dir) = path.parent() else {
        return false;
    };

    if !dir.exists() && mkdirp::mkdirp(dir).is_err() {
        return false;
    }

    if !path.exists() {
        let rendered = match serde_json::to_value(Registry::default()) {
            Ok(value) => serial::render(&value, "json", true),
            Err(_) => return false,
        };

        if fs::write(&path, rendered).is_err() {
            return false;
        }

        debug!("created empty registry at {:?}", path.display());
    }
    // TODO: validate the contents of an existing registry file.

    true
}

/// Install a project's knot into the user registry.
///
/// Resolves the descriptor for the given project path and appends a
/// `{name, path}` entry to the registry list matching the knot's kind,
/// then rewrites the registry in full. Returns the installed name.
///
/// # Errors
///
/// - Return [`RegistryError::Descriptor`] if the project descriptor is
///   missing or malformed.
/// - Return [`RegistryError::RegistryUnavailable`] if the registry cannot
///   be read or parsed.
/// - Return [`RegistryError::AlreadyInstalled`] if the name is already
///   taken under the knot's kind and overwrite was not requested. The
///   registry is left untouched.
/// - Return [`RegistryError::RegistryWriteFailed`] if the updated registry
///   cannot be written back.
#[instrument(skip(project_path), level = "debug")]
pub fn install(project_path: impl AsRef<Path>, overwrite: bool) -> Result<String> {
    let (dir, rc_path) = descriptor::resolve(project_path.as_ref());
    let knot = descriptor::load(&rc_path)?;

    let registry_path = locate()?;
    let mut registry = read(&registry_path)?;

    if !overwrite && registry.contains(knot.knot_type, &knot.name) {
        return Err(RegistryError::AlreadyInstalled { name: knot.name });
    }

    // Overwrite only bypasses the duplicate check. A repeated install
    // appends another entry under the same name instead of replacing the
    // first one.
    registry.list_mut(knot.knot_type).push(Entry {
        name: knot.name.clone(),
        path: dir,
    });

    commit(&registry_path, &registry)?;
    debug!("installed {} into {} list", knot.name, knot.knot_type);

    Ok(knot.name)
}

fn read(path: &Path) -> Result<Registry> {
    let load = || -> std::result::Result<Registry, Box<dyn std::error::Error + Send + Sync>> {
        let text = fs::read_to_string(path)?;
        Ok(serial::parse(&text, Format::Json)?)
    };

    load().map_err(|source| RegistryError::RegistryUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

fn commit(path: &Path, registry: &Registry) -> Result<()> {
    let value =
        serde_json::to_value(registry).map_err(|source| RegistryError::RegistryWriteFailed {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

    fs::write(path, serial::render(&value, "json", true)).map_err(|source| {
        RegistryError::RegistryWriteFailed {
            path: path.to_path_buf(),
            source: Box::new(source),
        }
    })
}

/// All possible error types for registry store interaction.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Project descriptor is missing or malformed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Registry location cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] NoWayHome),

    /// Registry exists, but cannot be read or parsed.
    #[error("failed to load user registry at {path:?}")]
    RegistryUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A knot with the same name is already installed under this kind.
    #[error("{name} is already installed, if you would like to overwrite it add the '--overwrite' flag")]
    AlreadyInstalled { name: String },

    /// Updated registry cannot be written back.
    #[error("failed to update user registry at {path:?}")]
    RegistryWriteFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Friendly result alias :3
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::env;

    fn hijack_home() -> anyhow::Result<PathBuf> {
        let home = env::current_dir()?;
        env::set_var("HOME", &home);
        Ok(home)
    }

    fn registry_file(home: &Path) -> PathBuf {
        home.join(REGISTRY_DIR).join(REGISTRY_FILE)
    }

    fn write_descriptor(dir: &Path, name: &str, kind: &str) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        let text = formatdoc! {r#"
            {{
                "name": "{name}",
                "language": "nodejs/npm",
                "type": "{kind}",
                "use_symlink": true,
                "build_command": "npm run watch",
                "knot_version": "0.1.0"
            }}"#};
        fs::write(dir.join(descriptor::DESCRIPTOR_FILE), text)?;

        Ok(())
    }

    fn read_back(home: &Path) -> anyhow::Result<Registry> {
        let text = fs::read_to_string(registry_file(home))?;
        Ok(serial::parse(&text, Format::Json)?)
    }

    #[sealed_test]
    fn locate_is_home_anchored() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert_eq!(locate()?, home.join(".knotcli/config.json"));
        Ok(())
    }

    #[sealed_test]
    fn ensure_exists_creates_empty_registry() -> anyhow::Result<()> {
        let home = hijack_home()?;

        assert!(ensure_exists());

        let written = fs::read_to_string(registry_file(&home))?;
        let expect = indoc! {r#"
            {
                "package": [],
                "target": []
            }"#};
        assert_eq!(written, expect);

        Ok(())
    }

    #[sealed_test]
    fn ensure_exists_is_idempotent() -> anyhow::Result<()> {
        let home = hijack_home()?;

        assert!(ensure_exists());
        let first = fs::read_to_string(registry_file(&home))?;

        assert!(ensure_exists());
        let second = fs::read_to_string(registry_file(&home))?;
        assert_eq!(first, second);

        Ok(())
    }

    #[sealed_test]
    fn ensure_exists_accepts_existing_corrupt_registry() -> anyhow::Result<()> {
        let home = hijack_home()?;
        fs::create_dir(home.join(REGISTRY_DIR))?;
        fs::write(registry_file(&home), "definitely not json")?;

        // Contents are not validated here; a later load is what fails.
        assert!(ensure_exists());
        assert_eq!(
            fs::read_to_string(registry_file(&home))?,
            "definitely not json"
        );

        Ok(())
    }

    #[sealed_test]
    fn install_appends_package_entry() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert!(ensure_exists());

        let project = home.join("p");
        write_descriptor(&project, "lib", "package")?;

        let name = install(&project, false)?;
        assert_eq!(name, "lib");

        let registry = read_back(&home)?;
        let expect = vec![Entry {
            name: "lib".into(),
            path: project,
        }];
        assert_eq!(registry.package, expect);
        assert!(registry.target.is_empty());

        Ok(())
    }

    #[sealed_test]
    fn install_accepts_explicit_descriptor_path() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert!(ensure_exists());

        let project = home.join("p");
        write_descriptor(&project, "lib", "target")?;

        install(project.join(descriptor::DESCRIPTOR_FILE), false)?;

        let registry = read_back(&home)?;
        assert_eq!(registry.target[0].path, project);

        Ok(())
    }

    #[sealed_test]
    fn duplicate_install_without_overwrite_is_rejected() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert!(ensure_exists());

        let project = home.join("p");
        write_descriptor(&project, "lib", "package")?;

        install(&project, false)?;
        let result = install(&project, false);

        assert!(matches!(
            result,
            Err(RegistryError::AlreadyInstalled { .. })
        ));
        assert_eq!(read_back(&home)?.package.len(), 1);

        Ok(())
    }

    #[sealed_test]
    fn duplicate_install_with_overwrite_appends_again() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert!(ensure_exists());

        let project = home.join("p");
        write_descriptor(&project, "lib", "package")?;

        install(&project, false)?;
        install(&project, true)?;
        install(&project, true)?;

        let registry = read_back(&home)?;
        assert_eq!(registry.package.len(), 3);
        assert!(registry.package.iter().all(|entry| entry.name == "lib"));

        Ok(())
    }

    #[sealed_test]
    fn same_name_under_other_kind_is_not_a_duplicate() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert!(ensure_exists());

        write_descriptor(&home.join("p"), "lib", "package")?;
        write_descriptor(&home.join("t"), "lib", "target")?;

        install(home.join("p"), false)?;
        install(home.join("t"), false)?;

        let registry = read_back(&home)?;
        assert_eq!(registry.package.len(), 1);
        assert_eq!(registry.target.len(), 1);

        Ok(())
    }

    #[sealed_test]
    fn install_without_descriptor_fails() -> anyhow::Result<()> {
        let home = hijack_home()?;
        assert!(ensure_exists());

        let result = install(home.join("missing"), false);
        assert!(matches!(
            result,
            Err(RegistryError::Descriptor(DescriptorError::NotFound { .. }))
        ));

        Ok(())
    }

    #[sealed_test]
    fn install_with_corrupt_registry_is_unavailable() -> anyhow::Result<()> {
        let home = hijack_home()?;
        fs::create_dir(home.join(REGISTRY_DIR))?;
        fs::write(registry_file(&home), "definitely not json")?;

        let project = home.join("p");
        write_descriptor(&project, "lib", "package")?;

        let result = install(&project, false);
        assert!(matches!(
            result,
            Err(RegistryError::RegistryUnavailable { .. })
        ));

        Ok(())
    }
}
