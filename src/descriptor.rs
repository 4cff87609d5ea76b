// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project descriptor store.
//!
//! Every knot is anchored to its project directory by a descriptor file
//! named ".knotrc" at the top level. The descriptor records everything the
//! rest of knot needs to know about the project: the name the knot gets
//! referenced by, the language/package manager in play, whether the project
//! is a package or a target, and a couple of settings that only exist for
//! certain answers to the earlier questions.
//!
//! # Lifecycle
//!
//! A descriptor is created exactly once, through the interactive
//! questionnaire run by [`initialize`]. Nothing ever rewrites or migrates
//! an existing descriptor: attempting to reinitialize a directory that
//! already has one is a hard error. Later operations read the descriptor
//! back through [`load`].
//!
//! # Confirmation Loop
//!
//! Initialization shows the collected result back to the user, rendered
//! the same way it lands on disk, and asks for confirmation. A declined
//! confirmation throws the answers away and collects everything again.
//! There is no abort path; the loop only ends on an affirmative answer.

use crate::{
    prompt::{Cast, Prompt, Prompter, Questionnaire},
    serial::{self, Format},
    VERSION,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    ffi::OsStr,
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Fixed descriptor filename expected at a project's top level.
pub const DESCRIPTOR_FILE: &str = ".knotrc";

/// Per-project descriptor record.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Descriptor {
    /// Name the knot gets referenced by.
    pub name: String,

    /// Language/package manager the project uses.
    pub language: Language,

    /// Whether the project provides a package or consumes one.
    #[serde(rename = "type")]
    pub knot_type: KnotType,

    /// Link through symlinks instead of syncing copies. Packages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_symlink: Option<bool>,

    /// Build watcher command. nodejs/npm projects only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,

    /// Version of knot the descriptor was created with.
    pub knot_version: String,
}

/// Languages/package managers a knot can track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Language {
    #[serde(rename = "nodejs/npm")]
    NodeNpm,

    #[serde(rename = "php/composer")]
    PhpComposer,
}

impl Language {
    /// Every supported language/package manager, in menu order.
    pub const ALL: [Self; 2] = [Self::NodeNpm, Self::PhpComposer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeNpm => "nodejs/npm",
            Self::PhpComposer => "php/composer",
        }
    }
}

impl Display for Language {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

/// The two kinds of knot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KnotType {
    /// Source of code that gets installed elsewhere.
    Package,

    /// Destination that consumes a package.
    Target,
}

impl KnotType {
    /// Both knot kinds, in menu order.
    pub const ALL: [Self; 2] = [Self::Package, Self::Target];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Target => "target",
        }
    }
}

impl Display for KnotType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

/// Split a project path into its directory and descriptor file path.
///
/// Appends the descriptor filename unless the path already names it.
pub fn resolve(path: impl AsRef<Path>) -> (PathBuf, PathBuf) {
    let path = path.as_ref();

    if path.file_name() == Some(OsStr::new(DESCRIPTOR_FILE)) {
        let dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        (dir, path.to_path_buf())
    } else {
        (path.to_path_buf(), path.join(DESCRIPTOR_FILE))
    }
}

/// Canonical questionnaire for initializing a project descriptor.
///
/// Conditional prompts only look at keys collected by earlier prompts:
/// symlink use is only asked for packages, and the build watcher command
/// is only asked for nodejs/npm projects.
pub fn project_prompts(dir: impl AsRef<Path>) -> Vec<Prompt> {
    let basename = dir
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    vec![
        // Names get used whenever the knot is referenced.
        Prompt::text("name", "What would you like this knot to be called?").with_default(basename),
        Prompt::select(
            "language",
            "What language/package manager is being used?",
            Language::ALL.map(|language| language.to_string()),
        ),
        Prompt::select(
            "type",
            "Is this a package or target?",
            KnotType::ALL.map(|kind| kind.to_string()),
        ),
        // Skipping symlinks syncs changes from package to target instead,
        // keeping a copy in both folders. Useful where targets are mounted
        // and cannot reach the host's symlinks.
        Prompt::select(
            "use_symlink",
            "Would you like to use symlinks when linking this package?",
            ["yes", "no"],
        )
        .cast(Cast::Bool)
        .when(|answers| answers.get("type").and_then(Value::as_str) == Some("package")),
        Prompt::text(
            "build_command",
            "What is the build watcher command (ex. npm run watch)?",
        )
        .when(|answers| answers.get("language").and_then(Value::as_str) == Some("nodejs/npm")),
        Prompt::fixed("knot_version", VERSION),
    ]
}

/// Initialize a project directory with a new descriptor.
///
/// Runs the canonical questionnaire, shows the rendered result back, and
/// keeps collecting until the user confirms with an empty or "yes" answer.
/// The confirmed result is committed in one full-file write.
///
/// # Errors
///
/// - Return [`DescriptorError::AlreadyInitialized`] if the directory
///   already holds a descriptor. The questionnaire never runs in that
///   case.
/// - Return [`DescriptorError::Prompt`] if questionnaire collection fails.
/// - Return [`DescriptorError::Write`] if the descriptor cannot be
///   written.
pub fn initialize(dir: impl AsRef<Path>, prompter: &mut impl Prompter) -> Result<()> {
    let dir = dir.as_ref();
    let (_, rc_path) = resolve(dir);

    if rc_path.exists() {
        return Err(DescriptorError::AlreadyInitialized { path: rc_path });
    }

    info!("initialize new knot: {:?}", dir.display());
    let rendered = loop {
        let answers = Questionnaire::new(prompter).run(&project_prompts(dir))?;
        let rendered = serial::render(&Value::Object(answers), "json", true);
        prompter.show(&format!(
            "About to write to {:?}\n\n{}\n",
            rc_path.display(),
            rendered
        ));

        let answer = prompter.text("Is this okay (yes)?")?;
        if matches!(answer.trim().to_lowercase().as_str(), "" | "yes") {
            break rendered;
        }
    };

    fs::write(&rc_path, rendered).map_err(|source| DescriptorError::Write {
        path: rc_path,
        source,
    })
}

/// Load a descriptor from its file path.
///
/// # Errors
///
/// - Return [`DescriptorError::NotFound`] if no descriptor file exists at
///   the path.
/// - Return [`DescriptorError::MalformedConfig`] if the descriptor exists
///   but cannot be read or parsed.
pub fn load(path: impl AsRef<Path>) -> Result<Descriptor> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DescriptorError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let text = fs::read_to_string(path).map_err(|source| DescriptorError::MalformedConfig {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    serial::parse(&text, Format::Json).map_err(|source| DescriptorError::MalformedConfig {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// All possible error types for descriptor store interaction.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// A descriptor already exists at the target path.
    #[error("{path:?} already exists, cannot reinitialize")]
    AlreadyInitialized { path: PathBuf },

    /// No descriptor exists at the target path.
    #[error("{path:?} doesn't exist, run 'knot init' on its directory before trying to install the knot")]
    NotFound { path: PathBuf },

    /// Descriptor exists, but cannot be read or parsed.
    #[error("failed to load knot at {path:?}")]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Questionnaire collection failed.
    #[error(transparent)]
    Prompt(#[from] crate::prompt::PromptError),

    /// Descriptor cannot be written.
    #[error("failed to write descriptor to {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Friendly result alias :3
pub type Result<T, E = DescriptorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use indoc::formatdoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::env;

    fn package_prompter(name: &str) -> ScriptedPrompter {
        // name, language, type, use_symlink, build_command, confirmation
        ScriptedPrompter::new([name, "nodejs/npm", "package", "yes", "npm run watch", ""])
    }

    #[sealed_test]
    fn initialize_writes_confirmed_descriptor() -> anyhow::Result<()> {
        let dir = env::current_dir()?.join("lib");
        fs::create_dir(&dir)?;

        initialize(&dir, &mut package_prompter("lib"))?;

        let written = fs::read_to_string(dir.join(DESCRIPTOR_FILE))?;
        let expect = formatdoc! {r#"
            {{
                "name": "lib",
                "language": "nodejs/npm",
                "type": "package",
                "use_symlink": true,
                "build_command": "npm run watch",
                "knot_version": "{VERSION}"
            }}"#};
        assert_eq!(written, expect);

        Ok(())
    }

    #[sealed_test]
    fn initialize_defaults_name_to_directory_basename() -> anyhow::Result<()> {
        let dir = env::current_dir()?.join("widget");
        fs::create_dir(&dir)?;

        // Empty name answer falls back to the directory basename.
        let mut prompter = ScriptedPrompter::new(["", "php/composer", "target", ""]);
        initialize(&dir, &mut prompter)?;

        let knot = load(dir.join(DESCRIPTOR_FILE))?;
        assert_eq!(knot.name, "widget");
        assert_eq!(knot.language, Language::PhpComposer);
        assert_eq!(knot.knot_type, KnotType::Target);
        assert_eq!(knot.use_symlink, None);
        assert_eq!(knot.build_command, None);

        Ok(())
    }

    #[sealed_test]
    fn initialize_refuses_reinitialization() -> anyhow::Result<()> {
        let dir = env::current_dir()?;
        fs::write(dir.join(DESCRIPTOR_FILE), "{}")?;

        // No responses queued: the questionnaire must never run.
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let result = initialize(&dir, &mut prompter);

        assert!(matches!(
            result,
            Err(DescriptorError::AlreadyInitialized { .. })
        ));
        assert_eq!(fs::read_to_string(dir.join(DESCRIPTOR_FILE))?, "{}");

        Ok(())
    }

    #[sealed_test]
    fn declined_confirmation_collects_answers_again() -> anyhow::Result<()> {
        let dir = env::current_dir()?.join("lib");
        fs::create_dir(&dir)?;

        // First pass declined, second pass confirmed under another name.
        let mut prompter = ScriptedPrompter::new([
            "first", "php/composer", "target", "no", "second", "php/composer", "target", "yes",
        ]);
        initialize(&dir, &mut prompter)?;

        let knot = load(dir.join(DESCRIPTOR_FILE))?;
        assert_eq!(knot.name, "second");

        Ok(())
    }

    #[sealed_test]
    fn load_missing_descriptor_is_not_found() {
        let result = load(Path::new("missing").join(DESCRIPTOR_FILE));
        assert!(matches!(result, Err(DescriptorError::NotFound { .. })));
    }

    #[sealed_test]
    fn load_rejects_malformed_descriptor() -> anyhow::Result<()> {
        fs::write(DESCRIPTOR_FILE, "{ not json")?;

        let result = load(DESCRIPTOR_FILE);
        assert!(matches!(
            result,
            Err(DescriptorError::MalformedConfig { .. })
        ));

        Ok(())
    }

    #[test]
    fn resolve_appends_descriptor_filename() {
        let (dir, file) = resolve("/p");
        assert_eq!(dir, Path::new("/p"));
        assert_eq!(file, Path::new("/p/.knotrc"));
    }

    #[test]
    fn resolve_keeps_explicit_descriptor_path() {
        let (dir, file) = resolve("/p/.knotrc");
        assert_eq!(dir, Path::new("/p"));
        assert_eq!(file, Path::new("/p/.knotrc"));
    }

    #[test]
    fn descriptor_deserializes_conditional_fields() -> anyhow::Result<()> {
        let knot: Descriptor = serial::parse(
            r#"{
                "name": "lib",
                "language": "nodejs/npm",
                "type": "package",
                "use_symlink": true,
                "build_command": "npm run watch",
                "knot_version": "0.1.0"
            }"#,
            Format::Json,
        )?;

        let expect = Descriptor {
            name: "lib".into(),
            language: Language::NodeNpm,
            knot_type: KnotType::Package,
            use_symlink: Some(true),
            build_command: Some("npm run watch".into()),
            knot_version: "0.1.0".into(),
        };
        assert_eq!(knot, expect);

        Ok(())
    }
}
