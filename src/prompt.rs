// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive questionnaire engine.
//!
//! Knot collects its configuration through an ordered list of declarative
//! prompt specifications instead of hand-written input loops. Each prompt
//! names the result key it fills, the way it collects its value, and
//! optionally a predicate that decides whether it runs at all based on the
//! answers collected so far.
//!
//! # Execution Order
//!
//! The engine executes prompts strictly in declared order and never
//! reorders them. A predicate may only look at keys produced by prompts
//! declared strictly earlier in the sequence; there is no forward
//! reference. When a predicate returns false its prompt is skipped
//! entirely: no terminal interaction happens, and no key is written to the
//! result.
//!
//! # Collaborators
//!
//! All terminal interaction goes through the [`Prompter`] trait, so the
//! engine itself stays pure given its collaborator. [`ConsolePrompter`]
//! talks to a real terminal through inquire, while [`ScriptedPrompter`]
//! replays canned responses for non-interactive runs.

use serde_json::{Map, Value};
use std::{
    collections::VecDeque,
    io::{self, Write},
};

/// Flat key/value result of a questionnaire run.
///
/// Keys follow prompt declaration order. Skipped prompts leave no key
/// behind, rather than a null value.
pub type Answers = Map<String, Value>;

/// Pure gate deciding whether a prompt runs, given the partial result
/// collected so far.
pub type Predicate = fn(&Answers) -> bool;

/// One declarative questionnaire step.
#[derive(Clone, Debug)]
pub struct Prompt {
    key: String,
    kind: PromptKind,
    when: Option<Predicate>,
    cast: Option<Cast>,
}

/// The ways a prompt can collect its value.
#[derive(Clone, Debug)]
pub enum PromptKind {
    /// Free-form line of input with an optional fallback value.
    Text {
        message: String,
        default: Option<String>,
    },

    /// Single choice out of a fixed menu of options.
    Select {
        message: String,
        options: Vec<String>,
    },

    /// Fixed value assigned without any terminal interaction.
    Static { value: Value },
}

/// Transform applied to a collected value before storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cast {
    /// Case-insensitive "yes"/"y" becomes true, everything else false.
    Bool,
}

impl Prompt {
    /// Construct new free-form text prompt.
    pub fn text(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: PromptKind::Text {
                message: message.into(),
                default: None,
            },
            when: None,
            cast: None,
        }
    }

    /// Construct new single-choice select prompt.
    pub fn select(
        key: impl Into<String>,
        message: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            key: key.into(),
            kind: PromptKind::Select {
                message: message.into(),
                options: options.into_iter().map(Into::into).collect(),
            },
            when: None,
            cast: None,
        }
    }

    /// Construct new static assignment.
    pub fn fixed(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            kind: PromptKind::Static {
                value: value.into(),
            },
            when: None,
            cast: None,
        }
    }

    /// Merge a fallback value into this prompt (text prompts only).
    ///
    /// The fallback shows up in the prompt message in parentheses, and is
    /// used whenever the trimmed input comes back empty.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        if let PromptKind::Text { default: slot, .. } = &mut self.kind {
            *slot = Some(default.into());
        }

        self
    }

    /// Gate this prompt behind a predicate over earlier answers.
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.when = Some(predicate);
        self
    }

    /// Apply a cast to the collected value before storage.
    pub fn cast(mut self, cast: Cast) -> Self {
        self.cast = Some(cast);
        self
    }
}

/// Layer of indirection for terminal interaction.
pub trait Prompter {
    /// Read one line of input for the given message.
    fn text(&mut self, message: &str) -> Result<String>;

    /// Pick one option out of a menu for the given message.
    ///
    /// The menu supports at least up-down navigation with a single confirm
    /// action. No multi-select.
    fn select(&mut self, message: &str, options: &[String]) -> Result<String>;

    /// Write text back to the user.
    fn show(&mut self, text: &str);

    /// Clear the screen so stale prompts do not linger. Purely cosmetic.
    fn clear(&mut self);
}

/// Questionnaire engine over a prompter collaborator.
pub struct Questionnaire<'p, P>
where
    P: Prompter,
{
    prompter: &'p mut P,
}

impl<'p, P> Questionnaire<'p, P>
where
    P: Prompter,
{
    /// Construct new questionnaire engine.
    pub fn new(prompter: &'p mut P) -> Self {
        Self { prompter }
    }

    /// Run every surviving prompt in declared order.
    ///
    /// The screen is cleared before the first prompt and after each
    /// executed prompt. Skipped prompts trigger no interaction at all.
    ///
    /// # Errors
    ///
    /// - Return [`PromptError`] if the prompter fails to collect a value.
    pub fn run(&mut self, prompts: &[Prompt]) -> Result<Answers> {
        let mut answers = Answers::new();
        self.prompter.clear();

        for prompt in prompts {
            // INVARIANT: Predicates observe answers of earlier prompts only.
            if let Some(when) = prompt.when {
                if !when(&answers) {
                    continue;
                }
            }

            let value = match &prompt.kind {
                PromptKind::Static { value } => value.clone(),
                PromptKind::Text { message, default } => {
                    let message = match default {
                        Some(default) => format!("{message} ({default})"),
                        None => message.clone(),
                    };
                    let line = self.prompter.text(&message)?;
                    let line = line.trim();

                    match (line.is_empty(), default) {
                        (true, Some(default)) => Value::String(default.clone()),
                        _ => Value::String(line.to_owned()),
                    }
                }
                PromptKind::Select { message, options } => {
                    Value::String(self.prompter.select(message, options)?)
                }
            };

            let value = match prompt.cast {
                Some(Cast::Bool) => cast_bool(value),
                None => value,
            };

            answers.insert(prompt.key.clone(), value);
            self.prompter.clear();
        }

        Ok(answers)
    }
}

fn cast_bool(value: Value) -> Value {
    let truthy = value
        .as_str()
        .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "yes" | "y"));

    Value::Bool(truthy)
}

/// Terminal prompter backed by inquire.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn text(&mut self, message: &str) -> Result<String> {
        Ok(inquire::Text::new(message).prompt()?)
    }

    fn select(&mut self, message: &str, options: &[String]) -> Result<String> {
        Ok(inquire::Select::new(message, options.to_vec()).prompt()?)
    }

    fn show(&mut self, text: &str) {
        println!("{text}");
    }

    fn clear(&mut self) {
        // ESC c is the full terminal reset.
        print!("\x1bc");
        let _ = io::stdout().flush();
    }
}

/// Prompter that replays a fixed sequence of responses.
///
/// Text input and menu selections are consumed from one response queue in
/// prompt order. Anything shown back to the user is recorded instead of
/// printed. Useful for non-interactive runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    responses: VecDeque<String>,
    shown: Vec<String>,
}

impl ScriptedPrompter {
    /// Construct new scripted prompter from queued responses.
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            shown: Vec::new(),
        }
    }

    /// Everything recorded through [`Prompter::show`] so far.
    pub fn transcript(&self) -> &[String] {
        &self.shown
    }

    fn next_response(&mut self) -> Result<String> {
        self.responses.pop_front().ok_or(PromptError::ScriptExhausted)
    }
}

impl Prompter for ScriptedPrompter {
    fn text(&mut self, _message: &str) -> Result<String> {
        self.next_response()
    }

    fn select(&mut self, _message: &str, options: &[String]) -> Result<String> {
        let response = self.next_response()?;

        // INVARIANT: A scripted selection must name one of the menu options.
        if !options.iter().any(|option| option == &response) {
            return Err(PromptError::UnknownOption { response });
        }

        Ok(response)
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_owned());
    }

    fn clear(&mut self) {}
}

/// All possible error types for questionnaire interaction.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Interactive prompt collection failed.
    #[error(transparent)]
    Inquire(#[from] inquire::InquireError),

    /// Scripted prompter ran out of queued responses.
    #[error("scripted prompter has no response left to give")]
    ScriptExhausted,

    /// Scripted selection does not match any menu option.
    #[error("scripted response {response:?} matches no menu option")]
    UnknownOption { response: String },
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
