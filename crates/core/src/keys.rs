//! Key bindings for the manual controls.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A user command the session knows how to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Show,
    Hide,
    CoarseBackward,
    CoarseForward,
    FineBackward,
    FineForward,
    Undo,
    /// Restore parsed timings and the baseline font size.
    Reset,
    GrowFont,
    ShrinkFont,
    ResetFont,
}

/// Maps pressed characters to commands.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    bindings: HashMap<char, Command>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let bindings = [
            ('s', Command::Show),
            ('h', Command::Hide),
            (',', Command::CoarseBackward),
            ('<', Command::CoarseBackward),
            ('.', Command::CoarseForward),
            ('>', Command::CoarseForward),
            ('[', Command::FineBackward),
            (']', Command::FineForward),
            ('u', Command::Undo),
            ('r', Command::Reset),
            ('+', Command::GrowFont),
            ('-', Command::ShrinkFont),
            ('*', Command::ResetFont),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl KeyMap {
    /// Default bindings with `overrides` layered on top.
    /// Each override key must be exactly one character.
    pub fn with_overrides(overrides: &BTreeMap<String, Command>) -> Result<Self> {
        let mut map = Self::default();
        for (key, command) in overrides {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(anyhow!("key binding {key:?} must be a single character"));
            };
            map.bindings.insert(c, *command);
        }
        Ok(map)
    }

    pub fn lookup(&self, key: char) -> Option<Command> {
        self.bindings.get(&key).copied()
    }
}
