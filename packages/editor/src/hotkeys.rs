//! Keyboard shortcuts: key combination → editor action
//!
//! Combinations are plain strings (`"mod+shift+z"`). `mod` stands for the
//! platform command key; `cmd`, `ctrl`, `meta` and `control` all normalize to
//! it, and modifiers are reordered so `"Shift+Cmd+Z"` and `"mod+shift+z"`
//! resolve to the same binding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotkeyAction {
    Undo,
    Redo,
    Lock,
    Unlock,
    Hide,
    Show,
    Copy,
    Cut,
    Paste,
    Delete,
    ClearSelection,
}

impl HotkeyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotkeyAction::Undo => "undo",
            HotkeyAction::Redo => "redo",
            HotkeyAction::Lock => "lock",
            HotkeyAction::Unlock => "unlock",
            HotkeyAction::Hide => "hide",
            HotkeyAction::Show => "show",
            HotkeyAction::Copy => "copy",
            HotkeyAction::Cut => "cut",
            HotkeyAction::Paste => "paste",
            HotkeyAction::Delete => "delete",
            HotkeyAction::ClearSelection => "clearSelection",
        }
    }
}

impl std::fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const MODIFIERS: [&str; 3] = ["mod", "alt", "shift"];

/// Canonical form of a key combination
pub fn normalize(combo: &str) -> String {
    let mut modifiers: Vec<&str> = Vec::new();
    let mut key: Option<String> = None;

    for part in combo.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        let part = part.to_lowercase();
        let canonical = match part.as_str() {
            "mod" | "cmd" | "command" | "meta" | "ctrl" | "control" => Some("mod"),
            "alt" | "option" => Some("alt"),
            "shift" => Some("shift"),
            _ => None,
        };
        match canonical {
            Some(modifier) if !modifiers.contains(&modifier) => modifiers.push(modifier),
            Some(_) => {}
            None => {
                let name = match part.as_str() {
                    "esc" => "escape",
                    "del" => "delete",
                    other => other,
                };
                key = Some(name.to_string());
            }
        }
    }

    let mut parts: Vec<String> = MODIFIERS
        .iter()
        .filter(|m| modifiers.contains(*m))
        .map(|m| m.to_string())
        .collect();
    parts.extend(key);
    parts.join("+")
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, HotkeyAction>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::with_defaults()
    }

    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut keymap = Self::empty();

        // History
        keymap.bind("mod+z", HotkeyAction::Undo);
        keymap.bind("mod+shift+z", HotkeyAction::Redo);
        keymap.bind("mod+y", HotkeyAction::Redo);

        // Clipboard
        keymap.bind("mod+c", HotkeyAction::Copy);
        keymap.bind("mod+x", HotkeyAction::Cut);
        keymap.bind("mod+v", HotkeyAction::Paste);

        // Structure
        keymap.bind("backspace", HotkeyAction::Delete);
        keymap.bind("delete", HotkeyAction::Delete);
        keymap.bind("escape", HotkeyAction::ClearSelection);

        // Design-time flags
        keymap.bind("mod+l", HotkeyAction::Lock);
        keymap.bind("mod+shift+l", HotkeyAction::Unlock);
        keymap.bind("mod+h", HotkeyAction::Hide);
        keymap.bind("mod+shift+h", HotkeyAction::Show);

        keymap
    }

    /// Bind a combination, returning the action it replaced
    pub fn bind(&mut self, combo: &str, action: HotkeyAction) -> Option<HotkeyAction> {
        self.bindings.insert(normalize(combo), action)
    }

    pub fn unbind(&mut self, combo: &str) -> Option<HotkeyAction> {
        self.bindings.remove(&normalize(combo))
    }

    pub fn resolve(&self, combo: &str) -> Option<HotkeyAction> {
        self.bindings.get(&normalize(combo)).copied()
    }

    /// Every combination bound to `action`, sorted
    pub fn combos_for(&self, action: HotkeyAction) -> Vec<String> {
        let mut combos: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == action)
            .map(|(combo, _)| combo.clone())
            .collect();
        combos.sort();
        combos
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
