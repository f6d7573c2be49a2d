//! Key bindings owned by a table view

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::component::{KeyOutcome, MenuHint};
use super::table::TableModel;

/// Normalized key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Key {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Shift is folded into the character itself
    pub fn from_event(evt: &KeyEvent) -> Self {
        let mut modifiers = evt.modifiers;
        if let KeyCode::Char(_) = evt.code {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self::new(evt.code, modifiers)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("ctrl-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("alt-")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Esc => f.write_str("esc"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::Delete => f.write_str("del"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Home => f.write_str("home"),
            KeyCode::End => f.write_str("end"),
            KeyCode::PageUp => f.write_str("pgup"),
            KeyCode::PageDown => f.write_str("pgdn"),
            KeyCode::F(n) => write!(f, "f{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

pub type ActionHandler = Arc<dyn Fn(&mut TableModel, &KeyEvent) -> KeyOutcome + Send + Sync>;

/// A bound key
#[derive(Clone)]
pub struct KeyAction {
    pub label: String,
    pub handler: ActionHandler,
    /// Shown in help and the status bar
    pub visible: bool,
}

impl KeyAction {
    pub fn new(
        label: &str,
        handler: impl Fn(&mut TableModel, &KeyEvent) -> KeyOutcome + Send + Sync + 'static,
        visible: bool,
    ) -> Self {
        Self {
            label: label.to_string(),
            handler: Arc::new(handler),
            visible,
        }
    }

    pub fn run(&self, model: &mut TableModel, evt: &KeyEvent) -> KeyOutcome {
        (self.handler)(model, evt)
    }
}

impl fmt::Debug for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyAction")
            .field("label", &self.label)
            .field("visible", &self.visible)
            .finish()
    }
}

/// Key to action map. Keys are unique; later inserts replace earlier ones.
#[derive(Clone, Default, Debug)]
pub struct KeyActions {
    actions: HashMap<Key, KeyAction>,
}

impl KeyActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Key, action: KeyAction) {
        self.actions.insert(key, action);
    }

    /// Merge another map into this one, overwriting clashes
    pub fn add(&mut self, other: KeyActions) {
        self.actions.extend(other.actions);
    }

    pub fn delete(&mut self, keys: &[Key]) {
        for key in keys {
            self.actions.remove(key);
        }
    }

    pub fn get(&self, key: &Key) -> Option<&KeyAction> {
        self.actions.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.actions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Visible bindings, sorted by key label
    pub fn hints(&self) -> Vec<MenuHint> {
        let mut hints: Vec<MenuHint> = self
            .actions
            .iter()
            .filter(|(_, action)| action.visible)
            .map(|(key, action)| MenuHint::new(&key.to_string(), &action.label))
            .collect();
        hints.sort_by(|a, b| a.mnemonic.cmp(&b.mnemonic));
        hints
    }
}
