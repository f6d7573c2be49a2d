//! Input modes for the TUI

/// Input mode for the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Keys go to the active view
    #[default]
    Normal,
    /// Typing a command at the `:` prompt
    Command,
}
