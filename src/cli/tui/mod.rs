//! Interactive terminal front end
//!
//! Provides:
//! - The active view of the navigation stack, refreshed in the background
//! - A `:` command prompt with history
//! - A title bar with the session and breadcrumbs, and a status line

mod app;
mod events;
mod ui;

pub use app::run;
pub use app::App;
pub use events::InputMode;
