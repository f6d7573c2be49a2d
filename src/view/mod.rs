//! Views and the machinery that routes commands to them

pub mod actions;
pub mod aliases;
pub mod browser;
pub mod command;
pub mod component;
pub mod help;
pub mod refresh;
pub mod registry;
pub mod stack;
pub mod table;

pub use actions::{Key, KeyAction, KeyActions};
pub use aliases::{AliasSource, AliasView, ALIAS_VIEW};
pub use browser::{browser_factory, Browser};
pub use command::{Dispatch, Router};
pub use component::{AppRequest, Component, Exporter, KeyOutcome, MenuHint, ViewContext};
pub use help::{Help, HELP_VIEW};
pub use refresh::{RefreshStats, Refresher};
pub use registry::{MetaViewer, ViewFactory, ViewerRegistry, ViewerRegistryBuilder};
pub use stack::NavigationStack;
pub use table::{BindKeysFn, EnterContext, EnterFn, Table, TableModel};
