//! Command router: text in, navigation out
//!
//! Reserved mnemonics are handled first. Everything else goes through the alias store,
//! then the viewer registry, then onto the navigation stack. Every failure happens
//! before the push, so a rejected command leaves the stack as it was.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::instrument;

use super::component::{Component, MenuHint, ViewContext};
use super::help::{Help, HELP_VIEW};
use super::registry::{MetaViewer, ViewerRegistry};
use super::stack::NavigationStack;
use crate::alias::{is_help, is_quit, AliasStore};
use crate::error::{LensError, LensResult};
use crate::session::Session;
use crate::source::Target;

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The interactive loop should end. The stack was not touched.
    Quit,
    /// The help view is on top
    Help,
    /// A view for `resource` was pushed
    Viewing { resource: String },
}

pub struct Router {
    aliases: Arc<AliasStore>,
    registry: Arc<ViewerRegistry>,
    stack: Arc<NavigationStack>,
    ctx: ViewContext,
    services: Vec<MenuHint>,
    mx: Mutex<()>,
}

impl Router {
    /// `services` feeds the SERVICES section of the help view
    pub fn new(
        aliases: Arc<AliasStore>,
        registry: Arc<ViewerRegistry>,
        stack: Arc<NavigationStack>,
        ctx: ViewContext,
        services: Vec<MenuHint>,
    ) -> Self {
        Self {
            aliases,
            registry,
            stack,
            ctx,
            services,
            mx: Mutex::new(()),
        }
    }

    /// Load persisted aliases. The router cannot run without them.
    pub fn init(&self) -> LensResult<usize> {
        let _guard = self.mx.lock();
        self.aliases.ensure()
    }

    /// Reload the alias store, dropping user aliases first if asked
    pub fn reset(&self, clear_user: bool) -> LensResult<usize> {
        let _guard = self.mx.lock();
        if clear_user {
            self.aliases.clear_user()?;
        }
        self.aliases.ensure()
    }

    /// Run one command line. `path` overrides whatever follows the mnemonic.
    #[instrument(skip(self))]
    pub fn run(&self, command: &str, path: &str, clear_stack: bool) -> LensResult<Dispatch> {
        let _guard = self.mx.lock();

        let mut tokens = command.split_whitespace();
        let mnemonic = tokens
            .next()
            .ok_or_else(|| LensError::CommandNotFound(command.to_string()))?;

        if is_quit(mnemonic) {
            tracing::info!("Quit requested");
            return Ok(Dispatch::Quit);
        }
        if is_help(mnemonic) {
            return self.help();
        }

        let rest = tokens.collect::<Vec<_>>().join(" ");
        let path = if path.is_empty() { rest.as_str() } else { path };

        let resource = self
            .aliases
            .resolve(mnemonic)
            .ok_or_else(|| LensError::CommandNotFound(mnemonic.to_string()))?;
        self.push_view(&resource, path, clear_stack)
    }

    /// Open a resource directly, skipping alias resolution. Used by enter handlers.
    pub fn open(&self, resource: &str, path: &str, clear_stack: bool) -> LensResult<Dispatch> {
        let _guard = self.mx.lock();
        self.push_view(resource, path, clear_stack)
    }

    fn push_view(&self, resource: &str, path: &str, clear_stack: bool) -> LensResult<Dispatch> {
        let meta = self.registry.meta_for(resource);
        let component = self.component_for(&meta, resource, path)?;
        if clear_stack {
            self.stack.push_cleared(component, &self.ctx)?;
        } else {
            self.stack.push(component, &self.ctx)?;
        }
        tracing::info!("Viewing {} (depth {})", resource, self.stack.len());
        Ok(Dispatch::Viewing {
            resource: resource.to_string(),
        })
    }

    fn component_for(&self, meta: &MetaViewer, resource: &str, path: &str) -> LensResult<Box<dyn Component>> {
        let target = Target {
            resource,
            path,
            session: &self.ctx.session,
        };

        let built = panic::catch_unwind(AssertUnwindSafe(|| (meta.viewer_fn)(&target)));
        let mut component = match built {
            Ok(Some(component)) => component,
            Ok(None) => return Err(LensError::NoComponent(resource.to_string())),
            Err(_) => {
                tracing::error!("Viewer factory for {} panicked", resource);
                return Err(LensError::Init {
                    component: resource.to_string(),
                    reason: "viewer factory panicked".to_string(),
                });
            }
        };

        if let Some(enter) = &meta.enter_fn {
            match component.table_mut() {
                Some(table) => table.set_enter_fn(Arc::clone(enter)),
                None => tracing::warn!("{} has no table to bind an enter handler to", resource),
            }
        }
        Ok(component)
    }

    fn help(&self) -> LensResult<Dispatch> {
        if self.stack.top_name().as_deref() == Some(HELP_VIEW) {
            return Ok(Dispatch::Help);
        }
        let general = self.stack.top_hints();
        self.stack
            .push(Box::new(Help::new(&self.services, &general)), &self.ctx)?;
        Ok(Dispatch::Help)
    }

    pub fn stack(&self) -> &Arc<NavigationStack> {
        &self.stack
    }

    pub fn aliases(&self) -> &Arc<AliasStore> {
        &self.aliases
    }

    pub fn registry(&self) -> &Arc<ViewerRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }
}
