//! Resource id to viewer construction recipe
//!
//! Resource types are data, not subtypes: supporting a new one is a `register` call at
//! composition time. The registry is immutable once built.

use std::collections::HashMap;
use std::sync::Arc;

use super::component::Component;
use super::table::EnterFn;
use crate::source::Target;

/// Builds the component for a target, or nothing if it cannot
pub type ViewFactory = Arc<dyn Fn(&Target<'_>) -> Option<Box<dyn Component>> + Send + Sync>;

/// Construction recipe for one resource
#[derive(Clone)]
pub struct MetaViewer {
    pub viewer_fn: ViewFactory,
    pub enter_fn: Option<EnterFn>,
}

pub struct ViewerRegistry {
    viewers: HashMap<String, MetaViewer>,
    fallback: ViewFactory,
}

impl ViewerRegistry {
    /// Start a registry whose unregistered resources use `fallback`
    pub fn builder(fallback: ViewFactory) -> ViewerRegistryBuilder {
        ViewerRegistryBuilder {
            viewers: HashMap::new(),
            fallback,
        }
    }

    pub fn lookup(&self, resource: &str) -> Option<&MetaViewer> {
        self.viewers.get(resource)
    }

    /// Registered recipe, or the fallback browser with no enter handler
    pub fn meta_for(&self, resource: &str) -> MetaViewer {
        self.lookup(resource).cloned().unwrap_or_else(|| MetaViewer {
            viewer_fn: Arc::clone(&self.fallback),
            enter_fn: None,
        })
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.viewers.contains_key(resource)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }
}

pub struct ViewerRegistryBuilder {
    viewers: HashMap<String, MetaViewer>,
    fallback: ViewFactory,
}

impl ViewerRegistryBuilder {
    /// Register a recipe. `viewer_fn` of `None` keeps the fallback factory but still
    /// attaches the enter handler.
    pub fn register(mut self, resource: &str, viewer_fn: Option<ViewFactory>, enter_fn: Option<EnterFn>) -> Self {
        let meta = MetaViewer {
            viewer_fn: viewer_fn.unwrap_or_else(|| Arc::clone(&self.fallback)),
            enter_fn,
        };
        if self.viewers.insert(resource.to_string(), meta).is_some() {
            tracing::warn!("Viewer for '{}' registered twice, keeping the last one", resource);
        }
        self
    }

    pub fn build(self) -> ViewerRegistry {
        ViewerRegistry {
            viewers: self.viewers,
            fallback: self.fallback,
        }
    }
}
