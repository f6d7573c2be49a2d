//! Navigation stack of live views
//!
//! The bottom frame is the root view and is never removed. Only the top frame is
//! started; everything below it is stopped. Each mutation runs under one lock and fails
//! before touching the frames, so an error never leaves a half-applied push.

use parking_lot::Mutex;

use super::component::{Component, MenuHint, ViewContext};
use crate::error::{LensError, LensResult};

struct Frame {
    component: Box<dyn Component>,
    seq: u64,
}

struct Frames {
    frames: Vec<Frame>,
    next_seq: u64,
}

impl Frames {
    fn push(&mut self, component: Box<dyn Component>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::debug!("Push frame #{} ({})", seq, component.name());
        self.frames.push(Frame { component, seq });
    }

    fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Pop every frame above the root, stopping each on the way down
    fn unwind(&mut self) -> usize {
        let mut popped = 0;
        while self.frames.len() > 1 {
            if let Some(mut frame) = self.frames.pop() {
                frame.component.stop();
                tracing::debug!("Dropped frame #{} ({})", frame.seq, frame.component.name());
                popped += 1;
            }
        }
        popped
    }
}

pub struct NavigationStack {
    inner: Mutex<Frames>,
}

impl NavigationStack {
    /// Create the stack around its root view, which is initialized and started
    pub fn new(mut root: Box<dyn Component>, ctx: &ViewContext) -> LensResult<Self> {
        root.init(ctx)?;
        root.start();
        let mut frames = Frames {
            frames: Vec::new(),
            next_seq: 0,
        };
        frames.push(root);
        Ok(Self {
            inner: Mutex::new(frames),
        })
    }

    /// Initialize `component` and make it the active view.
    ///
    /// If init fails the stack is untouched and the current top keeps running.
    pub fn push(&self, mut component: Box<dyn Component>, ctx: &ViewContext) -> LensResult<()> {
        let mut inner = self.inner.lock();
        component.init(ctx)?;
        if let Some(top) = inner.top_mut() {
            top.component.stop();
        }
        component.start();
        inner.push(component);
        Ok(())
    }

    /// Replace everything above the root with `component` in one step
    pub fn push_cleared(&self, mut component: Box<dyn Component>, ctx: &ViewContext) -> LensResult<()> {
        let mut inner = self.inner.lock();
        component.init(ctx)?;
        inner.unwind();
        if let Some(root) = inner.top_mut() {
            root.component.stop();
        }
        component.start();
        inner.push(component);
        Ok(())
    }

    /// Remove the active view and resume the one beneath it
    pub fn pop(&self) -> LensResult<Box<dyn Component>> {
        let mut inner = self.inner.lock();
        if inner.frames.len() <= 1 {
            return Err(LensError::RootFrame);
        }
        let mut frame = inner.frames.pop().ok_or(LensError::RootFrame)?;
        frame.component.stop();
        if let Some(top) = inner.top_mut() {
            top.component.start();
        }
        tracing::debug!("Popped frame #{} ({})", frame.seq, frame.component.name());
        Ok(frame.component)
    }

    /// Pop down to the root frame, which becomes active again. Returns how many frames
    /// were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let popped = inner.unwind();
        if popped > 0 {
            if let Some(root) = inner.top_mut() {
                root.component.start();
            }
        }
        popped
    }

    /// Stop whatever is running. Used on shutdown.
    pub fn stop_all(&self) {
        let mut inner = self.inner.lock();
        for frame in inner.frames.iter_mut().rev() {
            frame.component.stop();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    /// Never true: the root frame is always present
    pub fn is_empty(&self) -> bool {
        self.inner.lock().frames.is_empty()
    }

    /// Run `f` against the active view
    pub fn with_top<R>(&self, f: impl FnOnce(&mut dyn Component) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        inner.top_mut().map(|frame| f(frame.component.as_mut()))
    }

    pub fn top_name(&self) -> Option<String> {
        self.with_top(|c| c.name().to_string())
    }

    pub fn top_hints(&self) -> Vec<MenuHint> {
        self.with_top(|c| c.hints()).unwrap_or_default()
    }

    /// Titles from root to top
    pub fn breadcrumbs(&self) -> Vec<String> {
        self.inner
            .lock()
            .frames
            .iter()
            .map(|frame| frame.component.title())
            .collect()
    }
}
