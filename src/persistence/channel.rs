//! Error channel for write-backs
//!
//! Write-backs are fire-and-forget, so their failures cannot be returned to
//! the caller that triggered them. They land here instead: logged, kept in
//! a bounded backlog until taken, and handed to a listener if one is
//! installed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::WriteError;

type Listener = Rc<dyn Fn(&WriteError)>;

/// Backlog size; older errors are dropped first
pub const MAX_BACKLOG: usize = 32;

#[derive(Default)]
struct Inner {
    backlog: VecDeque<WriteError>,
    listener: Option<Listener>,
}

/// Shared sink for failed write-backs. Clones share the backlog.
#[derive(Clone, Default)]
pub struct WriteErrors {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for WriteErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("WriteErrors")
            .field("backlog", &inner.backlog)
            .field("listener", &inner.listener.is_some())
            .finish()
    }
}

impl WriteErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn report(&self, err: WriteError) {
        log::warn!("{}", err);

        let listener = {
            let mut inner = self.inner.borrow_mut();
            if inner.backlog.len() == MAX_BACKLOG {
                inner.backlog.pop_front();
            }
            inner.backlog.push_back(err.clone());
            inner.listener.clone()
        };

        // Called outside the borrow so the listener may use this channel
        if let Some(listener) = listener {
            listener(&err);
        }
    }

    /// Install a callback for every future failure (replaces any previous one)
    pub fn on_error(&self, listener: impl Fn(&WriteError) + 'static) {
        self.inner.borrow_mut().listener = Some(Rc::new(listener));
    }

    /// Drain the backlog, oldest first
    pub fn take(&self) -> Vec<WriteError> {
        self.inner.borrow_mut().backlog.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().backlog.is_empty()
    }
}
