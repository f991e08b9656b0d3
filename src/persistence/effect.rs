//! Deferred effects
//!
//! Write-backs never run inline with the mutation that caused them. They are
//! queued here and run later, strictly in the order they were scheduled.
//! On the web the queue drains itself on the next microtask; natively the
//! owner calls [`EffectQueue::settle`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Effect = Box<dyn FnOnce()>;

/// When queued effects get run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Only when [`EffectQueue::settle`] is called
    Manual,
    /// Automatically on the next microtask (WASM only; behaves like `Manual`
    /// elsewhere)
    Microtask,
}

struct Inner {
    pending: VecDeque<Effect>,
    mode: DrainMode,
    /// A microtask drain is already scheduled
    armed: bool,
}

/// Single-threaded FIFO of pending effects. Clones share the queue.
#[derive(Clone)]
pub struct EffectQueue {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for EffectQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EffectQueue")
            .field("pending", &inner.pending.len())
            .field("mode", &inner.mode)
            .finish()
    }
}

thread_local! {
    static CURRENT: EffectQueue = EffectQueue::for_platform();
}

impl EffectQueue {
    pub fn new(mode: DrainMode) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                pending: VecDeque::new(),
                mode,
                armed: false,
            })),
        }
    }

    /// Queue drained by hand
    pub fn manual() -> Self {
        Self::new(DrainMode::Manual)
    }

    /// Microtask draining on the web, manual natively
    pub fn for_platform() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::new(DrainMode::Microtask)
        } else {
            Self::manual()
        }
    }

    /// This thread's shared queue
    pub fn current() -> Self {
        CURRENT.with(|q| q.clone())
    }

    pub fn mode(&self) -> DrainMode {
        self.inner.borrow().mode
    }

    /// Number of effects waiting to run
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Queue an effect. It runs after everything queued before it.
    pub fn schedule(&self, effect: impl FnOnce() + 'static) {
        let arm = {
            let mut inner = self.inner.borrow_mut();
            inner.pending.push_back(Box::new(effect));
            let arm = inner.mode == DrainMode::Microtask && !inner.armed;
            if arm {
                inner.armed = true;
            }
            arm
        };

        if arm {
            self.arm();
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn arm(&self) {
        let queue = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            queue.inner.borrow_mut().armed = false;
            queue.settle();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn arm(&self) {
        // No event loop to hook into; the owner drains with settle()
        self.inner.borrow_mut().armed = false;
    }

    /// Run pending effects until the queue is empty, including any that
    /// running effects schedule. Returns how many ran.
    pub fn settle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the borrow before running so effects can schedule more
            let next = self.inner.borrow_mut().pending.pop_front();
            match next {
                Some(effect) => {
                    effect();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }
}

impl Default for EffectQueue {
    fn default() -> Self {
        Self::for_platform()
    }
}
