use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Digital inputs merged into every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub boost: bool,
    pub jump: bool,
}

/// Source of the digital inputs, sampled once per tick.
pub trait InputProvider {
    fn sample(&self) -> InputFlags;
}

/// Fixed flags.
impl InputProvider for InputFlags {
    fn sample(&self) -> InputFlags {
        *self
    }
}

/// Flags shared with whatever front end owns the buttons. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    boost: Arc<AtomicBool>,
    jump: Arc<AtomicBool>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_boost(&self, pressed: bool) {
        self.boost.store(pressed, Ordering::Relaxed);
    }

    pub fn set_jump(&self, pressed: bool) {
        self.jump.store(pressed, Ordering::Relaxed);
    }

    /// Flip boost, returning the new state.
    pub fn toggle_boost(&self) -> bool {
        !self.boost.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip jump, returning the new state.
    pub fn toggle_jump(&self) -> bool {
        !self.jump.fetch_xor(true, Ordering::Relaxed)
    }
}

impl InputProvider for SharedInput {
    fn sample(&self) -> InputFlags {
        InputFlags {
            boost: self.boost.load(Ordering::Relaxed),
            jump: self.jump.load(Ordering::Relaxed),
        }
    }
}
