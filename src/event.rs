//! State change notifications of the emulator.
//!
//! [Listeners](EventListener) are registered with
//! [Emulator::add_listener](crate::emulator::Emulator::add_listener) and see every change
//! in the order the instruction makes it. Any `FnMut(&Event)` closure is a listener.

use crate::emulator::Register;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// An instruction wrote `data` to the word at `address`.
    MemoryChange {
        address: u16,
        data: u16,
    },

    /// An instruction loaded `data` into a register.
    RegisterChange {
        register: Register,
        data: u16,
    },

    /// The instruction at `from` took its jump.
    Jump {
        from: u16,
        to: u16,
    },
}

pub trait EventListener {
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F where F: FnMut(&Event) {
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

/// Listeners of a single emulator.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Vec<Box<dyn EventListener>>,
}

impl Listeners {
    pub fn add<L: EventListener + 'static>(&mut self, listener: L) {
        self.inner.push(Box::new(listener));
    }

    /// Delivers the event built by `event` to every listener. Nothing is built when there
    /// are no listeners.
    pub fn notify<F>(&mut self, event: F)
    where
        F: FnOnce() -> Event,
    {
        if self.inner.is_empty() {
            return;
        }

        let event = event();

        for listener in &mut self.inner {
            listener.event(&event);
        }
    }
}
