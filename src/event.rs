//! Event handling.
//!
//! This library exposes an event-based interface for reacting
//! to the state changes of the emulator in real-time. [EventListeners](EventListener)
//! can be registered on the [Emulator](crate::emulator::Emulator) with the
//! [add_listener](crate::emulator::Emulator::add_listener) method.
//!
//! A blanket implementation of [EventListener] for all `Fn(&Event)` is provided.

/// Represents an event that occurred while executing a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The program modified a memory location.
    MemoryChange {
        /// The address of the changed memory location.
        address: usize,

        /// New value of the changed memory location.
        data: i64,
    },

    /// The program consumed a value from its input queue.
    Input {
        value: i64,
    },

    /// The program emitted a value.
    Output {
        value: i64,
    },

    /// The program ran out of input and the execution was suspended.
    Suspended {
        /// Address of the Input instruction that will be retried on resume.
        pointer: usize,
    },

    /// The program executed a halt instruction.
    Halted {
        pointer: usize,
    },
}

/// Trait for consuming events.
pub trait EventListener {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F where F: Fn(&Event) {
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}
