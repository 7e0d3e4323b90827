//! Signal/slot system for Trellis.
//!
//! Signals are the lightweight counterpart to data objects: a widget emits a
//! signal when something happened to it (a button was clicked), and every
//! connected slot runs synchronously on the calling thread. The whole
//! toolkit is single-threaded, so slots are plain `Fn` closures without
//! `Send` bounds.
//!
//! Slots may connect or disconnect (including themselves) while the signal
//! is being emitted. Emission works on a snapshot of the connections, and a
//! slot disconnected mid-emission is not called afterwards.
//!
//! # Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! let clicked = Signal::<u32>::new();
//! let id = clicked.connect(|count| println!("clicked {count} times"));
//! clicked.emit(1);
//! clicked.disconnect(id);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Rc<dyn Fn(&Args)>;

/// A signal that can have multiple connected slots.
pub struct Signal<Args> {
    connections: RefCell<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: Cell<bool>,
}

static_assertions::assert_not_impl_any!(Signal<()>: Send, Sync);

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: RefCell::new(SlotMap::with_key()),
            blocked: Cell::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.connections.borrow_mut().insert(Rc::new(slot))
    }

    /// Disconnect a slot. Returns `true` if it was connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.borrow_mut().remove(id).is_some()
    }

    /// Disconnect every slot.
    pub fn disconnect_all(&self) {
        self.connections.borrow_mut().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.borrow().len()
    }

    /// Block or unblock emission. A blocked signal drops emits silently.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.set(blocked);
    }

    /// Whether emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Invoke every connected slot with `args`.
    #[tracing::instrument(skip_all, target = "trellis_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let snapshot: Vec<(ConnectionId, Slot<Args>)> = self
            .connections
            .borrow()
            .iter()
            .map(|(id, slot)| (id, Rc::clone(slot)))
            .collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        for (id, slot) in snapshot {
            // Skip slots disconnected by an earlier slot in this emission.
            if !self.connections.borrow().contains_key(id) {
                continue;
            }
            slot(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.borrow().len())
            .field("blocked", &self.blocked.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_signal() {
        let signal = Signal::<i32>::new();
        let received = Rc::new(RefCell::new(Vec::new()));

        let sink = received.clone();
        signal.connect(move |value| sink.borrow_mut().push(*value));

        signal.emit(1);
        signal.emit(2);
        assert_eq!(*received.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<()>::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        let id = signal.connect(move |_| counter.set(counter.get() + 1));
        signal.emit(());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(());

        assert_eq!(count.get(), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_blocked_signal() {
        let signal = Signal::<()>::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        signal.connect(move |_| counter.set(counter.get() + 1));
        signal.set_blocked(true);
        signal.emit(());
        assert_eq!(count.get(), 0);

        signal.set_blocked(false);
        signal.emit(());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_slot_disconnects_sibling_during_emit() {
        let signal = Rc::new(Signal::<()>::new());
        let later_calls = Rc::new(Cell::new(0));
        let victim: Rc<Cell<Option<ConnectionId>>> = Rc::new(Cell::new(None));

        let counter = later_calls.clone();
        let second = signal.connect(move |_| counter.set(counter.get() + 1));
        victim.set(Some(second));

        let handle = Rc::downgrade(&signal);
        let target = victim.clone();
        let first = signal.connect(move |_| {
            if let (Some(signal), Some(id)) = (handle.upgrade(), target.get()) {
                signal.disconnect(id);
            }
        });
        assert_ne!(first, second);

        signal.emit(());
        signal.emit(());
        // Depending on slot order the victim may run once before removal.
        assert!(later_calls.get() <= 1);
        assert_eq!(signal.connection_count(), 1);
    }
}
