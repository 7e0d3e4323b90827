//! Shared data objects and their observers.
//!
//! A [`DataObject`] is a typed mutable cell that several widgets can watch
//! without knowing about each other. Widgets attach an [`Observer`]; after a
//! mutation the owner calls [`DataObject::notify`] and every observer's
//! [`Observer::on_update`] runs synchronously.
//!
//! # Caller contract
//!
//! Mutate the value, then call `notify` once. Calling `notify` while the same
//! object is already notifying is a contract violation and panics. An
//! observer that changes the value from inside `on_update` must instead
//! return `true`, which restarts the fan-out over the current observer set so
//! every observer sees the newest value.
//!
//! # Reentrancy
//!
//! - Observers may attach or detach observers (including themselves) during
//!   fan-out. The iteration re-reads the observer set after every change and
//!   never calls an observer twice within one pass, nor one that has been
//!   detached.
//! - Destroying the object from inside one of its own callbacks only marks it
//!   [`DataState::PendingDestroy`]. The destroy runs when the fan-out ends,
//!   so the object stays readable for the rest of the notification.
//!
//! The object holds observers weakly: the attaching widget owns the observer
//! record, and an observer whose owner dropped it is skipped and pruned.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::adjustment::Adjustment;
use crate::logging::{span_names, targets, PerfSpan};
use crate::object::WidgetId;

new_key_type! {
    /// Identifies one attachment of an observer to a data object.
    pub struct ObserverId;
}

/// Notification state of a data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
    /// No notification in flight.
    Idle,
    /// Observers are being notified.
    Notifying,
    /// `destroy` was requested during notification; it runs when fan-out ends.
    PendingDestroy,
    /// The object was destroyed; its value is gone.
    Destroyed,
}

/// Tag identifying the variant a data object holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Integer cell.
    Int,
    /// Floating point cell.
    Float,
    /// Bounded scrollable range.
    Adjustment,
    /// Reference to a widget, or none.
    WidgetRef,
    /// Ordered list of values.
    List,
}

/// Values that can live in a [`DataObject`].
pub trait DataValue: 'static {
    /// Variant tag reported by [`DataObject::kind`].
    const KIND: DataKind;
}

impl DataValue for i64 {
    const KIND: DataKind = DataKind::Int;
}

impl DataValue for f64 {
    const KIND: DataKind = DataKind::Float;
}

impl DataValue for Adjustment {
    const KIND: DataKind = DataKind::Adjustment;
}

impl DataValue for Option<WidgetId> {
    const KIND: DataKind = DataKind::WidgetRef;
}

impl<T: 'static> DataValue for Vec<T> {
    const KIND: DataKind = DataKind::List;
}

/// Integer cell.
pub type IntData = DataObject<i64>;
/// Floating point cell.
pub type FloatData = DataObject<f64>;
/// Adjustment cell shared by sliders, scrollbars and viewports.
pub type AdjustmentData = DataObject<Adjustment>;
/// Cell referring to a widget, such as the active member of a toggle group.
pub type WidgetRefData = DataObject<Option<WidgetId>>;
/// List cell, such as a selection set.
pub type ListData<T> = DataObject<Vec<T>>;

/// Receives change notifications from a [`DataObject`].
pub trait Observer<T> {
    /// Called once per fan-out pass after the value changed.
    ///
    /// Return `true` if this callback mutated the object again; the fan-out
    /// then restarts so every observer sees the newer value.
    fn on_update(&self, data: &DataObject<T>) -> bool;

    /// Called when the data object is destroyed while this observer is attached.
    fn on_disconnect(&self, _data: &DataObject<T>) {}
}

type UpdateFn<T, P> = Box<dyn Fn(&P, &DataObject<T>) -> bool>;
type DisconnectFn<T, P> = Box<dyn Fn(&P, &DataObject<T>)>;

/// Observer built from closures plus a user payload.
pub struct FnObserver<T, P = ()> {
    payload: P,
    update: UpdateFn<T, P>,
    disconnect: Option<DisconnectFn<T, P>>,
}

impl<T, P> FnObserver<T, P> {
    /// Create an observer whose `on_update` runs `update` with the payload.
    pub fn new<F>(payload: P, update: F) -> Self
    where
        F: Fn(&P, &DataObject<T>) -> bool + 'static,
    {
        Self {
            payload,
            update: Box::new(update),
            disconnect: None,
        }
    }

    /// Set the callback run on `on_disconnect`.
    pub fn on_disconnect<F>(mut self, disconnect: F) -> Self
    where
        F: Fn(&P, &DataObject<T>) + 'static,
    {
        self.disconnect = Some(Box::new(disconnect));
        self
    }

    /// The user payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }
}

impl<T, P> Observer<T> for FnObserver<T, P> {
    fn on_update(&self, data: &DataObject<T>) -> bool {
        (self.update)(&self.payload, data)
    }

    fn on_disconnect(&self, data: &DataObject<T>) {
        if let Some(disconnect) = &self.disconnect {
            disconnect(&self.payload, data);
        }
    }
}

struct DataInner<T> {
    value: RefCell<Option<T>>,
    observers: RefCell<SlotMap<ObserverId, Weak<dyn Observer<T>>>>,
    state: Cell<DataState>,
    /// Bumped on every attach or detach so fan-out can spot a changed set.
    revision: Cell<u64>,
}

/// A shared, observable value.
///
/// Cloning yields another handle to the same object.
pub struct DataObject<T> {
    inner: Rc<DataInner<T>>,
}

static_assertions::assert_not_impl_any!(DataObject<i64>: Send, Sync);

impl<T> Clone for DataObject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: DataValue> DataObject<T> {
    /// Create an idle data object holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(DataInner {
                value: RefCell::new(Some(value)),
                observers: RefCell::new(SlotMap::with_key()),
                state: Cell::new(DataState::Idle),
                revision: Cell::new(0),
            }),
        }
    }

    /// Variant tag of this object.
    pub fn kind(&self) -> DataKind {
        T::KIND
    }
}

impl<T: 'static> DataObject<T> {
    /// Current notification state.
    pub fn state(&self) -> DataState {
        self.inner.state.get()
    }

    /// Whether the object has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.state() == DataState::Destroyed
    }

    /// Whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Borrow the value.
    ///
    /// # Panics
    ///
    /// Panics if the object has been destroyed.
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.inner.value.borrow(), |value| match value {
            Some(value) => value,
            None => panic!("read of a destroyed data object"),
        })
    }

    /// Clone the value out.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.borrow().clone()
    }

    /// Replace the value without notifying. Returns the previous value.
    pub fn set(&self, value: T) -> T {
        self.update(|slot| std::mem::replace(slot, value))
    }

    /// Mutate the value in place without notifying.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut value = self.inner.value.borrow_mut();
        match value.as_mut() {
            Some(value) => f(value),
            None => panic!("write to a destroyed data object"),
        }
    }

    /// Attach an observer. The object keeps only a weak reference.
    ///
    /// # Panics
    ///
    /// Panics if the object has been destroyed.
    pub fn attach<O>(&self, observer: &Rc<O>) -> ObserverId
    where
        O: Observer<T> + 'static,
    {
        assert!(!self.is_destroyed(), "attach to a destroyed data object");
        let weak: Weak<dyn Observer<T>> = Rc::downgrade(observer) as Weak<dyn Observer<T>>;
        let id = self.inner.observers.borrow_mut().insert(weak);
        self.bump_revision();
        tracing::trace!(target: targets::DATA, ?id, "observer attached");
        id
    }

    /// Detach an observer. Returns `true` if it was attached.
    ///
    /// Safe to call from inside any observer callback.
    pub fn detach(&self, id: ObserverId) -> bool {
        let removed = self.inner.observers.borrow_mut().remove(id).is_some();
        if removed {
            self.bump_revision();
            tracing::trace!(target: targets::DATA, ?id, "observer detached");
        }
        removed
    }

    /// Whether `id` is still attached.
    pub fn is_attached(&self, id: ObserverId) -> bool {
        self.inner.observers.borrow().contains_key(id)
    }

    /// Number of attached observers, including ones whose owner was dropped
    /// but that have not been pruned yet.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Notify every attached observer of a change.
    ///
    /// # Panics
    ///
    /// Panics when called while this object is already notifying, or after it
    /// was destroyed.
    #[tracing::instrument(skip_all, target = "trellis_core::data", level = "trace")]
    pub fn notify(&self) {
        match self.state() {
            DataState::Idle => {}
            DataState::Notifying | DataState::PendingDestroy => {
                panic!("nested notify on a data object; mutate the value, then notify once")
            }
            DataState::Destroyed => panic!("notify on a destroyed data object"),
        }
        self.inner.state.set(DataState::Notifying);
        let _perf = PerfSpan::new(span_names::NOTIFY);

        // Loop invariant: `visited` holds every observer already called in the
        // current pass. A changed set re-reads the keys without clearing it; a
        // restart request clears it.
        let mut visited: HashSet<ObserverId> = HashSet::new();
        let mut restarts = 0usize;
        'fan_out: loop {
            let revision = self.inner.revision.get();
            let ids: Vec<ObserverId> = self.inner.observers.borrow().keys().collect();
            for id in ids {
                if self.inner.revision.get() != revision {
                    continue 'fan_out;
                }
                if !visited.insert(id) {
                    continue;
                }
                let observer = self.inner.observers.borrow().get(id).and_then(Weak::upgrade);
                let Some(observer) = observer else {
                    continue;
                };
                if observer.on_update(self) {
                    restarts += 1;
                    visited.clear();
                    continue 'fan_out;
                }
            }
            break;
        }

        tracing::trace!(target: targets::DATA, notified = visited.len(), restarts, "fan-out complete");
        let destroy_pending = self.state() == DataState::PendingDestroy;
        self.inner.state.set(DataState::Idle);
        self.prune_dropped();

        if destroy_pending {
            tracing::debug!(target: targets::DATA, "running deferred destroy");
            self.destroy();
        }
    }

    /// Destroy the object.
    ///
    /// While notifying this only records the request. Otherwise every
    /// attached observer receives `on_disconnect`, the observer set is
    /// released and the value is dropped. Destroying twice is a no-op.
    pub fn destroy(&self) {
        match self.state() {
            DataState::Idle => {}
            DataState::Notifying => {
                self.inner.state.set(DataState::PendingDestroy);
                tracing::debug!(target: targets::DATA, "destroy deferred until fan-out ends");
                return;
            }
            DataState::PendingDestroy | DataState::Destroyed => return,
        }

        self.inner.state.set(DataState::Destroyed);
        let observers: Vec<Weak<dyn Observer<T>>> = self
            .inner
            .observers
            .borrow_mut()
            .drain()
            .map(|(_, observer)| observer)
            .collect();
        self.bump_revision();

        // The value stays readable for the disconnect callbacks.
        for observer in observers.iter().filter_map(Weak::upgrade) {
            observer.on_disconnect(self);
        }

        let value = self.inner.value.borrow_mut().take();
        drop(value);
        tracing::debug!(target: targets::DATA, disconnected = observers.len(), "data object destroyed");
    }

    fn bump_revision(&self) {
        self.inner.revision.set(self.inner.revision.get().wrapping_add(1));
    }

    fn prune_dropped(&self) {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|_, observer| observer.strong_count() > 0);
        if observers.len() != before {
            drop(observers);
            self.bump_revision();
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for DataObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataObject")
            .field("value", &self.inner.value.borrow())
            .field("state", &self.state())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Observer that records how often it ran.
    #[derive(Default)]
    struct Counter {
        updates: Cell<u32>,
        disconnects: Cell<u32>,
    }

    impl<T> Observer<T> for Counter {
        fn on_update(&self, _data: &DataObject<T>) -> bool {
            self.updates.set(self.updates.get() + 1);
            false
        }

        fn on_disconnect(&self, _data: &DataObject<T>) {
            self.disconnects.set(self.disconnects.get() + 1);
        }
    }

    #[test]
    fn test_notify_calls_each_observer_once() {
        let data = IntData::new(0);
        let observers: Vec<Rc<Counter>> = (0..5).map(|_| Rc::new(Counter::default())).collect();
        for observer in &observers {
            data.attach(observer);
        }

        data.set(7);
        data.notify();

        assert!(observers.iter().all(|o| o.updates.get() == 1));
        assert_eq!(data.state(), DataState::Idle);
        assert_eq!(data.get(), 7);
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(IntData::new(1).kind(), DataKind::Int);
        assert_eq!(FloatData::new(1.0).kind(), DataKind::Float);
        assert_eq!(WidgetRefData::new(None).kind(), DataKind::WidgetRef);
        assert_eq!(ListData::<u8>::new(Vec::new()).kind(), DataKind::List);
        assert_eq!(
            AdjustmentData::new(Adjustment::new(0.0, 0.0, 1.0, 0.1, 0.5, 0.0)).kind(),
            DataKind::Adjustment
        );
    }

    #[test]
    fn test_observer_detaches_itself() {
        let data = IntData::new(0);
        let id_slot: Rc<Cell<Option<ObserverId>>> = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let slot = id_slot.clone();
        let counter = calls.clone();
        let once = Rc::new(FnObserver::new((), move |_, data: &IntData| {
            counter.set(counter.get() + 1);
            if let Some(id) = slot.get() {
                data.detach(id);
            }
            false
        }));
        id_slot.set(Some(data.attach(&once)));
        let other = Rc::new(Counter::default());
        data.attach(&other);

        data.notify();
        data.notify();

        assert_eq!(calls.get(), 1);
        assert_eq!(other.updates.get(), 2);
        assert_eq!(data.observer_count(), 1);
    }

    #[test]
    fn test_detached_sibling_is_not_called() {
        let data = IntData::new(0);
        let first = Rc::new(Counter::default());
        let second = Rc::new(Counter::default());
        let first_id = data.attach(&first);
        let second_id = data.attach(&second);

        // Whichever of the two runs first, the detacher removes both.
        let detacher = Rc::new(FnObserver::new((), move |_, data: &IntData| {
            data.detach(first_id);
            data.detach(second_id);
            false
        }));
        data.attach(&detacher);

        data.notify();

        let total = first.updates.get() + second.updates.get();
        assert!(total <= 2);
        assert!(first.updates.get() <= 1 && second.updates.get() <= 1);
        assert_eq!(data.observer_count(), 1);

        data.notify();
        assert_eq!(first.updates.get() + second.updates.get(), total);
    }

    #[test]
    fn test_restart_reaches_everyone_with_new_value() {
        let data = IntData::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        // Clamps the value once, which asks for a restart.
        let clamp = Rc::new(FnObserver::new((), |_, data: &IntData| {
            if data.get() > 10 {
                data.set(10);
                true
            } else {
                false
            }
        }));
        let sink = seen.clone();
        let recorder = Rc::new(FnObserver::new((), move |_, data: &IntData| {
            sink.borrow_mut().push(data.get());
            false
        }));
        data.attach(&clamp);
        data.attach(&recorder);

        data.set(25);
        data.notify();

        assert_eq!(data.get(), 10);
        assert_eq!(seen.borrow().last(), Some(&10));
        assert!(seen.borrow().len() <= 2);
    }

    #[test]
    fn test_destroy_inside_callback_is_deferred() {
        let data = IntData::new(3);
        let disconnects = Rc::new(Counter::default());
        data.attach(&disconnects);

        let readable = Rc::new(Cell::new(false));
        let flag = readable.clone();
        let destroyer = Rc::new(FnObserver::new((), move |_, data: &IntData| {
            data.destroy();
            assert_eq!(data.state(), DataState::PendingDestroy);
            // Still valid for the rest of the notification.
            flag.set(data.get() == 3);
            false
        }));
        data.attach(&destroyer);

        data.notify();

        assert!(readable.get());
        assert!(data.is_destroyed());
        assert_eq!(disconnects.disconnects.get(), 1);
        assert_eq!(data.observer_count(), 0);
    }

    #[test]
    fn test_destroy_when_idle_disconnects_all() {
        let data = FloatData::new(1.5);
        let observers: Vec<Rc<Counter>> = (0..3).map(|_| Rc::new(Counter::default())).collect();
        for observer in &observers {
            data.attach(observer);
        }

        data.destroy();
        data.destroy();

        assert!(observers.iter().all(|o| o.disconnects.get() == 1));
        assert!(observers.iter().all(|o| o.updates.get() == 0));
        assert!(data.is_destroyed());
    }

    #[test]
    fn test_dropped_observer_is_skipped_and_pruned() {
        let data = IntData::new(0);
        let kept = Rc::new(Counter::default());
        data.attach(&kept);
        {
            let dropped = Rc::new(Counter::default());
            data.attach(&dropped);
        }
        assert_eq!(data.observer_count(), 2);

        data.notify();

        assert_eq!(kept.updates.get(), 1);
        assert_eq!(data.observer_count(), 1);
    }

    #[test]
    fn test_payload_is_passed_to_callbacks() {
        let data = ListData::<&'static str>::new(vec!["a"]);
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let observer = Rc::new(
            FnObserver::new(lengths.clone(), |sink: &Rc<RefCell<Vec<usize>>>, data: &ListData<&'static str>| {
                sink.borrow_mut().push(data.borrow().len());
                false
            })
            .on_disconnect(|sink, _| sink.borrow_mut().push(0)),
        );
        data.attach(&observer);

        data.update(|list| list.push("b"));
        data.notify();
        data.destroy();

        assert_eq!(*observer.payload().borrow(), vec![2, 0]);
    }

    #[test]
    #[should_panic(expected = "nested notify")]
    fn test_nested_notify_panics() {
        let data = IntData::new(0);
        let nested = Rc::new(FnObserver::new((), |_, data: &IntData| {
            data.notify();
            false
        }));
        data.attach(&nested);
        data.notify();
    }

    #[test]
    #[should_panic(expected = "destroyed")]
    fn test_attach_after_destroy_panics() {
        let data = IntData::new(0);
        data.destroy();
        data.attach(&Rc::new(Counter::default()));
    }
}
