//! Keyboard accelerator tables.
//!
//! An [`AcceleratorTable`] maps a printable key plus a modifier mask to the
//! widget it activates. Keys hash into a fixed array of
//! [`BUCKET_COUNT`] buckets; each bucket chains `(modifiers, widget)`
//! entries, newest first, and holds at most one entry per modifier mask.
//!
//! The hash maps the printable ASCII range onto buckets in contiguous runs,
//! folding lowercase letters onto their uppercase bucket so that `a` and `A`
//! name the same accelerator.
//!
//! Tables are shared handles with an explicit reference count. A window
//! takes a reference for each table it carries; the table is destroyed,
//! evicting and notifying every binding, when the count drops to zero.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use static_assertions::const_assert_eq;
use trellis_core::logging::targets;
use trellis_core::WidgetId;

use super::events::ModifierType;
use super::tree::WidgetTree;

/// Number of hash buckets in every table.
pub const BUCKET_COUNT: usize = 69;

const FIRST_PRINTABLE: u8 = b' ';
const LAST_PRINTABLE: u8 = b'~';
const PRINTABLE_COUNT: usize = (LAST_PRINTABLE - FIRST_PRINTABLE + 1) as usize;

const fn build_bucket_index() -> [u8; PRINTABLE_COUNT] {
    let mut index = [0u8; PRINTABLE_COUNT];
    let mut i = 0;
    while i < PRINTABLE_COUNT {
        let key = FIRST_PRINTABLE + i as u8;
        index[i] = match key {
            // ' ' ..= '`' in order, which includes the uppercase letters.
            b' '..=b'`' => key - b' ',
            b'a'..=b'z' => key - b'a' + (b'A' - b' '),
            // '{' ..= '~' follow '`'.
            _ => key - b'{' + (b'`' - b' ' + 1),
        };
        i += 1;
    }
    index
}

const BUCKET_INDEX: [u8; PRINTABLE_COUNT] = build_bucket_index();

const_assert_eq!(PRINTABLE_COUNT - 26, BUCKET_COUNT);
const_assert_eq!(BUCKET_INDEX[PRINTABLE_COUNT - 1] as usize, BUCKET_COUNT - 1);

/// Bucket for `key`, or `None` if it is not printable ASCII.
pub fn bucket_of(key: char) -> Option<usize> {
    let code = u8::try_from(key).ok()?;
    if !(FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&code) {
        return None;
    }
    Some(usize::from(BUCKET_INDEX[usize::from(code - FIRST_PRINTABLE)]))
}

/// One binding in a bucket chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelEntry {
    /// The key as installed.
    pub key: char,
    pub modifiers: ModifierType,
    pub widget: WidgetId,
}

struct TableInner {
    buckets: [Vec<AccelEntry>; BUCKET_COUNT],
    ref_count: i32,
    destroyed: bool,
}

/// A reference-counted keystroke-to-widget table.
#[derive(Clone)]
pub struct AcceleratorTable {
    inner: Rc<RefCell<TableInner>>,
}

impl Default for AcceleratorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorTable {
    /// Create an empty table holding one reference.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TableInner {
                buckets: std::array::from_fn(|_| Vec::new()),
                ref_count: 1,
                destroyed: false,
            })),
        }
    }

    /// Whether two handles refer to the same table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn ref_count(&self) -> i32 {
        self.inner.borrow().ref_count
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.inner.borrow().buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The widget bound to `key` with exactly `modifiers`.
    pub fn lookup(&self, key: char, modifiers: ModifierType) -> Option<WidgetId> {
        let bucket = bucket_of(key)?;
        self.inner.borrow().buckets[bucket]
            .iter()
            .find(|entry| entry.modifiers == modifiers)
            .map(|entry| entry.widget)
    }

    /// Take another reference.
    pub fn add_ref(&self) {
        self.inner.borrow_mut().ref_count += 1;
    }

    /// Drop a reference. At zero the table evicts every binding, notifying
    /// each widget, and returns `true`.
    pub fn unref(&self, tree: &mut WidgetTree) -> bool {
        let evicted: Vec<AccelEntry> = {
            let mut inner = self.inner.borrow_mut();
            inner.ref_count -= 1;
            if inner.ref_count > 0 || inner.destroyed {
                return false;
            }
            inner.destroyed = true;
            inner.buckets.iter_mut().flat_map(std::mem::take).collect()
        };
        tracing::debug!(target: targets::ACCEL, evicted = evicted.len(), "accelerator table destroyed");
        for entry in evicted {
            tree.notify_accelerator_removed(entry.widget);
        }
        true
    }

    /// Bind `key` with `modifiers` to `widget`.
    ///
    /// An existing binding with the same mask in the key's bucket is
    /// replaced: its widget is told the accelerator was removed, then the
    /// entry is evicted and the new one prepended.
    ///
    /// This does not consult the widget; see
    /// [`WidgetTree::install_accelerator`].
    ///
    /// # Panics
    ///
    /// Panics if `key` is not printable ASCII or the table was destroyed.
    pub fn install(&self, tree: &mut WidgetTree, widget: WidgetId, key: char, modifiers: ModifierType) {
        let bucket = bucket_of(key)
            .unwrap_or_else(|| panic!("accelerator key {key:?} is not printable ASCII"));
        assert!(!self.is_destroyed(), "install into a destroyed accelerator table");

        let previous = self.inner.borrow().buckets[bucket]
            .iter()
            .find(|entry| entry.modifiers == modifiers)
            .copied();
        if let Some(previous) = previous {
            tracing::debug!(
                target: targets::ACCEL,
                ?key,
                ?modifiers,
                old = ?previous.widget,
                new = ?widget,
                "replacing accelerator"
            );
            tree.notify_accelerator_removed(previous.widget);
            self.inner.borrow_mut().buckets[bucket].retain(|entry| *entry != previous);
        }

        self.inner.borrow_mut().buckets[bucket].insert(
            0,
            AccelEntry {
                key,
                modifiers,
                widget,
            },
        );
        tracing::trace!(target: targets::ACCEL, ?key, ?modifiers, ?widget, bucket, "installed accelerator");
    }

    /// Remove the first binding found for `widget`, notifying it.
    pub fn remove(&self, tree: &mut WidgetTree, widget: WidgetId) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            inner.buckets.iter_mut().find_map(|chain| {
                let index = chain.iter().position(|entry| entry.widget == widget)?;
                Some(chain.remove(index))
            })
        };
        match removed {
            Some(entry) => {
                tracing::trace!(target: targets::ACCEL, key = ?entry.key, ?widget, "removed accelerator");
                tree.notify_accelerator_removed(widget);
                true
            }
            None => false,
        }
    }

    /// Activate the widget bound to `key` with `modifiers`, if any.
    ///
    /// Returns `true` only if the bound widget activated. A keystroke whose
    /// target is insensitive or has no action is left for ordinary key
    /// delivery.
    #[tracing::instrument(skip_all, target = "trellis::accel", level = "trace")]
    pub fn check(&self, tree: &mut WidgetTree, key: char, modifiers: ModifierType) -> bool {
        let Some(widget) = self.lookup(key, modifiers) else {
            return false;
        };
        if !tree.contains(widget) {
            tracing::warn!(target: targets::ACCEL, ?key, ?modifiers, ?widget, "accelerator bound to a destroyed widget");
            return false;
        }
        let activated = tree.activate(widget);
        tracing::debug!(target: targets::ACCEL, ?key, ?modifiers, ?widget, activated, "accelerator hit");
        activated
    }
}

impl fmt::Debug for AcceleratorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AcceleratorTable")
            .field("bindings", &inner.buckets.iter().map(Vec::len).sum::<usize>())
            .field("ref_count", &inner.ref_count)
            .field("destroyed", &inner.destroyed)
            .finish()
    }
}

impl WidgetTree {
    /// Bind an accelerator to `widget` if the widget's `install_accelerator`
    /// hook accepts it. Returns whether it was installed.
    pub fn install_accelerator(
        &mut self,
        widget: WidgetId,
        table: &AcceleratorTable,
        key: char,
        modifiers: ModifierType,
    ) -> bool {
        if !self.approve_accelerator(widget, key, modifiers) {
            tracing::debug!(target: targets::ACCEL, ?widget, ?key, "accelerator refused by widget");
            return false;
        }
        table.install(self, widget, key, modifiers);
        true
    }

    /// Remove `widget`'s binding from `table`.
    pub fn remove_accelerator(&mut self, widget: WidgetId, table: &AcceleratorTable) -> bool {
        table.remove(self, widget)
    }
}
