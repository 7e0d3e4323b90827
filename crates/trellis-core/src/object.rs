//! Widget identity and the type-tag registry.
//!
//! Every concrete widget kind gets a small integer [`TypeTag`] the first time
//! the registry sees it. The registry is an ordinary value owned by the
//! application context (the widget tree), so two trees never share counters
//! and tearing one down releases everything it assigned.
//!
//! # Key Types
//!
//! - [`WidgetId`] - Arena key for a widget node
//! - [`TypeTag`] - Per-kind identity assigned on first use
//! - [`TypeRegistry`] - Owner of the kind-to-tag mapping

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use slotmap::new_key_type;

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a widget node.
    ///
    /// `WidgetId`s are stable handles that remain valid while the node lives
    /// in its tree. They are plain indices, so holding one never keeps a
    /// widget alive; children use them as weak back-references to parents.
    pub struct WidgetId;
}

impl WidgetId {
    /// Convert the id to a raw u64 value for logging or interop.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// Small integer identifying a concrete widget kind.
///
/// Tags start at 1 and are handed out in order of first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(u32);

impl TypeTag {
    /// The raw tag value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
struct RegistryInner {
    by_type: HashMap<TypeId, TypeTag>,
    names: Vec<&'static str>,
}

/// Assigns [`TypeTag`]s to concrete kinds.
///
/// Lookups take a read lock; only the first sighting of a kind takes the
/// write lock.
#[derive(Default)]
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

static_assertions::assert_impl_all!(TypeRegistry: Send, Sync);

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tag for `T`, assigning the next free one on first use.
    pub fn tag_of<T: 'static>(&self) -> TypeTag {
        let type_id = TypeId::of::<T>();
        if let Some(tag) = self.inner.read().by_type.get(&type_id) {
            return *tag;
        }

        let mut inner = self.inner.write();
        // Another caller may have registered it between the two locks.
        if let Some(tag) = inner.by_type.get(&type_id) {
            return *tag;
        }
        let tag = TypeTag(inner.names.len() as u32 + 1);
        let name = std::any::type_name::<T>();
        inner.names.push(name);
        inner.by_type.insert(type_id, tag);
        tracing::debug!(target: targets::REGISTRY, tag = tag.0, kind = name, "registered widget kind");
        tag
    }

    /// Full type name for a tag assigned by this registry.
    pub fn name_of(&self, tag: TypeTag) -> Option<&'static str> {
        let index = (tag.0 as usize).checked_sub(1)?;
        self.inner.read().names.get(index).copied()
    }

    /// Number of kinds registered so far.
    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    /// Whether no kind has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("kinds", &self.inner.read().names)
            .finish()
    }
}
