//! The data model that flows through the executor: keys, windowed values,
//! and the immutable `Bundle` batches that transforms consume and produce.

// Layer 1: Standard library imports
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};

// Layer 3: Internal module imports
use crate::util::{BundleId, CollectionId, TransformId};

/// A per-key identity, carried as pre-hashed/pre-coded bytes so it stays
/// `Hash + Eq` without requiring user element types to support it.
///
/// The executor never interprets the bytes; the evaluation context and user
/// evaluators are the only parties that assign them meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Arc<[u8]>);

impl Key {
    /// Build a key from raw, already-encoded bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Build a key from anything that can be viewed as a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }

    /// Borrow the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// One element of a bundle, paired with the event-time timestamp it carries.
///
/// The element value is type-erased (`Arc<dyn Any>`): a real pipeline graph
/// has heterogeneous element types flowing on different collections, unlike
/// a single monomorphized message type. Consumers downcast via
/// [`WindowedValue::downcast_ref`].
#[derive(Clone)]
pub struct WindowedValue {
    value: Arc<dyn Any + Send + Sync>,
    timestamp: DateTime<Utc>,
}

impl WindowedValue {
    /// Wrap a concrete value with its event-time timestamp.
    pub fn new<T: Send + Sync + 'static>(value: T, timestamp: DateTime<Utc>) -> Self {
        Self {
            value: Arc::new(value),
            timestamp,
        }
    }

    /// Wrap an already-erased value.
    pub fn from_any(value: Arc<dyn Any + Send + Sync>, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// The event-time timestamp this value was produced at.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Attempt to downcast the erased value to a concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Borrow the erased value.
    pub fn value(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }
}

impl fmt::Debug for WindowedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowedValue")
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// An immutable batch of elements flowing between transforms.
///
/// Bundles are never mutated after creation: a consumer receives one as an
/// input bundle and consumes it exactly once (§3 invariant).
#[derive(Debug, Clone)]
pub struct Bundle {
    id: BundleId,
    producer: Option<TransformId>,
    collection: CollectionId,
    key: Option<Key>,
    values: Vec<WindowedValue>,
    commit_time: DateTime<Utc>,
}

impl Bundle {
    /// Start building a bundle for the given output collection.
    pub fn builder(collection: CollectionId) -> BundleBuilder {
        BundleBuilder::new(collection)
    }

    /// Stable identity of this bundle.
    pub fn id(&self) -> BundleId {
        self.id
    }

    /// The transform that produced this bundle, or `None` for a root input.
    pub fn producer(&self) -> Option<TransformId> {
        self.producer
    }

    /// The logical collection this bundle belongs to.
    pub fn collection(&self) -> CollectionId {
        self.collection
    }

    /// The key, present iff the collection is declared keyed.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// True iff this bundle carries a key (i.e. its collection is keyed).
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    /// The ordered sequence of windowed values in this bundle.
    pub fn values(&self) -> &[WindowedValue] {
        &self.values
    }

    /// The instant this bundle was committed by the evaluation context.
    pub fn commit_time(&self) -> DateTime<Utc> {
        self.commit_time
    }
}

/// Builder for [`Bundle`], used both by evaluation-context commits and by
/// the timer-firing synthetic-bundle path (§4.5b).
pub struct BundleBuilder {
    collection: CollectionId,
    producer: Option<TransformId>,
    key: Option<Key>,
    values: Vec<WindowedValue>,
    commit_time: Option<DateTime<Utc>>,
}

impl BundleBuilder {
    fn new(collection: CollectionId) -> Self {
        Self {
            collection,
            producer: None,
            key: None,
            values: Vec::new(),
            commit_time: None,
        }
    }

    /// Set the producing transform.
    pub fn producer(mut self, producer: TransformId) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Set the key, marking this as a keyed bundle.
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Append one windowed value.
    pub fn push(mut self, value: WindowedValue) -> Self {
        self.values.push(value);
        self
    }

    /// Append several windowed values at once.
    pub fn extend(mut self, values: impl IntoIterator<Item = WindowedValue>) -> Self {
        self.values.extend(values);
        self
    }

    /// Set the commit instant explicitly (defaults to `Utc::now()` on build).
    pub fn commit_time(mut self, commit_time: DateTime<Utc>) -> Self {
        self.commit_time = Some(commit_time);
        self
    }

    /// Finalize into an immutable `Bundle`.
    pub fn build(self) -> Bundle {
        Bundle {
            id: BundleId::new(),
            producer: self.producer,
            collection: self.collection,
            key: self.key,
            values: self.values,
            commit_time: self.commit_time.unwrap_or_else(Utc::now),
        }
    }
}
