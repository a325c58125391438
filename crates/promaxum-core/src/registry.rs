//! Collector registration with reuse of already registered collectors.
//!
//! `prometheus::Registry::register` only answers `AlreadyReg` when a
//! collector with the same descriptors exists; it cannot hand the live
//! collector back. [`Registry`] remembers every collector registered through
//! it so a second registration of an equivalent collector yields
//! [`Registration::AlreadyRegistered`] with the instance that is actually
//! being exported.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::Collector;
use tracing::debug;

use crate::error::RegistryError;
use crate::gather::{Gathered, Gatherer};

/// Outcome of a successful [`Registry::register`] call.
#[derive(Debug, Clone)]
pub enum Registration<C> {
    /// The collector was new and is now registered.
    Registered(C),
    /// An equivalent collector was registered before; this is that instance.
    AlreadyRegistered(C),
}

impl<C> Registration<C> {
    /// Returns the collector that is registered, whichever case applies.
    pub fn into_inner(self) -> C {
        match self {
            Self::Registered(c) | Self::AlreadyRegistered(c) => c,
        }
    }

    /// Returns true if an existing collector was reused.
    pub fn is_reused(&self) -> bool {
        matches!(self, Self::AlreadyRegistered(_))
    }
}

type Known = HashMap<Vec<(u64, u64)>, Box<dyn Any + Send + Sync>>;

/// A shareable `prometheus::Registry` handle.
///
/// Cloning is cheap and every clone talks to the same underlying registry.
///
/// # Example
///
/// ```
/// use promaxum_core::{Registration, Registry};
/// use prometheus::IntCounter;
///
/// let registry = Registry::new();
/// let first = IntCounter::new("jobs_total", "Jobs processed").unwrap();
/// let second = IntCounter::new("jobs_total", "Jobs processed").unwrap();
///
/// let first = registry.register(first).unwrap().into_inner();
/// let reused = registry.register(second).unwrap();
/// assert!(reused.is_reused());
///
/// first.inc();
/// assert_eq!(reused.into_inner().get(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    inner: prometheus::Registry,
    known: Arc<Mutex<Known>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose metrics get a name prefix and constant labels.
    pub fn new_custom(
        prefix: Option<String>,
        labels: Option<HashMap<String, String>>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            inner: prometheus::Registry::new_custom(prefix, labels)?,
            known: Arc::default(),
        })
    }

    /// Wraps an existing `prometheus::Registry`.
    ///
    /// Collectors registered on `inner` directly are exported, but they
    /// cannot be reused through [`Registry::register`].
    pub fn from_prometheus(inner: prometheus::Registry) -> Self {
        Self {
            inner,
            known: Arc::default(),
        }
    }

    /// Registers `collector`, or returns the equivalent collector that is
    /// already registered.
    ///
    /// # Errors
    ///
    /// - `RegistryError::IncompatibleExisting` if a collector with the same
    ///   name and constant labels is registered but differs in type, label
    ///   names or help text, or was not registered through this handle
    /// - `RegistryError::Prometheus` for every other rejection (for example a
    ///   same-named metric with other constant labels and label names)
    pub fn register<C>(&self, collector: C) -> Result<Registration<C>, RegistryError>
    where
        C: Collector + Clone + 'static,
    {
        let key = descriptor_key(&collector);
        let name = collector
            .desc()
            .first()
            .map(|desc| desc.fq_name.clone())
            .ok_or(RegistryError::NoDescriptors)?;

        let mut known = self.known.lock();
        match self.inner.register(Box::new(collector.clone())) {
            Ok(()) => {
                known.insert(key, Box::new(collector.clone()));
                Ok(Registration::Registered(collector))
            },
            Err(prometheus::Error::AlreadyReg) => {
                let existing = known
                    .get(&key)
                    .and_then(|existing| existing.downcast_ref::<C>())
                    .ok_or_else(|| RegistryError::incompatible_existing(&name))?;
                debug!(metric = %name, "Reusing already registered collector");
                Ok(Registration::AlreadyRegistered(existing.clone()))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a collector previously registered with equivalent descriptors.
    pub fn unregister<C>(&self, collector: &C) -> Result<(), RegistryError>
    where
        C: Collector + Clone + 'static,
    {
        let mut known = self.known.lock();
        self.inner.unregister(Box::new(collector.clone()))?;
        known.remove(&descriptor_key(collector));
        Ok(())
    }

    /// Returns the wrapped `prometheus::Registry`.
    pub fn as_prometheus(&self) -> &prometheus::Registry {
        &self.inner
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("known_collectors", &self.known.lock().len())
            .finish()
    }
}

impl Gatherer for Registry {
    fn gather(&self) -> Gathered {
        Gathered::ok(self.inner.gather())
    }
}

// Identity plus dimensions: a same-named collector with other label names
// or help text must not be handed out as the existing one.
fn descriptor_key<C: Collector>(collector: &C) -> Vec<(u64, u64)> {
    let mut ids: Vec<(u64, u64)> = collector
        .desc()
        .iter()
        .map(|desc| (desc.id, desc.dim_hash))
        .collect();
    ids.sort_unstable();
    ids
}
