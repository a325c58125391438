//! Metric gathering.
//!
//! A [`Gatherer`] produces the current snapshot of metric families on
//! demand. Unlike `prometheus::Registry::gather`, a gatherer can report a
//! failure *next to* the families it did manage to collect, which lets the
//! HTTP layer decide whether a partial scrape is still worth serving.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::collections::HashSet;
use std::sync::Arc;

use prometheus::proto::{Metric, MetricFamily};

use crate::error::GatherError;

/// Result of a single gather call.
#[derive(Debug, Default)]
pub struct Gathered {
    /// Metric families in the order the gatherer produced them.
    pub families: Vec<MetricFamily>,
    /// Failure encountered while gathering, if any.
    pub error: Option<GatherError>,
}

impl Gathered {
    /// A complete, error-free snapshot.
    pub fn ok(families: Vec<MetricFamily>) -> Self {
        Self {
            families,
            error: None,
        }
    }

    /// A snapshot that is missing whatever `error` describes.
    pub fn partial(families: Vec<MetricFamily>, error: GatherError) -> Self {
        Self {
            families,
            error: Some(error),
        }
    }

    /// A failed gather with nothing to show.
    pub fn failed(error: GatherError) -> Self {
        Self {
            families: Vec::new(),
            error: Some(error),
        }
    }

    /// Returns true if no error was reported.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Splits into families and error.
    pub fn into_parts(self) -> (Vec<MetricFamily>, Option<GatherError>) {
        (self.families, self.error)
    }
}

/// A source of metric families.
///
/// Implementations must be safe to call from several threads at once: the
/// HTTP handler gathers once per scrape and scrapes may overlap.
///
/// # Implementors
///
/// - `prometheus::Registry` - never reports an error
/// - [`crate::Registry`] - the registry wrapper used for self-instrumentation
/// - [`GatherFn`] - adapts a closure
/// - [`Gatherers`] - merges several gatherers
pub trait Gatherer: Send + Sync {
    /// Collects the current metric families.
    fn gather(&self) -> Gathered;
}

impl Gatherer for prometheus::Registry {
    fn gather(&self) -> Gathered {
        Gathered::ok(prometheus::Registry::gather(self))
    }
}

impl<G: Gatherer + ?Sized> Gatherer for Arc<G> {
    fn gather(&self) -> Gathered {
        (**self).gather()
    }
}

impl<G: Gatherer + ?Sized> Gatherer for Box<G> {
    fn gather(&self) -> Gathered {
        (**self).gather()
    }
}

/// Gatherer backed by a closure.
///
/// # Example
///
/// ```
/// use promaxum_core::{Gathered, Gatherer, gather_fn};
///
/// let gatherer = gather_fn(|| Gathered::ok(Vec::new()));
/// assert!(gatherer.gather().is_ok());
/// ```
#[derive(Clone)]
pub struct GatherFn<F>(F);

/// Wraps a closure into a [`Gatherer`].
pub fn gather_fn<F>(f: F) -> GatherFn<F>
where
    F: Fn() -> Gathered + Send + Sync,
{
    GatherFn(f)
}

impl<F> Gatherer for GatherFn<F>
where
    F: Fn() -> Gathered + Send + Sync,
{
    fn gather(&self) -> Gathered {
        (self.0)()
    }
}

/// Merges the output of several gatherers into one snapshot.
///
/// Families with the same name are merged when their type and help text
/// agree. Conflicting families and metrics that repeat an already seen label
/// set are dropped and reported in the returned error, while everything
/// consistent is still returned. The merged families are sorted by name.
#[derive(Default)]
pub struct Gatherers {
    sources: Vec<Box<dyn Gatherer>>,
}

impl Gatherers {
    /// Creates an empty combinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a gatherer.
    pub fn with(mut self, gatherer: impl Gatherer + 'static) -> Self {
        self.sources.push(Box::new(gatherer));
        self
    }

    /// Adds a gatherer in place.
    pub fn push(&mut self, gatherer: impl Gatherer + 'static) {
        self.sources.push(Box::new(gatherer));
    }

    /// Number of combined gatherers.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no gatherer has been added.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Gatherer for Gatherers {
    fn gather(&self) -> Gathered {
        let mut by_name: BTreeMap<String, MetricFamily> = BTreeMap::new();
        let mut seen: HashSet<(String, Vec<(String, String)>)> = HashSet::new();
        let mut errors = Vec::new();

        for source in &self.sources {
            let (families, error) = source.gather().into_parts();
            if let Some(error) = error {
                errors.push(error);
            }

            for mut family in families {
                let name = family.get_name().to_string();
                let metrics = family.take_metric();

                let target = match by_name.entry(name.clone()) {
                    Entry::Vacant(slot) => slot.insert(family),
                    Entry::Occupied(slot) => {
                        let existing = slot.into_mut();
                        if existing.get_field_type() != family.get_field_type() {
                            errors.push(GatherError::inconsistent(
                                &name,
                                format!(
                                    "has type {:?} but was collected before with type {:?}",
                                    family.get_field_type(),
                                    existing.get_field_type()
                                ),
                            ));
                            continue;
                        }
                        if existing.get_help() != family.get_help() {
                            errors.push(GatherError::inconsistent(
                                &name,
                                format!(
                                    "has help {:?} but was collected before with help {:?}",
                                    family.get_help(),
                                    existing.get_help()
                                ),
                            ));
                            continue;
                        }
                        existing
                    },
                };

                for metric in metrics.into_vec() {
                    if !seen.insert((name.clone(), label_signature(&metric))) {
                        errors.push(GatherError::inconsistent(
                            &name,
                            "a metric with the same label values was collected before",
                        ));
                        continue;
                    }
                    target.mut_metric().push(metric);
                }
            }
        }

        // Families left without metrics carry nothing worth exposing.
        let families: Vec<MetricFamily> = by_name
            .into_values()
            .filter(|family| !family.get_metric().is_empty())
            .collect();

        if errors.is_empty() {
            Gathered::ok(families)
        } else {
            Gathered::partial(families, GatherError::multiple(errors))
        }
    }
}

fn label_signature(metric: &Metric) -> Vec<(String, String)> {
    let mut labels: Vec<(String, String)> = metric
        .get_label()
        .iter()
        .map(|pair| (pair.get_name().to_string(), pair.get_value().to_string()))
        .collect();
    labels.sort();
    labels
}
