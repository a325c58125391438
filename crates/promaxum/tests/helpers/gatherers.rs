//! Gatherers de prueba.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use promaxum_core::{GatherError, Gathered, Gatherer, gather_fn};
use prometheus::{IntCounter, IntGauge, Registry};

/// Registry con un counter y un gauge.
pub fn sample_registry() -> Registry {
    let registry = Registry::new();

    let scrapes = IntCounter::new("app_jobs_total", "Jobs processed").unwrap();
    scrapes.inc_by(7);
    registry.register(Box::new(scrapes)).unwrap();

    let queue = IntGauge::new("app_queue_depth", "Jobs waiting").unwrap();
    queue.set(3);
    registry.register(Box::new(queue)).unwrap();

    registry
}

/// Gatherer that fails without producing anything.
pub fn failing(message: &'static str) -> impl Gatherer + Clone + 'static {
    gather_fn(move || Gathered::failed(GatherError::collector("broken", message)))
}

/// Gatherer returning `sample_registry` together with an error.
pub fn partial(message: &'static str) -> impl Gatherer + Clone + 'static {
    let registry = sample_registry();
    gather_fn(move || {
        Gathered::partial(
            registry.gather(),
            GatherError::collector("flaky", message),
        )
    })
}

/// Barrier that holds gathers until opened.
#[derive(Default)]
pub struct Gate {
    state: Mutex<GateState>,
    opened: Condvar,
}

#[derive(Default)]
struct GateState {
    open: bool,
    entered: usize,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks the calling thread until the gate opens.
    pub fn pass(&self) {
        let mut state = self.state.lock();
        state.entered += 1;
        while !state.open {
            self.opened.wait(&mut state);
        }
    }

    pub fn open(&self) {
        self.state.lock().open = true;
        self.opened.notify_all();
    }

    pub fn entered(&self) -> usize {
        self.state.lock().entered
    }

    /// Waits until `n` gathers are blocked on the gate.
    pub async fn wait_for(&self, n: usize) {
        for _ in 0..500 {
            if self.entered() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("only {} of {} gathers reached the gate", self.entered(), n);
    }
}

/// Gatherer that waits on `gate` before gathering `sample_registry`.
pub fn gated(gate: Arc<Gate>) -> impl Gatherer + Clone + 'static {
    let registry = sample_registry();
    gather_fn(move || {
        gate.pass();
        Gathered::ok(registry.gather())
    })
}
