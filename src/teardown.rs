//! Teardown coordination: reverse boot-order destruction with per-component
//! failure isolation.

use crate::component::Lifecycle as _;
use crate::container::Container;
use crate::registry::BootedEntry;
use thiserror::Error;

/// A failed destroy hook, reported through the container's
/// destroy-failure hook. Teardown continues regardless.
#[derive(Debug, Error)]
#[error("destroy hook failed for `{key}`")]
pub struct DestroyError {
    pub key: &'static str,
    #[source]
    pub source: anyhow::Error,
}

pub(crate) type DestroyFailureHook = Box<dyn FnMut(&DestroyError)>;

pub(crate) fn log_destroy_failure() -> DestroyFailureHook {
    Box::new(|failure| {
        tracing::error!(key = failure.key, error = %failure.source, "destroy hook failed");
    })
}

/// Destroy every successfully booted component in exact reverse boot order.
/// Destroy is best-effort: each failure is handed to `on_failure` and the
/// walk continues; nothing is retried.
pub(crate) fn run(booted: Vec<BootedEntry>, on_failure: &mut DestroyFailureHook) {
    if booted.is_empty() {
        return;
    }
    tracing::debug!(components = booted.len(), "tearing down container");
    for entry in booted.into_iter().rev() {
        tracing::debug!(key = entry.key, "destroying component");
        if let Err(source) = entry.lifecycle.borrow_mut().destroy() {
            on_failure(&DestroyError {
                key: entry.key,
                source,
            });
        }
    }
}

impl Container {
    /// Tear down every booted component, most recently booted first.
    ///
    /// Runs at most once per set of booted components: the boot-order list
    /// is drained, so calling `dispose` again (or letting the container
    /// drop afterwards) is a no-op. Components that never successfully
    /// booted are not destroyed.
    pub fn dispose(&mut self) {
        let booted = self.registry.drain_booted();
        run(booted, &mut self.on_destroy_failure);
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::container::Container;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        fail: bool,
    }

    impl Component for Recorder {
        type Interface = Self;

        fn destroy(&mut self) -> anyhow::Result<()> {
            self.log.borrow_mut().push(self.name);
            if self.fail {
                anyhow::bail!("{} refused to die", self.name);
            }
            Ok(())
        }
    }

    fn booted_recorder(name: &'static str, log: &Log, fail: bool) -> BootedEntry {
        BootedEntry {
            key: name,
            lifecycle: Rc::new(RefCell::new(Recorder {
                name,
                log: log.clone(),
                fail,
            })),
        }
    }

    #[test]
    fn destroys_in_reverse_order() {
        let log: Log = Rc::default();
        let booted = ["first", "second", "third"]
            .into_iter()
            .map(|name| booted_recorder(name, &log, false))
            .collect();

        run(booted, &mut log_destroy_failure());
        assert_eq!(*log.borrow(), ["third", "second", "first"]);
    }

    #[test]
    fn failure_is_reported_and_does_not_stop_teardown() {
        let log: Log = Rc::default();
        let booted = ["first", "flaky", "third"]
            .into_iter()
            .map(|name| booted_recorder(name, &log, name == "flaky"))
            .collect();

        let failed: Log = Rc::default();
        let sink = failed.clone();
        let mut hook: DestroyFailureHook =
            Box::new(move |failure| sink.borrow_mut().push(failure.key));

        run(booted, &mut hook);
        assert_eq!(*log.borrow(), ["third", "flaky", "first"]);
        assert_eq!(*failed.borrow(), ["flaky"]);
    }

    #[test]
    fn dispose_is_idempotent() {
        let log: Log = Rc::default();
        let mut env = Container::new();
        env.register(Recorder {
            name: "only",
            log: log.clone(),
            fail: false,
        });
        env.resolve::<Recorder>().unwrap();

        env.dispose();
        env.dispose();
        drop(env);
        assert_eq!(*log.borrow(), ["only"]);
    }
}
