//! Per-field change callbacks.
//!
//! An ordered multimap from field path to observers. Paths are opaque keys:
//! a callback registered for a path that the configuration never produces
//! simply never fires.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::diff::ChangeSet;
use crate::config::field::Scalar;
use crate::observability::metrics;

/// Observer invoked with the old and new value of a field.
pub type ChangeCallback = Arc<dyn Fn(&Scalar, &Scalar) + Send + Sync>;

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Callbacks that returned normally.
    pub invoked: usize,
    /// Callbacks that panicked.
    pub failed: usize,
}

#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<HashMap<String, Vec<ChangeCallback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback for `path`. Never replaces or deduplicates.
    pub fn register<F>(&self, path: impl Into<String>, callback: F)
    where
        F: Fn(&Scalar, &Scalar) + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .entry(path.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Number of callbacks registered for `path`.
    pub fn count(&self, path: &str) -> usize {
        self.callbacks.read().get(path).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// Invoke every callback registered for a changed path, in registration order.
    ///
    /// Each invocation is isolated: a panicking callback is logged and the
    /// remaining callbacks still run. The registry lock is not held while
    /// callbacks execute, so they may register further callbacks.
    pub fn dispatch(&self, changes: &ChangeSet) -> DispatchReport {
        let mut report = DispatchReport::default();
        if changes.is_empty() {
            return report;
        }

        for entry in changes {
            let targets: Vec<ChangeCallback> = match self.callbacks.read().get(&entry.path) {
                Some(cbs) => cbs.clone(),
                None => continue,
            };

            for callback in targets {
                match catch_unwind(AssertUnwindSafe(|| callback(&entry.old, &entry.new))) {
                    Ok(()) => {
                        report.invoked += 1;
                        metrics::record_callback("ok");
                    }
                    Err(_) => {
                        report.failed += 1;
                        metrics::record_callback("panic");
                        tracing::error!(path = %entry.path, "Change callback panicked");
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::diff::diff;
    use parking_lot::Mutex;
    use serde::Serialize;

    #[derive(Serialize, Clone)]
    struct Conf {
        app_name: String,
        version: i32,
    }

    fn changes() -> ChangeSet {
        let a = Conf {
            app_name: "X".into(),
            version: 1,
        };
        let b = Conf {
            app_name: "Y".into(),
            version: 2,
        };
        diff(&a, &b).unwrap()
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry = CallbackRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = log.clone();
            registry.register("version", move |old, new| {
                log.lock().push(format!("{}:{}->{}", tag, old, new));
            });
        }

        let report = registry.dispatch(&changes());
        assert_eq!(report.invoked, 2);
        assert_eq!(*log.lock(), vec!["first:1->2", "second:1->2"]);
    }

    #[test]
    fn test_unknown_and_unchanged_paths_are_skipped() {
        let registry = CallbackRegistry::new();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        registry.register("database.port", move |_, _| *h.lock() += 1);

        let report = registry.dispatch(&changes());
        assert_eq!(report, DispatchReport::default());
        assert_eq!(*hits.lock(), 0);
        assert_eq!(registry.count("database.port"), 1);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let registry = CallbackRegistry::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        registry.register("app_name", |_, _| panic!("observer failed"));
        let h = hits.clone();
        registry.register("app_name", move |_, new| h.lock().push(new.clone()));
        let h = hits.clone();
        registry.register("version", move |_, new| h.lock().push(new.clone()));

        let report = registry.dispatch(&changes());
        assert_eq!(report.failed, 1);
        assert_eq!(report.invoked, 2);
        assert_eq!(
            *hits.lock(),
            vec![Scalar::Str("Y".into()), Scalar::I32(2)]
        );
    }

    #[test]
    fn test_callback_may_register_during_dispatch() {
        let registry = Arc::new(CallbackRegistry::new());
        let r = registry.clone();
        registry.register("version", move |_, _| {
            r.register("version", |_, _| {});
        });

        registry.dispatch(&changes());
        assert_eq!(registry.count("version"), 2);
    }
}
