//! Snapshot ownership and the coordinating thread.

use crate::reconcile::replay;
use crate::view::TreeView;
use frond_diff::diff;
use frond_snapshot::{Snapshot, TreeItem};
use std::fmt;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Tunables for the apply path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// When an unanimated apply produces a script at least this long, the
    /// view is told to reload wholesale instead of replaying every
    /// operation. The default never reloads.
    pub reload_threshold: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reload_threshold: usize::MAX,
        }
    }
}

impl CoordinatorConfig {
    /// Set the unanimated-reload threshold.
    #[must_use]
    pub fn with_reload_threshold(mut self, threshold: usize) -> Self {
        self.reload_threshold = threshold;
        self
    }
}

/// The single-threaded transaction core: one snapshot, one view.
///
/// Each [`apply`](Engine::apply) is a complete state transition. The stored
/// snapshot is swapped inside the same call that drives the view, so no
/// observer can see a half-applied state. Use this directly when everything
/// already lives on one thread; otherwise wrap it in a [`Coordinator`].
#[derive(Debug)]
pub struct Engine<T: TreeItem, V> {
    current: Snapshot<T>,
    view: V,
    config: CoordinatorConfig,
}

impl<T, V> Engine<T, V>
where
    T: TreeItem,
    V: TreeView<T::Id>,
{
    /// Create an engine over an initial snapshot and a live view.
    pub fn new(initial: Snapshot<T>, view: V) -> Self {
        Self::with_config(initial, view, CoordinatorConfig::default())
    }

    /// Create an engine with explicit tunables.
    pub fn with_config(initial: Snapshot<T>, view: V, config: CoordinatorConfig) -> Self {
        Self {
            current: initial,
            view,
            config,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot<T> {
        &self.current
    }

    /// The wrapped view.
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Diff the current snapshot against `next`, drive the view through
    /// the resulting script in one transaction, and swap the stored
    /// snapshot.
    pub fn apply(&mut self, next: Snapshot<T>, animate: bool) {
        let old_flat = self.current.flatten();
        let new_flat = next.flatten();
        let script = diff(&old_flat, &new_flat);

        tracing::debug!(
            ops = script.len(),
            old = old_flat.len(),
            new = new_flat.len(),
            animate,
            "applying snapshot"
        );

        if script.is_empty() {
            self.current = next;
            return;
        }

        if !animate && script.len() >= self.config.reload_threshold {
            // Behaviorally equivalent to the incremental path, minus the
            // per-operation work.
            self.current = next;
            self.view.begin_updates(false);
            self.view.reload_all();
            self.view.end_updates();
            return;
        }

        replay(&script, &old_flat, &new_flat, &mut self.view, animate);
        self.current = next;
    }
}

/// The coordinator channel closed because its thread is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

impl fmt::Display for Disconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coordinating thread is no longer running")
    }
}

impl std::error::Error for Disconnected {}

enum Command<T: TreeItem> {
    Snapshot(mpsc::Sender<Snapshot<T>>),
    Apply {
        next: Snapshot<T>,
        animate: bool,
        completion: Option<Box<dyn FnOnce() + Send>>,
    },
    Shutdown,
}

/// Thread-confined owner of an [`Engine`].
///
/// All snapshot reads and view mutations happen on one dedicated
/// coordinating thread; callers on any thread talk to it through a command
/// channel. Applies never interleave: each one is diffed against the
/// snapshot left by the previous one, and a second `apply` waits in the
/// channel until the first transaction has completed.
pub struct Coordinator<T: TreeItem> {
    sender: mpsc::Sender<Command<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> Coordinator<T>
where
    T: TreeItem + Send + 'static,
    T::Id: Send,
{
    /// Spawn the coordinating thread, moving the view into it.
    #[must_use]
    pub fn spawn<V>(initial: Snapshot<T>, view: V) -> Self
    where
        V: TreeView<T::Id> + Send + 'static,
    {
        Self::spawn_with_config(initial, view, CoordinatorConfig::default())
    }

    /// Spawn with explicit tunables.
    #[must_use]
    pub fn spawn_with_config<V>(
        initial: Snapshot<T>,
        view: V,
        config: CoordinatorConfig,
    ) -> Self
    where
        V: TreeView<T::Id> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let engine = Engine::with_config(initial, view, config);
        let handle = thread::Builder::new()
            .name("frond-coordinator".into())
            .spawn(move || coordinator_loop(engine, receiver))
            .expect("failed to spawn coordinator thread");
        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// A coherent copy of the current snapshot.
    ///
    /// Marshals onto the coordinating thread and blocks for the reply, so
    /// the copy never reflects a partially applied transition.
    pub fn snapshot(&self) -> Result<Snapshot<T>, Disconnected> {
        let (reply, response) = mpsc::channel();
        self.sender
            .send(Command::Snapshot(reply))
            .map_err(|_| Disconnected)?;
        response.recv().map_err(|_| Disconnected)
    }

    /// Queue a snapshot for application and return immediately.
    ///
    /// The transaction runs on the coordinating thread; `completion` fires
    /// there once the view transaction has fully finished. The callback
    /// must not call back into this coordinator, which would deadlock the
    /// coordinating thread against itself.
    pub fn apply(
        &self,
        next: Snapshot<T>,
        animate: bool,
        completion: Option<Box<dyn FnOnce() + Send>>,
    ) -> Result<(), Disconnected> {
        self.sender
            .send(Command::Apply {
                next,
                animate,
                completion,
            })
            .map_err(|_| Disconnected)
    }

    /// Apply a snapshot and block until its transaction has completed.
    pub fn apply_blocking(&self, next: Snapshot<T>, animate: bool) -> Result<(), Disconnected> {
        let (done, finished) = mpsc::channel();
        self.apply(
            next,
            animate,
            Some(Box::new(move || {
                let _ = done.send(());
            })),
        )?;
        finished.recv().map_err(|_| Disconnected)
    }
}

impl<T: TreeItem> Drop for Coordinator<T> {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn coordinator_loop<T, V>(mut engine: Engine<T, V>, receiver: mpsc::Receiver<Command<T>>)
where
    T: TreeItem,
    V: TreeView<T::Id>,
{
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot().clone());
            }
            Command::Apply {
                next,
                animate,
                completion,
            } => {
                engine.apply(next, animate);
                if let Some(completion) = completion {
                    completion();
                }
            }
            Command::Shutdown => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{RecordingView, ViewOp};
    use frond_snapshot::{Anchor, Snapshot, TreeItem};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    struct Row(&'static str);

    impl TreeItem for Row {
        type Id = &'static str;
        fn id(&self) -> Self::Id {
            self.0
        }
    }

    fn abc() -> Snapshot<Row> {
        Snapshot::new()
            .append(vec![Row("a"), Row("b"), Row("c")], None)
            .unwrap()
    }

    #[test]
    fn engine_applies_and_swaps() {
        let mut engine = Engine::new(Snapshot::new(), RecordingView::new());
        engine.apply(abc(), false);
        assert_eq!(engine.snapshot().child_count(None), 3);
        assert_eq!(engine.view().expanded_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn reapplying_same_snapshot_is_silent() {
        let mut engine = Engine::new(Snapshot::new(), RecordingView::new());
        engine.apply(abc(), false);
        let ops_before = engine.view().ops().len();
        engine.apply(abc(), false);
        // No transaction at all for an empty script.
        assert_eq!(engine.view().ops().len(), ops_before);
    }

    #[test]
    fn round_trip_idempotence() {
        let mut engine = Engine::new(Snapshot::new(), RecordingView::new());
        let target = abc().move_to(&"c", Anchor::Before(&"a")).unwrap();
        engine.apply(abc(), false);
        engine.apply(target.clone(), false);
        let ops_before = engine.view().ops().len();
        engine.apply(target, false);
        assert_eq!(engine.view().ops().len(), ops_before);
    }

    #[test]
    fn unanimated_reload_above_threshold() {
        let config = CoordinatorConfig::default().with_reload_threshold(2);
        let mut engine = Engine::with_config(Snapshot::new(), RecordingView::new(), config);
        engine.apply(abc(), false);
        assert_eq!(
            engine.view().ops(),
            &[
                ViewOp::Begin { animated: false },
                ViewOp::Reload,
                ViewOp::End
            ]
        );
        assert_eq!(engine.snapshot().child_count(None), 3);
    }

    #[test]
    fn animated_apply_never_reloads() {
        let config = CoordinatorConfig::default().with_reload_threshold(1);
        let mut engine = Engine::with_config(Snapshot::new(), RecordingView::new(), config);
        engine.apply(abc(), true);
        assert!(engine.view().ops().iter().all(|op| !matches!(op, ViewOp::Reload)));
        assert_eq!(engine.view().expanded_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn small_script_stays_incremental() {
        let config = CoordinatorConfig::default().with_reload_threshold(10);
        let mut engine = Engine::with_config(Snapshot::new(), RecordingView::new(), config);
        engine.apply(abc(), false);
        assert!(engine.view().ops().iter().all(|op| !matches!(op, ViewOp::Reload)));
    }

    #[test]
    fn coordinator_snapshot_from_another_thread() {
        let coordinator = Coordinator::spawn(abc(), RecordingView::new());
        std::thread::scope(|scope| {
            let ids = scope
                .spawn(|| coordinator.snapshot().unwrap().child_ids(None).to_vec())
                .join()
                .unwrap();
            assert_eq!(ids, vec!["a", "b", "c"]);
        });
    }

    #[test]
    fn applies_serialize_in_submission_order() {
        let coordinator = Coordinator::spawn(Snapshot::new(), RecordingView::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = abc();
        let second = first.delete(&["b"]).unwrap();

        for (label, snapshot) in [("first", first), ("second", second)] {
            let order = Arc::clone(&order);
            coordinator
                .apply(
                    snapshot,
                    false,
                    Some(Box::new(move || {
                        order.lock().unwrap().push(label);
                    })),
                )
                .unwrap();
        }
        coordinator
            .apply_blocking(
                Snapshot::new()
                    .append(vec![Row("a"), Row("c"), Row("z")], None)
                    .unwrap(),
                false,
            )
            .unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        let ids = coordinator.snapshot().unwrap().child_ids(None).to_vec();
        assert_eq!(ids, vec!["a", "c", "z"]);
    }

    #[test]
    fn completion_observes_applied_state() {
        let coordinator = Coordinator::spawn(Snapshot::new(), RecordingView::new());
        coordinator.apply_blocking(abc(), true).unwrap();
        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.child_ids(None), &["a", "b", "c"]);
    }

    #[test]
    fn dropped_coordinator_reports_disconnected() {
        let coordinator = Coordinator::spawn(abc(), RecordingView::new());
        drop(coordinator);
        // A fresh coordinator handle cannot be used after drop by
        // construction; simulate the failure with a closed channel instead.
        let (sender, receiver) = mpsc::channel::<Command<Row>>();
        drop(receiver);
        let failed = Coordinator::<Row> {
            sender,
            handle: None,
        };
        assert_eq!(failed.snapshot().unwrap_err(), Disconnected);
        assert_eq!(failed.apply(abc(), false, None).unwrap_err(), Disconnected);
    }

    #[test]
    fn apply_logs_under_a_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut engine = Engine::new(Snapshot::new(), RecordingView::new());
            engine.apply(abc(), false);
            assert_eq!(engine.view().expanded_order(), vec!["a", "b", "c"]);
        });
    }
}
