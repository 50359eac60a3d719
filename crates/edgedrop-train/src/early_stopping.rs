//! Early stopping on validation loss.
//!
//! [`EarlyStopping`] is the bare state machine: feed it losses, it says
//! whether the loss improved and whether training should halt. It never
//! touches parameters. [`EarlyStoppingController`] pairs it with a
//! [`CheckpointStore`] and persists the parameters on every improvement.
//!
//! ```text
//!            loss < best              counter >= patience
//! ACTIVE ─────────────────▶ ACTIVE ─────────────────────────▶ STOPPED
//!   │  (counter = 0, save)
//!   └── loss >= best: counter += 1
//! ```
//!
//! A patience of 0 disables the whole mechanism: nothing is recorded and
//! the controller never stops.

use crate::checkpoint::CheckpointStore;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Outcome of a single observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Patience is 0; the observation was ignored.
    Disabled,
    /// New best loss; the parameters should be snapshotted.
    Improved,
    /// No improvement; `counter` consecutive epochs without one.
    NoImprovement { counter: usize },
    /// Patience exhausted.
    Stopped,
}

/// Whether training may continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Active,
    Stopped,
}

/// Patience-based early stopping state machine.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best_loss: f32,
    counter: usize,
    state: State,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f32::INFINITY,
            counter: 0,
            state: State::Active,
        }
    }

    /// Record a validation loss.
    ///
    /// Only a strictly smaller loss counts as improvement. Once stopped,
    /// further observations keep returning [`Decision::Stopped`].
    pub fn observe(&mut self, loss: f32) -> Decision {
        if self.patience == 0 {
            return Decision::Disabled;
        }
        if self.state == State::Stopped {
            return Decision::Stopped;
        }
        if loss < self.best_loss {
            self.best_loss = loss;
            self.counter = 0;
            return Decision::Improved;
        }
        self.counter += 1;
        if self.counter >= self.patience {
            self.state = State::Stopped;
            Decision::Stopped
        } else {
            Decision::NoImprovement {
                counter: self.counter,
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.patience > 0
    }

    pub fn should_stop(&self) -> bool {
        self.state == State::Stopped
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    /// Best loss seen so far (`+inf` before the first improvement).
    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn state(&self) -> State {
        self.state
    }
}

/// Early stopping that snapshots the best parameters into a store.
#[derive(Debug)]
pub struct EarlyStoppingController<S> {
    inner: EarlyStopping,
    store: S,
    best: Option<PathBuf>,
}

impl<S> EarlyStoppingController<S> {
    pub fn new(patience: usize, store: S) -> Self {
        Self {
            inner: EarlyStopping::new(patience),
            store,
            best: None,
        }
    }

    /// Observe a validation loss, persisting `params` if it improved.
    pub fn observe<P>(&mut self, loss: f32, params: &P) -> Result<Decision>
    where
        S: CheckpointStore<P>,
    {
        self.record(loss, |store| store.save(params))
    }

    /// Like [`observe`](Self::observe), but only builds the parameter
    /// snapshot when it is about to be saved.
    pub fn observe_with<P, F>(&mut self, loss: f32, params: F) -> Result<Decision>
    where
        S: CheckpointStore<P>,
        F: FnOnce() -> P,
    {
        self.record(loss, |store| store.save(&params()))
    }

    fn record(
        &mut self,
        loss: f32,
        save: impl FnOnce(&mut S) -> Result<PathBuf>,
    ) -> Result<Decision> {
        let decision = self.inner.observe(loss);
        match decision {
            Decision::Improved => {
                let location = save(&mut self.store)?;
                tracing::debug!(loss, location = %location.display(), "saved best parameters");
                self.best = Some(location);
            }
            Decision::Stopped => {
                tracing::info!(
                    patience = self.inner.patience(),
                    best_loss = self.inner.best_loss(),
                    "early stopping"
                );
            }
            Decision::Disabled | Decision::NoImprovement { .. } => {}
        }
        Ok(decision)
    }

    pub fn should_stop(&self) -> bool {
        self.inner.should_stop()
    }

    /// Parameters from the last improvement.
    pub fn restore<P>(&self) -> Result<P>
    where
        S: CheckpointStore<P>,
    {
        let location = self
            .best
            .as_deref()
            .ok_or_else(|| Error::NotFound("no snapshot has been persisted".into()))?;
        self.store.load(location)
    }

    /// Load parameters from an arbitrary location in the same store.
    ///
    /// Used for warm starts; does not affect the tracked best snapshot.
    pub fn load_from<P>(&self, location: &Path) -> Result<P>
    where
        S: CheckpointStore<P>,
    {
        self.store.load(location)
    }

    /// Location of the current best snapshot, if any.
    pub fn best_location(&self) -> Option<&Path> {
        self.best.as_deref()
    }

    pub fn state(&self) -> &EarlyStopping {
        &self.inner
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;

    #[test]
    fn test_disabled() {
        let mut es = EarlyStopping::new(0);
        for loss in [1.0, 2.0, 3.0, 4.0] {
            assert_eq!(es.observe(loss), Decision::Disabled);
        }
        assert!(!es.should_stop());
        assert_eq!(es.best_loss(), f32::INFINITY);
    }

    #[test]
    fn test_ties_are_not_improvement() {
        let mut es = EarlyStopping::new(2);
        assert_eq!(es.observe(0.5), Decision::Improved);
        assert_eq!(es.observe(0.5), Decision::NoImprovement { counter: 1 });
        assert_eq!(es.observe(0.5), Decision::Stopped);
    }

    #[test]
    fn test_improvement_resets_counter() {
        let mut es = EarlyStopping::new(2);
        es.observe(1.0);
        es.observe(1.1);
        assert_eq!(es.counter(), 1);
        assert_eq!(es.observe(0.8), Decision::Improved);
        assert_eq!(es.counter(), 0);
        assert_eq!(es.best_loss(), 0.8);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let mut es = EarlyStopping::new(1);
        es.observe(1.0);
        assert_eq!(es.observe(1.0), Decision::Stopped);
        assert_eq!(es.observe(0.1), Decision::Stopped);
        assert_eq!(es.best_loss(), 1.0);
        assert_eq!(es.state(), State::Stopped);
    }

    #[test]
    fn test_nan_loss_is_not_improvement() {
        let mut es = EarlyStopping::new(3);
        assert_eq!(es.observe(f32::NAN), Decision::NoImprovement { counter: 1 });
    }

    #[test]
    fn test_controller_saves_only_on_improvement() {
        let mut ctl = EarlyStoppingController::new(3, MemoryCheckpointStore::new());
        ctl.observe(1.0, &vec![1.0f32]).unwrap();
        ctl.observe(1.2, &vec![2.0f32]).unwrap();
        ctl.observe(0.7, &vec![3.0f32]).unwrap();
        assert_eq!(ctl.store().saves(), 2);
        let best: Vec<f32> = ctl.restore().unwrap();
        assert_eq!(best, vec![3.0]);
    }

    #[test]
    fn test_restore_before_snapshot() {
        let ctl = EarlyStoppingController::new(3, MemoryCheckpointStore::<Vec<f32>>::new());
        let err = ctl.restore::<Vec<f32>>().unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
