use crate::{Adapter, Materialized};

use fabric_core::{err, Error, Materialization, Relation, Result};
use std::time::Instant;
use tracing::{info, warn};

/// Where a materialization stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing has been written yet.
    Absent,

    /// New rows or definitions are being built under a scratch name, or
    /// directly under the target name when no target exists.
    Staging,

    /// Staged columns are compared with the contract or the existing target.
    Validating,

    /// The staged object replaces or merges into the target.
    Publishing,

    Committed,

    /// The materialization failed. Scratch relations were dropped on a best
    /// effort basis; a retained backup is reported by the error.
    RolledBack,
}

impl State {
    fn can_advance_to(self, next: State) -> bool {
        use State::*;

        matches!(
            (self, next),
            (Absent, Staging)
                | (Staging, Validating)
                | (Staging, Publishing)
                | (Validating, Publishing)
                | (Publishing, Committed)
                | (Absent | Staging | Validating | Publishing, RolledBack)
        )
    }
}

/// Tracks one materialization: its state and the scratch relations it owns.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    target: Relation,
    materialization: Materialization,
    state: State,
    history: Vec<State>,

    /// Scratch relations to drop when the materialization ends, whatever
    /// the outcome.
    owned: Vec<Relation>,

    started: Instant,
}

impl Lifecycle {
    pub(crate) fn new(target: &Relation, materialization: Materialization) -> Lifecycle {
        Lifecycle {
            target: target.clone(),
            materialization,
            state: State::Absent,
            history: vec![State::Absent],
            owned: vec![],
            started: Instant::now(),
        }
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn advance(&mut self, next: State) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(err!(
                "{} materialization of {} cannot move from {:?} to {next:?}",
                self.materialization,
                self.target,
                self.state
            ));
        }

        info!(
            target = %self.target,
            materialization = %self.materialization,
            from = ?self.state,
            to = ?next,
            "lifecycle transition"
        );
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Registers a scratch relation and returns it.
    pub(crate) fn own(&mut self, relation: Relation) -> Relation {
        if !self.owned.contains(&relation) {
            self.owned.push(relation.clone());
        }
        relation
    }

    /// Stops tracking a scratch relation, once it was renamed into place or
    /// dropped.
    pub(crate) fn release(&mut self, relation: &Relation) {
        self.owned.retain(|owned| !owned.same_name(relation));
    }

    /// Ends the materialization: drops the scratch relations still owned,
    /// then records the outcome.
    pub(crate) async fn settle(
        mut self,
        adapter: &mut Adapter,
        outcome: Result<(Vec<Relation>, Option<u64>)>,
    ) -> Result<Materialized> {
        for relation in std::mem::take(&mut self.owned) {
            if let Err(err) = adapter.drop_if_exists(&relation).await {
                warn!(relation = %relation, error = %err, "failed to drop scratch relation");
            }
        }

        match outcome {
            Ok((relations, rows_affected)) => {
                self.advance(State::Committed)?;
                info!(
                    target = %self.target,
                    materialization = %self.materialization,
                    elapsed = ?self.started.elapsed(),
                    "materialized"
                );
                Ok(Materialized {
                    relations,
                    history: self.history,
                    rows_affected,
                })
            }
            Err(err) => Err(self.roll_back(err)),
        }
    }

    fn roll_back(&mut self, err: Error) -> Error {
        if let Err(transition) = self.advance(State::RolledBack) {
            warn!(error = %transition, "unexpected lifecycle state on failure");
        }
        warn!(
            target = %self.target,
            materialization = %self.materialization,
            error = %err,
            "materialization failed"
        );
        err
    }
}
