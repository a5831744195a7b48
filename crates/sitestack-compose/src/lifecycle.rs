//! Per-declaration lifecycle ledger.
//!
//! The ledger records, but never drives, the state machine
//! `Declared -> Planned -> Provisioning -> Provisioned | Failed`.
//! Everything past `Planned` is reported by the external apply step.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sitestack_common::error::{Result, SiteStackError};
use sitestack_common::types::DeclarationState;

use crate::plan::Plan;

/// Current state of one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateRecord {
    /// Lifecycle state.
    pub state: DeclarationState,
    /// When the state was entered.
    pub changed_at: DateTime<Utc>,
    /// Failure reason reported by the apply step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Lifecycle states of every declaration in a deployment.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Ledger {
    records: BTreeMap<String, StateRecord>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly accepted declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] if `name` is already recorded.
    pub fn declare(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.records.contains_key(&name) {
            return Err(SiteStackError::invalid_input(format!(
                "declaration \"{name}\" is already recorded"
            )));
        }
        let _ = self.records.insert(
            name,
            StateRecord {
                state: DeclarationState::Declared,
                changed_at: Utc::now(),
                reason: None,
            },
        );
        Ok(())
    }

    /// Moves every step of `plan` from `Declared` to `Planned`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::NotFound`] for a step that was never
    /// declared and [`SiteStackError::InvalidTransition`] for one that is
    /// not in `Declared`. Nothing is changed on error.
    pub fn mark_planned(&mut self, plan: &Plan) -> Result<()> {
        for step in plan.steps() {
            let record = self.get(step.name())?;
            check_transition(step.name(), record.state, DeclarationState::Planned)?;
        }
        for step in plan.steps() {
            self.transition(step.name(), DeclarationState::Planned, None)?;
        }
        Ok(())
    }

    /// Records a state change reported for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::NotFound`] for an unknown name and
    /// [`SiteStackError::InvalidTransition`] if the state machine does not
    /// allow the move.
    pub fn transition(
        &mut self,
        name: &str,
        next: DeclarationState,
        reason: Option<String>,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| not_found(name))?;
        check_transition(name, record.state, next)?;
        tracing::debug!(name, from = %record.state, to = %next, "state transition");
        *record = StateRecord {
            state: next,
            changed_at: Utc::now(),
            reason,
        };
        Ok(())
    }

    /// Returns the state of `name`.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<DeclarationState> {
        self.records.get(name).map(|r| r.state)
    }

    /// Returns the full record of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::NotFound`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<&StateRecord> {
        self.records.get(name).ok_or_else(|| not_found(name))
    }

    /// Returns the names currently in `state`, sorted.
    #[must_use]
    pub fn names_in(&self, state: DeclarationState) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(_, r)| r.state == state)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Returns whether every declaration reached a terminal state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.records.values().all(|r| r.state.is_terminal())
    }

    /// Returns the number of recorded declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_transition(name: &str, from: DeclarationState, to: DeclarationState) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SiteStackError::InvalidTransition {
            name: name.to_owned(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn not_found(name: &str) -> SiteStackError {
    SiteStackError::NotFound {
        kind: "declaration",
        id: name.to_owned(),
    }
}
