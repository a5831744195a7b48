//! Tracking of one deployment against an external apply step.
//!
//! A [`Deployment`] owns a compiled plan, the lifecycle ledger, and the
//! output binder. The apply step asks for [`ready`](Deployment::ready)
//! steps, realizes them, and reports back; provisioned resources bind
//! the outputs declared on them.

use std::collections::{BTreeMap, HashSet};

use sitestack_common::error::{Result, SiteStackError};
use sitestack_common::types::{DeclarationState, Identifier};

use crate::lifecycle::Ledger;
use crate::outputs::{OutputBinder, OutputDeclaration};
use crate::plan::Plan;

/// A plan being applied, with its recorded progress and outputs.
#[derive(Debug, Clone)]
pub struct Deployment {
    plan: Plan,
    ledger: Ledger,
    binder: OutputBinder,
    outputs: Vec<OutputDeclaration>,
}

impl Deployment {
    /// Starts tracking `plan`; every step is declared, then moved to `Planned`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] if two outputs share an id and
    /// [`SiteStackError::DanglingReference`] if an output names a resource
    /// missing from the plan.
    pub fn new(plan: Plan, outputs: Vec<OutputDeclaration>) -> Result<Self> {
        let mut seen = HashSet::new();
        for output in &outputs {
            if !seen.insert(&output.id) {
                return Err(SiteStackError::invalid_input(format!(
                    "duplicate output id: \"{}\"",
                    output.id
                )));
            }
            if plan.step(&output.resource).is_none() {
                return Err(SiteStackError::DanglingReference {
                    from: output.id.to_string(),
                    missing: output.resource.clone(),
                });
            }
        }

        let mut ledger = Ledger::new();
        for step in plan.steps() {
            ledger.declare(step.name())?;
        }
        ledger.mark_planned(&plan)?;
        Ok(Self {
            plan,
            ledger,
            binder: OutputBinder::new(),
            outputs,
        })
    }

    /// Returns the plan being applied.
    #[must_use]
    pub const fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Returns the lifecycle ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the output declarations.
    #[must_use]
    pub fn outputs(&self) -> &[OutputDeclaration] {
        &self.outputs
    }

    /// Returns the output binder.
    #[must_use]
    pub const fn binder(&self) -> &OutputBinder {
        &self.binder
    }

    /// Returns planned steps whose dependencies are all provisioned, in plan order.
    #[must_use]
    pub fn ready(&self) -> Vec<&str> {
        self.plan
            .steps()
            .iter()
            .filter(|step| self.ledger.state(step.name()) == Some(DeclarationState::Planned))
            .filter(|step| {
                step.dependencies
                    .iter()
                    .all(|d| self.ledger.state(d) == Some(DeclarationState::Provisioned))
            })
            .map(|step| step.name())
            .collect()
    }

    /// Records that the apply step started realizing `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] if a dependency is not
    /// provisioned yet, plus any error of [`Ledger::transition`].
    pub fn report_started(&mut self, name: &str) -> Result<()> {
        let step = self.plan.step(name).ok_or_else(|| SiteStackError::NotFound {
            kind: "declaration",
            id: name.to_owned(),
        })?;
        if let Some(pending) = step
            .dependencies
            .iter()
            .find(|d| self.ledger.state(d) != Some(DeclarationState::Provisioned))
        {
            return Err(SiteStackError::invalid_input(format!(
                "cannot start \"{name}\": dependency \"{pending}\" is not provisioned"
            )));
        }
        self.ledger
            .transition(name, DeclarationState::Provisioning, None)
    }

    /// Records that `name` exists and binds every output declared on it.
    ///
    /// `attributes` are the values the provider returned for the resource.
    /// Returns the ids bound by this report.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] if an attribute an output
    /// needs is missing, plus any error of [`Ledger::transition`]. Nothing
    /// is recorded on error.
    pub fn report_provisioned(
        &mut self,
        name: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<Vec<Identifier>> {
        let current = self.ledger.get(name)?.state;
        if !current.can_transition_to(DeclarationState::Provisioned) {
            return Err(SiteStackError::InvalidTransition {
                name: name.to_owned(),
                from: current.to_string(),
                to: DeclarationState::Provisioned.to_string(),
            });
        }

        let mut pending = Vec::new();
        for output in self.outputs.iter().filter(|o| o.resource == name) {
            let value = attributes.get(&output.attribute).ok_or_else(|| {
                SiteStackError::invalid_input(format!(
                    "\"{name}\" reported no attribute \"{}\" required by output \"{}\"",
                    output.attribute, output.id
                ))
            })?;
            pending.push((output.id.clone(), value.clone()));
        }

        self.ledger
            .transition(name, DeclarationState::Provisioned, None)?;

        let mut bound = Vec::with_capacity(pending.len());
        for (id, value) in pending {
            let _ = self.binder.bind(id.clone(), || value)?;
            bound.push(id);
        }
        Ok(bound)
    }

    /// Records that the provider rejected `name`.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Ledger::transition`].
    pub fn report_failed(&mut self, name: &str, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        tracing::warn!(name, %reason, "provisioning failed");
        self.ledger
            .transition(name, DeclarationState::Failed, Some(reason))
    }

    /// Returns the bound value of an output.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::UnboundOutput`] if it is not bound yet.
    pub fn resolve(&self, output_id: &Identifier) -> Result<&str> {
        self.binder.resolve(output_id)
    }

    /// Returns the `id -> value` map of bound outputs.
    #[must_use]
    pub fn exports(&self) -> BTreeMap<String, String> {
        self.binder.exports()
    }

    /// Returns whether every step is provisioned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.plan
            .steps()
            .iter()
            .all(|s| self.ledger.state(s.name()) == Some(DeclarationState::Provisioned))
    }
}
