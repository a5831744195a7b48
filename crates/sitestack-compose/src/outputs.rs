//! Write-once output bindings.
//!
//! Outputs are named values a deployment exports once its resources
//! exist, such as the bucket name or the distribution id. Other
//! deployments import them by id, so an id is bound at most once.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sitestack_common::error::{Result, SiteStackError};
use sitestack_common::types::Identifier;

/// Declares which resource attribute an output exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputDeclaration {
    /// Stable output identifier.
    pub id: Identifier,
    /// Declaration producing the value.
    pub resource: String,
    /// Attribute of the realized resource holding the value.
    pub attribute: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl OutputDeclaration {
    /// Declares that `id` exports `attribute` of `resource`.
    #[must_use]
    pub fn new(id: Identifier, resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            id,
            resource: resource.into(),
            attribute: attribute.into(),
            description: String::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A realized output value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputBinding {
    /// Output identifier.
    pub output_id: Identifier,
    /// Value produced by the apply step.
    pub value: String,
    /// When the binding was recorded.
    pub bound_at: DateTime<Utc>,
}

/// Holds the output bindings of one deployment.
#[derive(Debug, Default, Clone)]
pub struct OutputBinder {
    bindings: BTreeMap<Identifier, OutputBinding>,
}

impl OutputBinder {
    /// Creates an empty binder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `output_id` to the value produced by `resolver`.
    ///
    /// The resolver only runs when the id is still unbound.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::DuplicateBinding`] if `output_id` is already bound.
    pub fn bind<F>(&mut self, output_id: Identifier, resolver: F) -> Result<&OutputBinding>
    where
        F: FnOnce() -> String,
    {
        match self.bindings.entry(output_id) {
            Entry::Occupied(entry) => Err(SiteStackError::DuplicateBinding {
                output_id: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                let binding = OutputBinding {
                    output_id: entry.key().clone(),
                    value: resolver(),
                    bound_at: Utc::now(),
                };
                tracing::info!(output_id = %binding.output_id, "output bound");
                Ok(entry.insert(binding))
            }
        }
    }

    /// Returns the bound value of `output_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::UnboundOutput`] if nothing is bound yet.
    pub fn resolve(&self, output_id: &Identifier) -> Result<&str> {
        self.bindings
            .get(output_id)
            .map(|b| b.value.as_str())
            .ok_or_else(|| SiteStackError::UnboundOutput {
                output_id: output_id.to_string(),
            })
    }

    /// Returns the full binding of `output_id`, if bound.
    #[must_use]
    pub fn get(&self, output_id: &Identifier) -> Option<&OutputBinding> {
        self.bindings.get(output_id)
    }

    /// Returns whether `output_id` is bound.
    #[must_use]
    pub fn is_bound(&self, output_id: &Identifier) -> bool {
        self.bindings.contains_key(output_id)
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates bindings ordered by id.
    pub fn bindings(&self) -> impl Iterator<Item = &OutputBinding> {
        self.bindings.values()
    }

    /// Returns the `id -> value` export map.
    #[must_use]
    pub fn exports(&self) -> BTreeMap<String, String> {
        self.bindings
            .iter()
            .map(|(id, b)| (id.to_string(), b.value.clone()))
            .collect()
    }
}
