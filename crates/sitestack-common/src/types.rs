//! Domain primitive types used across the sitestack workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier derived from a `(prefix, role)` pair.
///
/// Identifiers name physical resources and output bindings; they stay the
/// same across runs so that re-applying a plan updates in place.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps an already derived identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tag of a resource declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Object storage bucket holding the site content.
    StorageBucket,
    /// CDN distribution fronting the bucket.
    CdnDistribution,
    /// DNS alias record in a hosted zone.
    DnsRecord,
    /// DNS-validated TLS certificate.
    Certificate,
    /// Origin access identity allowed to read the bucket.
    Identity,
    /// Upload of local site content into a bucket.
    BucketDeployment,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::StorageBucket,
        Self::CdnDistribution,
        Self::DnsRecord,
        Self::Certificate,
        Self::Identity,
        Self::BucketDeployment,
    ];

    /// Returns the kebab-case tag of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StorageBucket => "storage-bucket",
            Self::CdnDistribution => "cdn-distribution",
            Self::DnsRecord => "dns-record",
            Self::Certificate => "certificate",
            Self::Identity => "identity",
            Self::BucketDeployment => "bucket-deployment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a declaration.
///
/// The composer drives `Declared` and `Planned`; the remaining states are
/// reported back by the external apply step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationState {
    /// Declaration has been accepted by the composer.
    Declared,
    /// Declaration has a position in a compiled plan.
    Planned,
    /// The apply step started realizing the resource.
    Provisioning,
    /// The resource exists at the provider.
    Provisioned,
    /// The provider rejected the resource.
    Failed,
}

impl DeclarationState {
    /// Returns whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Declared, Self::Planned)
                | (Self::Planned, Self::Provisioning)
                | (Self::Provisioning, Self::Provisioned | Self::Failed)
        )
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Provisioned | Self::Failed)
    }
}

impl fmt::Display for DeclarationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::Planned => write!(f, "planned"),
            Self::Provisioning => write!(f, "provisioning"),
            Self::Provisioned => write!(f, "provisioned"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
