//! # sitestack-compose
//!
//! Composer for declarative resource graphs.
//!
//! Handles:
//! - **Identifier**: Deterministic, collision-free names from a prefix and role.
//! - **Declaration**: Typed, validated resource declarations.
//! - **Graph**: Dependency graph construction from explicit and inferred edges.
//! - **Plan**: Stable topological ordering with cycle reporting.
//! - **Outputs**: Write-once output bindings for cross-deployment consumption.
//! - **Lifecycle** / **Deployment**: Recording of progress reported by the apply step.
//! - **Site**: The static-site topology built from a [`SiteConfig`](sitestack_common::config::SiteConfig).

pub mod declaration;
pub mod deployment;
pub mod graph;
pub mod identifier;
pub mod lifecycle;
pub mod outputs;
pub mod plan;
pub mod site;
