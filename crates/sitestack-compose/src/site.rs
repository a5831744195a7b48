//! Static-site topology.
//!
//! Turns a [`SiteConfig`] into the fixed declaration set of a static
//! website: a private bucket read through an origin access identity, a
//! DNS-validated certificate, a CDN distribution, alias records, and the
//! upload of the built content.

use sitestack_common::config::SiteConfig;
use sitestack_common::constants::{ERROR_DOCUMENT, INDEX_DOCUMENT};
use sitestack_common::error::Result;

use crate::declaration::{ConfigValue, ResourceDeclaration};
use crate::deployment::Deployment;
use crate::graph::DependencyGraph;
use crate::identifier::IdentifierRegistry;
use crate::outputs::OutputDeclaration;
use crate::plan::{self, Plan};

/// Name of the content bucket declaration.
pub const BUCKET: &str = "site-bucket";
/// Name of the origin access identity declaration.
pub const IDENTITY: &str = "site-identity";
/// Name of the certificate declaration.
pub const CERTIFICATE: &str = "site-certificate";
/// Name of the distribution declaration.
pub const DISTRIBUTION: &str = "site-distribution";
/// Name of the primary alias record.
pub const DNS_APEX: &str = "dns-a";
/// Name of the `www.` alias record.
pub const DNS_WWW: &str = "dns-www";
/// Name of the content upload declaration.
pub const CONTENT: &str = "site-content";

/// Attribute of the bucket exported as the bucket-name output.
pub const BUCKET_NAME_ATTRIBUTE: &str = "bucket_name";
/// Attribute of the distribution exported as the distribution-id output.
pub const DISTRIBUTION_ID_ATTRIBUTE: &str = "distribution_id";

/// Declarations and outputs of one static site.
#[derive(Debug, Clone)]
pub struct SiteStack {
    /// Resource declarations in topology order.
    pub declarations: Vec<ResourceDeclaration>,
    /// Exported outputs.
    pub outputs: Vec<OutputDeclaration>,
    /// Identifiers issued while composing.
    pub identifiers: IdentifierRegistry,
}

impl SiteStack {
    /// Builds the dependency graph of the declarations.
    ///
    /// # Errors
    ///
    /// Returns any error of [`DependencyGraph::build`].
    pub fn graph(&self) -> Result<DependencyGraph> {
        DependencyGraph::build(&self.declarations)
    }

    /// Compiles the apply plan.
    ///
    /// # Errors
    ///
    /// Returns any error of graph building or plan compilation.
    pub fn plan(&self) -> Result<Plan> {
        plan::compile(self.graph()?)
    }

    /// Compiles the plan and starts tracking it with the site outputs.
    ///
    /// # Errors
    ///
    /// Returns any error of [`plan`](Self::plan) or [`Deployment::new`].
    pub fn deployment(&self) -> Result<Deployment> {
        Deployment::new(self.plan()?, self.outputs.clone())
    }
}

/// Composes the declarations for `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a derived
/// identifier cannot be issued.
pub fn compose_site(config: &SiteConfig) -> Result<SiteStack> {
    config.validate()?;
    tracing::info!(
        prefix = %config.resource_prefix,
        domain = %config.domain_name,
        include_www = config.include_www,
        "composing static site"
    );

    let mut identifiers = IdentifierRegistry::new();
    let prefix = config.resource_prefix.as_str();
    let bucket_name = identifiers.issue(prefix, BUCKET)?;
    let bucket_output = identifiers.issue(prefix, &config.output_ids.bucket_name)?;
    let distribution_output = identifiers.issue(prefix, &config.output_ids.distribution_id)?;

    let www = config.www_domain();
    let mut aliases = vec![config.domain_name.clone()];
    aliases.extend(www.iter().cloned());

    let mut declarations = vec![
        ResourceDeclaration::storage_bucket(BUCKET)
            .option("bucket_name", bucket_name.to_string())
            .option("index_document", INDEX_DOCUMENT)
            .option("error_document", ERROR_DOCUMENT)
            .option("block_public_access", true)
            .option("removal_policy", "destroy")
            .build()?,
        ResourceDeclaration::identity(IDENTITY)
            .option("comment", format!("read access to {} content", config.domain_name))
            .reference("grant_read", BUCKET)
            .build()?,
    ];

    let mut certificate = ResourceDeclaration::certificate(CERTIFICATE)
        .option("domain_name", config.domain_name.clone())
        .option("zone", config.hosted_zone_name.clone())
        .option("validation", "dns");
    if let Some(www) = &www {
        certificate = certificate.option(
            "subject_alternative_names",
            ConfigValue::text_list([www.clone()]),
        );
    }
    declarations.push(certificate.build()?);

    declarations.push(
        ResourceDeclaration::cdn_distribution(DISTRIBUTION)
            .reference("origin", BUCKET)
            .reference("origin_identity", IDENTITY)
            .reference("certificate", CERTIFICATE)
            .option("aliases", ConfigValue::text_list(aliases))
            .option("default_root_object", INDEX_DOCUMENT)
            .option("viewer_protocol_policy", "redirect-to-https")
            .build()?,
    );

    declarations.push(alias_record(DNS_APEX, config, &config.domain_name)?);
    if let Some(www) = &www {
        declarations.push(alias_record(DNS_WWW, config, www)?);
    }

    declarations.push(
        ResourceDeclaration::bucket_deployment(CONTENT)
            .option("source", config.site_source_path.display().to_string())
            .reference("destination", BUCKET)
            .reference("invalidate", DISTRIBUTION)
            .option("invalidation_paths", ConfigValue::text_list(["/*"]))
            .option("prune", true)
            .build()?,
    );

    let outputs = vec![
        OutputDeclaration::new(bucket_output, BUCKET, BUCKET_NAME_ATTRIBUTE)
            .with_description("Name of the bucket holding the site content"),
        OutputDeclaration::new(distribution_output, DISTRIBUTION, DISTRIBUTION_ID_ATTRIBUTE)
            .with_description("Id of the distribution serving the site"),
    ];

    Ok(SiteStack {
        declarations,
        outputs,
        identifiers,
    })
}

fn alias_record(name: &str, config: &SiteConfig, record_name: &str) -> Result<ResourceDeclaration> {
    ResourceDeclaration::dns_record(name)
        .option("zone", config.hosted_zone_name.clone())
        .option("record_name", record_name)
        .option("record_type", "A")
        .reference("target", DISTRIBUTION)
        .build()
}

#[cfg(test)]
mod tests {
    use sitestack_common::config::Environment;
    use sitestack_common::error::SiteStackError;
    use sitestack_common::types::{DeclarationState, ResourceKind};

    use super::*;
    use crate::identifier::identify;

    fn config() -> SiteConfig {
        SiteConfig::new("blog", "example.com", "example.com")
    }

    fn names(stack: &SiteStack) -> Vec<&str> {
        stack.declarations.iter().map(ResourceDeclaration::name).collect()
    }

    #[test]
    fn full_topology_with_www() {
        let stack = compose_site(&config()).expect("compose");
        assert_eq!(
            names(&stack),
            vec![BUCKET, IDENTITY, CERTIFICATE, DISTRIBUTION, DNS_APEX, DNS_WWW, CONTENT]
        );
        let kinds: Vec<_> = stack.declarations.iter().map(ResourceDeclaration::kind).collect();
        assert_eq!(kinds[0], ResourceKind::StorageBucket);
        assert_eq!(kinds[3], ResourceKind::CdnDistribution);
        assert_eq!(kinds[6], ResourceKind::BucketDeployment);
    }

    #[test]
    fn include_www_false_omits_www_record() {
        let mut cfg = config();
        cfg.include_www = false;
        let stack = compose_site(&cfg).expect("compose");
        assert!(!names(&stack).contains(&DNS_WWW));
        let cert = &stack.declarations[2];
        assert!(cert.option("subject_alternative_names").is_none());
        let plan = stack.plan().expect("plan");
        assert!(plan.step(DNS_WWW).is_none());
    }

    #[test]
    fn plan_orders_site_resources() {
        let plan = compose_site(&config())
            .expect("compose")
            .plan()
            .expect("plan");
        assert_eq!(
            plan.names(),
            vec![
                "site-bucket",
                "site-certificate",
                "site-identity",
                "site-distribution",
                "dns-a",
                "dns-www",
                "site-content",
            ]
        );
        assert_eq!(
            plan.step(DISTRIBUTION).expect("cdn").dependencies,
            vec![BUCKET, CERTIFICATE, IDENTITY]
        );
    }

    #[test]
    fn bucket_name_and_outputs_use_stable_identifiers() {
        let stack = compose_site(&config()).expect("compose");
        let bucket = &stack.declarations[0];
        let expected = identify("blog", BUCKET).expect("identify");
        assert_eq!(
            bucket.option("bucket_name").and_then(ConfigValue::as_text),
            Some(expected.as_str())
        );
        assert_eq!(stack.outputs[0].id, identify("blog", "bucket-name").expect("identify"));
        assert_eq!(
            stack.outputs[1].id,
            identify("blog", "distribution-id").expect("identify")
        );
        assert_eq!(stack.identifiers.len(), 3);

        let again = compose_site(&config()).expect("compose");
        assert_eq!(again.outputs, stack.outputs);
    }

    #[test]
    fn aliases_cover_both_domains() {
        let stack = compose_site(&config()).expect("compose");
        let cdn = &stack.declarations[3];
        assert_eq!(
            cdn.option("aliases"),
            Some(&ConfigValue::text_list(["example.com", "www.example.com"]))
        );
    }

    #[test]
    fn environment_does_not_change_plan() {
        let mut cfg = config();
        cfg.environment = Some(Environment {
            account: "123456789012".into(),
            region: "us-east-1".into(),
        });
        let with_env = compose_site(&cfg).expect("compose").plan().expect("plan");
        let without = compose_site(&config()).expect("compose").plan().expect("plan");
        assert_eq!(
            with_env.to_json().expect("json"),
            without.to_json().expect("json")
        );
    }

    #[test]
    fn shared_output_role_is_rejected_before_composing() {
        let mut cfg = config();
        cfg.output_ids.distribution_id = cfg.output_ids.bucket_name.clone();
        let err = compose_site(&cfg).unwrap_err();
        assert!(matches!(err, SiteStackError::InvalidInput { .. }), "got: {err}");
    }

    #[test]
    fn deployment_starts_every_declaration_planned() {
        let stack = compose_site(&config()).expect("compose");
        let deployment = stack.deployment().expect("deployment");
        assert_eq!(
            deployment.ledger().names_in(DeclarationState::Planned).len(),
            stack.declarations.len()
        );
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let cfg = SiteConfig::new("My Blog", "example.com", "example.com");
        let err = compose_site(&cfg).unwrap_err();
        assert!(matches!(err, SiteStackError::InvalidInput { .. }), "got: {err}");
    }
}
