//! End-to-end tests: configuration file to plan, apply simulation, and exports.

use std::collections::BTreeMap;
use std::io::Write;

use sitestack_common::config::SiteConfig;
use sitestack_common::error::SiteStackError;
use sitestack_common::types::DeclarationState;
use sitestack_compose::declaration::ResourceDeclaration;
use sitestack_compose::identifier::identify;
use sitestack_compose::plan::compile_declarations;
use sitestack_compose::site::{self, compose_site};

fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("tempfile");
    file.write_all(body.as_bytes()).expect("write");
    file
}

#[test]
fn bucket_cdn_and_records_compile_in_order() {
    let decls = vec![
        ResourceDeclaration::dns_record("dns-www")
            .option("zone", "example.com")
            .option("record_name", "www.example.com")
            .depends_on("cdn")
            .reference("target", "cdn")
            .build()
            .expect("dns-www"),
        ResourceDeclaration::dns_record("dns-a")
            .option("zone", "example.com")
            .option("record_name", "example.com")
            .depends_on("cdn")
            .reference("target", "cdn")
            .build()
            .expect("dns-a"),
        ResourceDeclaration::cdn_distribution("cdn")
            .reference("origin", "site")
            .depends_on("site")
            .build()
            .expect("cdn"),
        ResourceDeclaration::storage_bucket("site")
            .option("bucket_name", "site")
            .build()
            .expect("bucket"),
    ];
    let plan = compile_declarations(&decls).expect("compile");
    assert_eq!(plan.names(), vec!["site", "cdn", "dns-a", "dns-www"]);
}

#[test]
fn config_file_without_www_omits_record() {
    let file = write_config(
        "resourcePrefix: blog\nhostedZoneName: example.com\ndomainName: example.com\nincludeWWW: false\n",
    );
    let config = SiteConfig::load(file.path()).expect("load");
    let plan = compose_site(&config)
        .expect("compose")
        .plan()
        .expect("plan");
    assert!(plan.step(site::DNS_WWW).is_none());
    assert!(plan.step(site::DNS_APEX).is_some());
    assert_eq!(plan.len(), 6);
}

#[test]
fn output_keys_are_stable_across_recompiles() {
    let config = SiteConfig::new("blog", "example.com", "example.com");
    let first = compose_site(&config).expect("compose");
    let second = compose_site(&config).expect("compose");
    let ids = |s: &site::SiteStack| s.outputs.iter().map(|o| o.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(
        first.plan().expect("plan").to_json().expect("json"),
        second.plan().expect("plan").to_json().expect("json")
    );
}

#[test]
fn simulated_apply_binds_exports() {
    let config = SiteConfig::new("blog", "example.com", "example.com");
    let stack = compose_site(&config).expect("compose");
    let mut deployment = stack.deployment().expect("deployment");

    let bucket_output = identify("blog", "bucket-name").expect("identify");
    let distribution_output = identify("blog", "distribution-id").expect("identify");
    assert!(matches!(
        deployment.resolve(&bucket_output),
        Err(SiteStackError::UnboundOutput { .. })
    ));

    let mut applied = Vec::new();
    loop {
        let ready: Vec<String> = deployment.ready().iter().map(|s| (*s).to_owned()).collect();
        if ready.is_empty() {
            break;
        }
        for name in ready {
            deployment.report_started(&name).expect("start");
            let mut attributes = BTreeMap::new();
            let _ = attributes.insert(
                site::BUCKET_NAME_ATTRIBUTE.to_owned(),
                "blog-site-bucket-realized".to_owned(),
            );
            let _ = attributes.insert(
                site::DISTRIBUTION_ID_ATTRIBUTE.to_owned(),
                "E2QWRUHEXAMPLE".to_owned(),
            );
            let _ = deployment
                .report_provisioned(&name, &attributes)
                .expect("provisioned");
            applied.push(name);
        }
    }

    assert!(deployment.is_complete());
    assert_eq!(applied.len(), deployment.plan().len());
    assert_eq!(
        deployment.resolve(&bucket_output).expect("bucket"),
        "blog-site-bucket-realized"
    );
    assert_eq!(
        deployment.resolve(&distribution_output).expect("distribution"),
        "E2QWRUHEXAMPLE"
    );
    assert_eq!(deployment.exports().len(), 2);
    assert_eq!(
        deployment.ledger().names_in(DeclarationState::Provisioned).len(),
        applied.len()
    );
}

#[test]
fn cycle_in_custom_declarations_is_reported() {
    let decls = vec![
        ResourceDeclaration::identity("a")
            .option("comment", "a")
            .depends_on("b")
            .build()
            .expect("a"),
        ResourceDeclaration::identity("b")
            .option("comment", "b")
            .reference("grant_read", "a")
            .build()
            .expect("b"),
    ];
    match compile_declarations(&decls).unwrap_err() {
        SiteStackError::CycleDetected { names } => assert_eq!(names, vec!["a", "b"]),
        other => panic!("unexpected error: {other}"),
    }
}
