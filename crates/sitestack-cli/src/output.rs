//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use sitestack_compose::outputs::OutputDeclaration;
use sitestack_compose::plan::Plan;

const RULE: &str = "\u{2550}";

/// Renders the plan as an indented, human-readable listing.
#[must_use]
pub fn render_plan(title: &str, plan: &Plan, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", RULE.repeat(title.chars().count().max(35)));
    let _ = writeln!(out);

    for step in plan.steps() {
        let decl = &step.declaration;
        let _ = writeln!(out, "  {:>2}. + {} ({})", step.position + 1, decl.name(), decl.kind());
        if !step.dependencies.is_empty() {
            let _ = writeln!(out, "        after: {}", step.dependencies.join(", "));
        }
        if verbose {
            for (key, value) in decl.config() {
                let _ = writeln!(out, "        {key}: {value}");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {} resource(s) will be applied.", plan.len());
    out
}

/// Renders output declarations as aligned `id <- resource.attribute` lines.
#[must_use]
pub fn render_outputs(outputs: &[OutputDeclaration]) -> String {
    let width = outputs
        .iter()
        .map(|o| o.id.as_str().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for output in outputs {
        let _ = write!(
            out,
            "{:<width$}  <- {}.{}",
            output.id.as_str(),
            output.resource,
            output.attribute
        );
        if !output.description.is_empty() {
            let _ = write!(out, "  # {}", output.description);
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use sitestack_common::types::Identifier;
    use sitestack_compose::declaration::ResourceDeclaration;
    use sitestack_compose::plan::compile_declarations;

    use super::*;

    fn sample_plan() -> Plan {
        compile_declarations(&[
            ResourceDeclaration::storage_bucket("site")
                .option("bucket_name", "blog-site")
                .build()
                .expect("bucket"),
            ResourceDeclaration::cdn_distribution("cdn")
                .reference("origin", "site")
                .build()
                .expect("cdn"),
        ])
        .expect("compile")
    }

    #[test]
    fn render_plan_lists_steps_in_order() {
        let text = render_plan("Plan", &sample_plan(), false);
        let site = text.find("+ site (storage-bucket)").expect("site line");
        let cdn = text.find("+ cdn (cdn-distribution)").expect("cdn line");
        assert!(site < cdn, "got: {text}");
        assert!(text.contains("after: site"), "got: {text}");
        assert!(text.contains("2 resource(s) will be applied."), "got: {text}");
        assert!(!text.contains("bucket_name"), "got: {text}");
    }

    #[test]
    fn render_plan_verbose_shows_config() {
        let text = render_plan("Plan", &sample_plan(), true);
        assert!(text.contains("bucket_name: \"blog-site\""), "got: {text}");
        assert!(text.contains("origin: ref(site)"), "got: {text}");
    }

    #[test]
    fn render_outputs_aligns_ids() {
        let outputs = vec![
            OutputDeclaration::new(Identifier::new("a"), "site", "bucket_name"),
            OutputDeclaration::new(Identifier::new("abc"), "cdn", "distribution_id")
                .with_description("cdn id"),
        ];
        let text = render_outputs(&outputs);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "a    <- site.bucket_name");
        assert_eq!(lines[1], "abc  <- cdn.distribution_id  # cdn id");
    }
}
