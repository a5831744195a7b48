//! Site configuration model.
//!
//! The configuration is the only environment-specific input of the
//! composer. It is read from YAML or JSON and validated before any
//! declaration is built.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, SiteStackError};

/// Root configuration for one static site deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteConfig {
    /// Namespace for every identifier derived in this deployment.
    pub resource_prefix: String,
    /// Hosted zone the records and certificate validation live in.
    pub hosted_zone_name: String,
    /// Primary domain served by the distribution.
    pub domain_name: String,
    /// Whether to add a `www.` alias next to the primary domain.
    #[serde(rename = "includeWWW", default = "default_include_www")]
    pub include_www: bool,
    /// Local directory holding the built site content.
    #[serde(default = "default_site_source")]
    pub site_source_path: PathBuf,
    /// Roles of the exported outputs.
    #[serde(default)]
    pub output_ids: OutputIds,
    /// Target account and region, passed through to the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

/// Roles used to derive the exported output identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputIds {
    /// Role of the bucket-name output.
    pub bucket_name: String,
    /// Role of the distribution-id output.
    pub distribution_id: String,
}

impl Default for OutputIds {
    fn default() -> Self {
        Self {
            bucket_name: constants::DEFAULT_BUCKET_NAME_OUTPUT.into(),
            distribution_id: constants::DEFAULT_DISTRIBUTION_ID_OUTPUT.into(),
        }
    }
}

/// Provider account and region a deployment targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    /// Provider account identifier.
    pub account: String,
    /// Provider region.
    pub region: String,
}

const fn default_include_www() -> bool {
    true
}

fn default_site_source() -> PathBuf {
    PathBuf::from(constants::DEFAULT_SITE_SOURCE)
}

impl SiteConfig {
    /// Creates a configuration with defaults for every optional field.
    #[must_use]
    pub fn new(
        resource_prefix: impl Into<String>,
        hosted_zone_name: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_prefix: resource_prefix.into(),
            hosted_zone_name: hosted_zone_name.into(),
            domain_name: domain_name.into(),
            include_www: default_include_www(),
            site_source_path: default_site_source(),
            output_ids: OutputIds::default(),
            environment: None,
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading site configuration");
        let content = std::fs::read_to_string(path).map_err(|e| SiteStackError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from YAML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parses a configuration from JSON text without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration document.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Checks the configuration for semantic correctness.
    ///
    /// # Checks performed
    ///
    /// 1. Prefix, zone, domain, and output roles are non-empty.
    /// 2. The two output roles differ, so every export id is unique.
    /// 3. The domain equals the hosted zone or is one of its subdomains.
    /// 4. The environment, when present, names both account and region.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] describing the first failed check.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("resourcePrefix", &self.resource_prefix),
            ("hostedZoneName", &self.hosted_zone_name),
            ("domainName", &self.domain_name),
            ("outputIds.bucketName", &self.output_ids.bucket_name),
            ("outputIds.distributionId", &self.output_ids.distribution_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SiteStackError::invalid_input(format!(
                    "configuration field {field} must not be empty"
                )));
            }
        }

        if self.output_ids.bucket_name == self.output_ids.distribution_id {
            return Err(SiteStackError::invalid_input(format!(
                "outputIds.bucketName and outputIds.distributionId must differ, both are \"{}\"",
                self.output_ids.bucket_name
            )));
        }

        if !self.domain_in_zone() {
            return Err(SiteStackError::invalid_input(format!(
                "domain \"{}\" is not inside hosted zone \"{}\"",
                self.domain_name, self.hosted_zone_name
            )));
        }

        if let Some(env) = &self.environment {
            if env.account.trim().is_empty() || env.region.trim().is_empty() {
                return Err(SiteStackError::invalid_input(
                    "environment requires both account and region",
                ));
            }
        }
        Ok(())
    }

    /// Returns the secondary alias (`www.<domain>`) when enabled.
    #[must_use]
    pub fn www_domain(&self) -> Option<String> {
        self.include_www
            .then(|| format!("{}.{}", constants::WWW_LABEL, self.domain_name))
    }

    fn domain_in_zone(&self) -> bool {
        let domain = self.domain_name.trim_end_matches('.').to_ascii_lowercase();
        let zone = self
            .hosted_zone_name
            .trim_end_matches('.')
            .to_ascii_lowercase();
        domain == zone || domain.ends_with(&format!(".{zone}"))
    }
}
