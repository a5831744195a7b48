//! Typed resource declarations.
//!
//! A declaration is an immutable value: kind, name, validated options,
//! and explicit dependencies. Cross-resource links are plain names held
//! in [`ConfigValue::Reference`], never handles to live objects.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sitestack_common::error::{Result, SiteStackError};
use sitestack_common::types::ResourceKind;

/// A single option value inside a declaration's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum ConfigValue {
    /// Free-form text.
    Text(String),
    /// Boolean switch.
    Flag(bool),
    /// Integer quantity.
    Number(i64),
    /// Ordered list of values.
    List(Vec<ConfigValue>),
    /// Name of another declaration in the same graph.
    Reference(String),
}

impl ConfigValue {
    /// Creates a reference to the declaration called `name`.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// Creates a list of text values.
    #[must_use]
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }

    /// Returns the type tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Text(_) => ValueType::Text,
            Self::Flag(_) => ValueType::Flag,
            Self::Number(_) => ValueType::Number,
            Self::List(_) => ValueType::List,
            Self::Reference(_) => ValueType::Reference,
        }
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Collects every reference in this value, descending into lists.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Reference(name) => out.push(name),
            Self::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Self::Text(_) | Self::Flag(_) | Self::Number(_) => {}
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Reference(name) => write!(f, "ref({name})"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Type tag of a [`ConfigValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// [`ConfigValue::Text`].
    Text,
    /// [`ConfigValue::Flag`].
    Flag,
    /// [`ConfigValue::Number`].
    Number,
    /// [`ConfigValue::List`].
    List,
    /// [`ConfigValue::Reference`].
    Reference,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Flag => write!(f, "flag"),
            Self::Number => write!(f, "number"),
            Self::List => write!(f, "list"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// An option a resource kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Option key.
    pub name: &'static str,
    /// Expected value type.
    pub value_type: ValueType,
    /// Whether the option must be present.
    pub required: bool,
}

const fn required(name: &'static str, value_type: ValueType) -> OptionSpec {
    OptionSpec {
        name,
        value_type,
        required: true,
    }
}

const fn optional(name: &'static str, value_type: ValueType) -> OptionSpec {
    OptionSpec {
        name,
        value_type,
        required: false,
    }
}

const STORAGE_BUCKET_OPTIONS: &[OptionSpec] = &[
    required("bucket_name", ValueType::Text),
    optional("index_document", ValueType::Text),
    optional("error_document", ValueType::Text),
    optional("block_public_access", ValueType::Flag),
    optional("versioned", ValueType::Flag),
    optional("removal_policy", ValueType::Text),
];

const CDN_DISTRIBUTION_OPTIONS: &[OptionSpec] = &[
    required("origin", ValueType::Reference),
    optional("origin_identity", ValueType::Reference),
    optional("certificate", ValueType::Reference),
    optional("aliases", ValueType::List),
    optional("default_root_object", ValueType::Text),
    optional("viewer_protocol_policy", ValueType::Text),
    optional("price_class", ValueType::Text),
];

const DNS_RECORD_OPTIONS: &[OptionSpec] = &[
    required("zone", ValueType::Text),
    required("record_name", ValueType::Text),
    required("target", ValueType::Reference),
    optional("record_type", ValueType::Text),
    optional("ttl", ValueType::Number),
];

const CERTIFICATE_OPTIONS: &[OptionSpec] = &[
    required("domain_name", ValueType::Text),
    required("zone", ValueType::Text),
    optional("subject_alternative_names", ValueType::List),
    optional("validation", ValueType::Text),
];

const IDENTITY_OPTIONS: &[OptionSpec] = &[
    required("comment", ValueType::Text),
    optional("grant_read", ValueType::Reference),
];

const BUCKET_DEPLOYMENT_OPTIONS: &[OptionSpec] = &[
    required("source", ValueType::Text),
    required("destination", ValueType::Reference),
    optional("invalidate", ValueType::Reference),
    optional("invalidation_paths", ValueType::List),
    optional("prune", ValueType::Flag),
];

/// Returns the option table for `kind`.
#[must_use]
pub const fn option_specs(kind: ResourceKind) -> &'static [OptionSpec] {
    match kind {
        ResourceKind::StorageBucket => STORAGE_BUCKET_OPTIONS,
        ResourceKind::CdnDistribution => CDN_DISTRIBUTION_OPTIONS,
        ResourceKind::DnsRecord => DNS_RECORD_OPTIONS,
        ResourceKind::Certificate => CERTIFICATE_OPTIONS,
        ResourceKind::Identity => IDENTITY_OPTIONS,
        ResourceKind::BucketDeployment => BUCKET_DEPLOYMENT_OPTIONS,
    }
}

/// An immutable description of a desired resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDeclaration {
    kind: ResourceKind,
    name: String,
    config: BTreeMap<String, ConfigValue>,
    depends_on: BTreeSet<String>,
}

impl ResourceDeclaration {
    /// Starts a declaration of the given kind.
    #[must_use]
    pub fn builder(kind: ResourceKind, name: impl Into<String>) -> DeclarationBuilder {
        DeclarationBuilder::new(kind, name)
    }

    /// Starts a `storage-bucket` declaration.
    #[must_use]
    pub fn storage_bucket(name: impl Into<String>) -> DeclarationBuilder {
        Self::builder(ResourceKind::StorageBucket, name)
    }

    /// Starts a `cdn-distribution` declaration.
    #[must_use]
    pub fn cdn_distribution(name: impl Into<String>) -> DeclarationBuilder {
        Self::builder(ResourceKind::CdnDistribution, name)
    }

    /// Starts a `dns-record` declaration.
    #[must_use]
    pub fn dns_record(name: impl Into<String>) -> DeclarationBuilder {
        Self::builder(ResourceKind::DnsRecord, name)
    }

    /// Starts a `certificate` declaration.
    #[must_use]
    pub fn certificate(name: impl Into<String>) -> DeclarationBuilder {
        Self::builder(ResourceKind::Certificate, name)
    }

    /// Starts an `identity` declaration.
    #[must_use]
    pub fn identity(name: impl Into<String>) -> DeclarationBuilder {
        Self::builder(ResourceKind::Identity, name)
    }

    /// Starts a `bucket-deployment` declaration.
    #[must_use]
    pub fn bucket_deployment(name: impl Into<String>) -> DeclarationBuilder {
        Self::builder(ResourceKind::BucketDeployment, name)
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the declaration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the validated options.
    #[must_use]
    pub const fn config(&self) -> &BTreeMap<String, ConfigValue> {
        &self.config
    }

    /// Returns the value of one option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&ConfigValue> {
        self.config.get(key)
    }

    /// Returns the explicit dependencies.
    #[must_use]
    pub const fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    /// Returns `(option, target)` for every reference held in the config,
    /// ordered by option key.
    #[must_use]
    pub fn references(&self) -> Vec<(&str, &str)> {
        let mut refs = Vec::new();
        for (key, value) in &self.config {
            let mut targets = Vec::new();
            value.collect_references(&mut targets);
            refs.extend(targets.into_iter().map(|t| (key.as_str(), t)));
        }
        refs
    }
}

/// Builder for a [`ResourceDeclaration`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct DeclarationBuilder {
    kind: ResourceKind,
    name: String,
    config: BTreeMap<String, ConfigValue>,
    depends_on: BTreeSet<String>,
}

impl DeclarationBuilder {
    /// Creates a builder for a declaration of `kind` called `name`.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            config: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// Sets an option, replacing any earlier value for the same key.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        let _ = self.config.insert(key.into(), value.into());
        self
    }

    /// Sets an option to a reference to another declaration.
    #[must_use]
    pub fn reference(self, key: impl Into<String>, target: impl Into<String>) -> Self {
        self.option(key, ConfigValue::reference(target))
    }

    /// Adds an explicit dependency on another declaration.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        let _ = self.depends_on.insert(name.into());
        self
    }

    /// Validates the options and returns the finished declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SiteStackError::InvalidInput`] for a malformed name or
    /// dependency, and [`SiteStackError::InvalidConfiguration`] naming the
    /// first option that is missing, unknown, or of the wrong type.
    pub fn build(self) -> Result<ResourceDeclaration> {
        check_name(&self.name)?;
        for dep in &self.depends_on {
            if dep.is_empty() {
                return Err(SiteStackError::invalid_input(format!(
                    "declaration \"{}\" has an empty dependency name",
                    self.name
                )));
            }
        }

        let specs = option_specs(self.kind);
        for (key, value) in &self.config {
            let Some(spec) = specs.iter().find(|s| s.name == key.as_str()) else {
                return Err(self.config_err(key, format!("is not recognized for {}", self.kind)));
            };
            if value.value_type() != spec.value_type {
                return Err(self.config_err(
                    key,
                    format!("expects {}, got {}", spec.value_type, value.value_type()),
                ));
            }
            let mut targets = Vec::new();
            value.collect_references(&mut targets);
            if targets.iter().any(|t| t.is_empty()) {
                return Err(self.config_err(key, "references an empty name".into()));
            }
        }
        for spec in specs.iter().filter(|s| s.required) {
            if !self.config.contains_key(spec.name) {
                return Err(self.config_err(spec.name, "is required".into()));
            }
        }

        tracing::debug!(name = %self.name, kind = %self.kind, "declaration built");
        Ok(ResourceDeclaration {
            kind: self.kind,
            name: self.name,
            config: self.config,
            depends_on: self.depends_on,
        })
    }

    fn config_err(&self, option: &str, reason: String) -> SiteStackError {
        SiteStackError::InvalidConfiguration {
            declaration: self.name.clone(),
            option: option.to_owned(),
            reason,
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SiteStackError::invalid_input("declaration name must not be empty"));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(SiteStackError::invalid_input(format!(
            "declaration name \"{name}\" may only contain lowercase letters, digits and '-'"
        )));
    }
    Ok(())
}
