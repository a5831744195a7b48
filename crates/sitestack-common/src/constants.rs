//! System-wide constants and defaults.

/// Application name used in CLI output and manifests.
pub const APP_NAME: &str = "sitestack";

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "sitestack.yaml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV_VAR: &str = "SITESTACK_CONFIG";

/// Default location of the built site content.
pub const DEFAULT_SITE_SOURCE: &str = "./site";

/// Default role of the bucket-name output.
pub const DEFAULT_BUCKET_NAME_OUTPUT: &str = "bucket-name";

/// Default role of the distribution-id output.
pub const DEFAULT_DISTRIBUTION_ID_OUTPUT: &str = "distribution-id";

/// Number of hex characters of the SHA-256 digest appended to identifiers.
pub const IDENTIFIER_DIGEST_LENGTH: usize = 8;

/// Document served for the bucket root.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Document served for missing keys.
pub const ERROR_DOCUMENT: &str = "error.html";

/// Subdomain label of the secondary alias.
pub const WWW_LABEL: &str = "www";

/// Manifest format version written by `sitestack synth`.
pub const MANIFEST_VERSION: u32 = 1;
