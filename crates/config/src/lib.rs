//! Options for the selector renaming engine.
//!
//! Every transform runs against a complete, immutable [`Options`] value built
//! by layering a [`PartialOptions`] (whatever the host supplied) over the
//! hard-coded defaults. Hosts that read their settings from disk can use
//! [`PartialOptions::load`], which layers a TOML/YAML/JSON file and then
//! `CSSNAMES_*` environment variables.
//!
//! | Option      | Default            | Meaning                                            |
//! |-------------|--------------------|----------------------------------------------------|
//! | `base`      | `.`                | Root directory that logical keys are relative to   |
//! | `debug`     | `false`            | Emit readable `name-uid` identifiers               |
//! | `salt`      | `""`               | Mixed into every identifier hash                   |
//! | `uidLength` | `5`                | Identifier length (digest-limited to 22)           |
//! | `target`    | `class-names.json` | Persisted mapping document                         |
//! | `debounce`  | `500`              | Milliseconds to coalesce writes to one target      |
//! | `layout`    | `shared`           | `shared` document, or `per-file` documents         |

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment variable overrides, e.g. `CSSNAMES_UID_LENGTH=8`.
pub const ENV_PREFIX: &str = "CSSNAMES_";

/// How name mappings are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// All files share one document at `target`, keyed by logical key.
    #[default]
    Shared,
    /// Each file gets its own document beneath a directory named after
    /// `target` (minus its extension).
    PerFile,
}

/// Complete options for one transform invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub base: PathBuf,
    pub debug: bool,
    pub salt: String,
    #[serde(alias = "uid_length")]
    pub uid_length: usize,
    pub target: PathBuf,
    /// Milliseconds.
    pub debounce: u64,
    pub layout: Layout,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            base: PathBuf::from("."),
            debug: false,
            salt: String::new(),
            uid_length: 5,
            target: PathBuf::from("class-names.json"),
            debounce: 500,
            layout: Layout::Shared,
        }
    }
}
impl Options {
    /// Layers `overrides` over the defaults.
    ///
    /// ```
    /// use cssnames_config::{Options, PartialOptions};
    ///
    /// let options = Options::merged(&PartialOptions {
    ///     uid_length: Some(8),
    ///     ..Default::default()
    /// }).unwrap();
    /// assert_eq!(options.uid_length, 8);
    /// assert_eq!(options.debounce, 500);
    /// ```
    pub fn merged(overrides: &PartialOptions) -> Result<Self> {
        let options: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Serialized::defaults(overrides))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        options.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.uid_length == 0 {
            exn::bail!(ErrorKind::InvalidOption("uidLength"));
        }
        Ok(self)
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }

    /// The document that the mapping for `key` is persisted to.
    ///
    /// With the per-file layout, each `..` segment of a key (a stylesheet
    /// outside `base`) is written as `__`, so every document stays inside the
    /// mapping directory.
    ///
    /// ```
    /// use cssnames_config::{Layout, Options};
    /// use std::path::Path;
    ///
    /// let shared = Options::default();
    /// assert_eq!(shared.mapping_target("c/c"), Path::new("class-names.json"));
    ///
    /// let per_file = Options { layout: Layout::PerFile, ..Options::default() };
    /// assert_eq!(per_file.mapping_target("c/c"), Path::new("class-names/c/c.json"));
    /// assert_eq!(per_file.mapping_target("../x/a"), Path::new("class-names/__/x/a.json"));
    /// ```
    pub fn mapping_target(&self, key: &str) -> PathBuf {
        match self.layout {
            Layout::Shared => self.target.clone(),
            Layout::PerFile => {
                let segments: Vec<&str> = key
                    .split('/')
                    .map(|segment| match segment {
                        ".." => "__",
                        segment => segment,
                    })
                    .collect();
                self.target.with_extension("").join(format!("{}.json", segments.join("/")))
            },
        }
    }
}

/// Host-supplied option overrides; `None` falls back to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "uid_length")]
    pub uid_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}
impl PartialOptions {
    /// Loads overrides from an optional configuration file, then from
    /// `CSSNAMES_*` environment variables (which take precedence).
    ///
    /// The file format is chosen by extension: `toml`, `yaml`/`yml` or `json`.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = file {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Loading configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        // `CSSNAMES_UID_LENGTH` arrives as `uid_length`, which the field alias accepts.
        figment.merge(Env::prefixed(ENV_PREFIX)).extract().or_raise(|| ErrorKind::Load)
    }
}
