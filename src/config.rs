use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::directive::ExtensionKind;

pub const CONFIG_FILE_NAME: &str = ".apiscriberc.json";

pub const TEST_FILE_PATTERNS: &[&str] = &["*_test.go", "**/*_test.go", "**/testdata/**"];

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_ignores")]
    pub ignores: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    #[serde(default = "default_output_dir", alias = "outputDirectory")]
    pub output_dir: String,
    /// Documents to produce; empty means every document named by an operation.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default = "default_document_name")]
    pub default_document: String,
    #[serde(default = "default_true")]
    pub clean_unused: bool,
    #[serde(default)]
    pub required_by_default: bool,
    #[serde(default = "default_list_separator")]
    pub list_separator: String,
    #[serde(default = "default_true")]
    pub cache: bool,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    /// Vendor extension name -> value kind.
    #[serde(default)]
    pub extensions: BTreeMap<String, ExtensionKind>,
}

fn default_ignores() -> Vec<String> {
    ["vendor", "node_modules", ".git"].map(String::from).to_vec()
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_ignore_test_files() -> bool {
    true
}

fn default_output_dir() -> String {
    "./docs".to_string()
}

fn default_document_name() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_list_separator() -> String {
    ",".to_string()
}

fn default_cache_file() -> String {
    ".apiscribe-cache.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignores: default_ignores(),
            includes: Vec::new(),
            source_root: default_source_root(),
            ignore_test_files: default_ignore_test_files(),
            output_dir: default_output_dir(),
            documents: Vec::new(),
            default_document: default_document_name(),
            clean_unused: true,
            required_by_default: false,
            list_separator: default_list_separator(),
            cache: true,
            cache_file: default_cache_file(),
            extensions: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob patterns in `ignores` or `includes` are invalid,
    /// or if a required name is empty.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        // Patterns without wildcards are literal directory paths.
        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        if self.list_separator.is_empty() {
            bail!("'listSeparator' must not be empty");
        }
        if self.default_document.trim().is_empty() {
            bail!("'defaultDocument' must not be empty");
        }
        if let Some(name) = self.documents.iter().find(|name| name.trim().is_empty()) {
            bail!("Invalid document name in 'documents': \"{}\"", name);
        }
        if let Some(name) = self
            .extensions
            .keys()
            .find(|name| !name.to_ascii_lowercase().starts_with("x-"))
        {
            bail!("Extension names must start with 'x-': \"{}\"", name);
        }

        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
