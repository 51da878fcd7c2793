use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use colored::Colorize;
use glob::{Pattern, glob};
use walkdir::WalkDir;

use super::{SourceUnit, scan_source};
use crate::config::{Config, TEST_FILE_PATTERNS};
use crate::core::cache::checksum;

/// Supplies source units to the pipeline.
pub trait SourceLoader {
    /// Load every source unit under `root`.
    ///
    /// A unit that cannot be read aborts the whole load.
    fn load(&self, root: &Path) -> Result<Vec<SourceUnit>>;
}

/// Loads Go sources from disk, honoring the configured include/ignore patterns.
#[derive(Debug, Clone)]
pub struct FsSourceLoader {
    pub includes: Vec<String>,
    pub ignores: Vec<String>,
    pub ignore_test_files: bool,
    pub verbose: bool,
}

impl FsSourceLoader {
    pub fn from_config(config: &Config, verbose: bool) -> Self {
        Self {
            includes: config.includes.clone(),
            ignores: config.ignores.clone(),
            ignore_test_files: config.ignore_test_files,
            verbose,
        }
    }
}

impl SourceLoader for FsSourceLoader {
    fn load(&self, root: &Path) -> Result<Vec<SourceUnit>> {
        let files = scan_files(
            root,
            &self.includes,
            &self.ignores,
            self.ignore_test_files,
            self.verbose,
        );

        let mut units = Vec::with_capacity(files.len());
        for path in files {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))?;
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let mut unit = scan_source(&relative, &content);
            unit.checksum = checksum(&content);
            units.push(unit);
        }
        Ok(units)
    }
}

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Collect scannable files, sorted for deterministic extraction order.
pub fn scan_files(
    base_dir: &Path,
    includes: &[String],
    ignore_patterns: &[String],
    ignore_test_files: bool,
    verbose: bool,
) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();

    let mut literal_ignore_paths: Vec<PathBuf> = Vec::new();
    let mut glob_patterns: Vec<Pattern> = Vec::new();

    for p in ignore_patterns {
        if is_glob_pattern(p) {
            match Pattern::new(p) {
                Ok(pattern) => glob_patterns.push(pattern),
                Err(e) => {
                    if verbose {
                        eprintln!(
                            "{} Invalid ignore pattern '{}': {}",
                            "warning:".bold().yellow(),
                            p,
                            e
                        );
                    }
                }
            }
        } else {
            literal_ignore_paths.push(base_dir.join(p));
        }
    }

    if ignore_test_files {
        for p in TEST_FILE_PATTERNS {
            if let Ok(pattern) = Pattern::new(p) {
                glob_patterns.push(pattern);
            }
        }
    }

    let dirs_to_scan: Vec<PathBuf> = if includes.is_empty() {
        vec![base_dir.to_path_buf()]
    } else {
        let mut paths = Vec::new();
        for inc in includes {
            if is_glob_pattern(inc) {
                let full_pattern = base_dir.join(inc);
                match glob(&full_pattern.to_string_lossy()) {
                    Ok(entries) => paths.extend(entries.flatten().filter(|entry| entry.is_dir())),
                    Err(e) => {
                        if verbose {
                            eprintln!(
                                "{} Invalid glob pattern '{}': {}",
                                "warning:".bold().yellow(),
                                inc,
                                e
                            );
                        }
                    }
                }
            } else {
                let path = base_dir.join(inc);
                if path.exists() {
                    paths.push(path);
                } else if verbose {
                    eprintln!(
                        "{} Include path does not exist: {}",
                        "warning:".bold().yellow(),
                        path.display()
                    );
                }
            }
        }
        paths
    };

    for dir in dirs_to_scan {
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    if verbose {
                        eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), e);
                    }
                    continue;
                }
            };
            let path = entry.path();
            let relative = path.strip_prefix(base_dir).unwrap_or(path);

            if literal_ignore_paths
                .iter()
                .any(|ignore_path| path.starts_with(ignore_path))
            {
                continue;
            }
            if glob_patterns.iter().any(|p| p.matches_path(relative)) {
                continue;
            }

            if path.is_file() && is_scannable_file(path) {
                files.insert(path.to_path_buf());
            }
        }
    }

    files
}

fn is_scannable_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("go"))
}
