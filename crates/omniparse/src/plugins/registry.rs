//! Parser registration and lookup.
//!
//! A process-wide table maps parser names and file extensions to
//! [`FormatParser`] implementations. Extension collisions are resolved by
//! priority; duplicate names overwrite with a warning; unregistration removes
//! dangling extension bindings and rebinds collisions to the next-best
//! candidate.

use crate::core::format::normalize_extension;
use crate::plugins::FormatParser;
use crate::{OmniparseError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Metadata snapshot of one registered parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserInfo {
    pub name: String,
    pub extensions: Vec<String>,
    pub description: String,
    pub version: String,
    pub priority: i32,
}

/// Central registry for document parsers.
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn FormatParser>>,
    /// Lowercase dotted extension → parser name.
    extension_map: HashMap<String, String>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
            extension_map: HashMap::new(),
        }
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(OmniparseError::validation("Parser name cannot be empty"));
        }
        if name.contains(char::is_whitespace) {
            return Err(OmniparseError::validation(format!(
                "Parser name '{}' cannot contain whitespace",
                name
            )));
        }
        Ok(())
    }

    /// Register a parser for all extensions it declares.
    ///
    /// A duplicate name overwrites the existing entry (with a warning). On an
    /// extension collision the higher-priority parser keeps the binding and
    /// the reassignment is logged.
    pub fn register(&mut self, parser: Arc<dyn FormatParser>) -> Result<()> {
        let name = parser.name().to_string();
        Self::validate_name(&name)?;

        parser.initialize()?;

        if self.parsers.contains_key(&name) {
            warn!(parser = %name, "Parser already registered, overwriting");
            self.remove_extension_bindings(&name);
        }

        let priority = parser.priority();
        for ext in parser.extensions() {
            let Some(ext) = normalize_extension(ext) else {
                continue;
            };
            match self.extension_map.get(&ext) {
                Some(existing_name) if existing_name != &name => {
                    let existing_priority = self
                        .parsers
                        .get(existing_name)
                        .map(|p| p.priority())
                        .unwrap_or(i32::MIN);
                    if priority > existing_priority {
                        info!(
                            extension = %ext,
                            from = %existing_name,
                            to = %name,
                            "Extension reassigned to higher-priority parser"
                        );
                        self.extension_map.insert(ext, name.clone());
                    } else {
                        info!(
                            extension = %ext,
                            kept = %existing_name,
                            rejected = %name,
                            "Extension kept by higher-priority parser"
                        );
                    }
                }
                _ => {
                    self.extension_map.insert(ext, name.clone());
                }
            }
        }

        self.parsers.insert(name, parser);
        Ok(())
    }

    /// Unregister a parser, removing its extension bindings. Extensions it
    /// held are rebound to the highest-priority remaining candidate.
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        let Some(parser) = self.parsers.remove(name) else {
            return Err(OmniparseError::Plugin {
                message: format!("Parser '{}' is not registered", name),
                plugin_name: name.to_string(),
            });
        };
        parser.shutdown()?;
        self.remove_extension_bindings(name);

        // Rebind orphaned extensions to remaining candidates.
        for ext in parser.extensions() {
            let Some(ext) = normalize_extension(ext) else {
                continue;
            };
            if self.extension_map.contains_key(&ext) {
                continue;
            }
            let best = self
                .parsers
                .values()
                .filter(|p| {
                    p.extensions()
                        .iter()
                        .filter_map(|e| normalize_extension(e))
                        .any(|e| e == ext)
                })
                .max_by_key(|p| p.priority());
            if let Some(candidate) = best {
                self.extension_map.insert(ext, candidate.name().to_string());
            }
        }
        Ok(())
    }

    fn remove_extension_bindings(&mut self, name: &str) {
        self.extension_map.retain(|_, bound| bound != name);
    }

    /// Look up by parser name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn FormatParser>> {
        self.parsers.get(name).cloned()
    }

    /// Look up by path or bare extension (`"book.epub"`, `".epub"`, `"epub"`).
    pub fn get_parser(&self, path_or_ext: &str) -> Result<Arc<dyn FormatParser>> {
        let ext = normalize_extension(path_or_ext)
            .ok_or_else(|| OmniparseError::UnsupportedFormat(path_or_ext.to_string()))?;
        let name = self
            .extension_map
            .get(&ext)
            .ok_or_else(|| OmniparseError::UnsupportedFormat(ext.clone()))?;
        self.parsers
            .get(name)
            .cloned()
            .ok_or_else(|| OmniparseError::UnsupportedFormat(ext))
    }

    /// True when the extension maps to a parser or any registered
    /// `supports(path)` predicate claims the file.
    pub fn is_supported(&self, path: &Path) -> bool {
        if let Some(ext) = path.to_str().and_then(normalize_extension)
            && self.extension_map.contains_key(&ext)
        {
            return true;
        }
        self.parsers.values().any(|p| p.supports(path))
    }

    /// Sorted list of all registered dotted extensions.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.extension_map.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Metadata snapshots of every registered parser, sorted by name.
    pub fn list(&self) -> Vec<ParserInfo> {
        let mut infos: Vec<ParserInfo> = self
            .parsers
            .values()
            .map(|p| ParserInfo {
                name: p.name().to_string(),
                extensions: p
                    .extensions()
                    .iter()
                    .filter_map(|e| normalize_extension(e))
                    .collect(),
                description: p.description().to_string(),
                version: p.version(),
                priority: p.priority(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide parser registry.
///
/// Mutated at process init by `register_builtin_parsers` and by explicit
/// admin calls; read-only afterwards.
static GLOBAL_REGISTRY: Lazy<RwLock<ParserRegistry>> =
    Lazy::new(|| RwLock::new(ParserRegistry::new()));

/// Access the global parser registry.
pub fn global_registry() -> &'static RwLock<ParserRegistry> {
    &GLOBAL_REGISTRY
}
