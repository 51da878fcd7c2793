//! Vendor extension handlers.
//!
//! `x-name: value` lines are converted by the handler registered for `x-name`.
//! Lines without a handler are kept as plain strings. The registry is the only
//! shared structure: hosts may register handlers at any time while the
//! pipeline reads them.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Converts the raw text of one extension line into a JSON value.
pub type ExtensionHandler = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Value kinds configurable from `.apiscriberc.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    String,
    Boolean,
    Integer,
    Number,
    Json,
}

impl ExtensionKind {
    pub fn handler(self) -> ExtensionHandler {
        match self {
            Self::String => Arc::new(|raw: &str| Ok(Value::String(raw.to_string()))),
            Self::Boolean => Arc::new(|raw: &str| {
                raw.trim()
                    .parse::<bool>()
                    .map(Value::Bool)
                    .map_err(|_| format!("expected a boolean, found '{}'", raw))
            }),
            Self::Integer => Arc::new(|raw: &str| {
                raw.trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| format!("expected an integer, found '{}'", raw))
            }),
            Self::Number => Arc::new(|raw: &str| {
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("expected a number, found '{}'", raw))
            }),
            Self::Json => Arc::new(|raw: &str| {
                serde_json::from_str(raw).map_err(|e| format!("invalid JSON value: {}", e))
            }),
        }
    }
}

#[derive(Default)]
pub struct ExtensionRegistry {
    handlers: RwLock<HashMap<String, ExtensionHandler>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ExtensionRegistry")
            .field("handlers", &names)
            .finish()
    }
}

static GLOBAL: LazyLock<ExtensionRegistry> = LazyLock::new(ExtensionRegistry::default);

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static ExtensionRegistry {
        &GLOBAL
    }

    /// Register (or replace) the handler for `name`. Names are case-insensitive.
    pub fn register(&self, name: &str, handler: ExtensionHandler) {
        let key = name.to_ascii_lowercase();
        self.handlers.write().insert(key, handler);
    }

    pub fn register_kind(&self, name: &str, kind: ExtensionKind) {
        self.register(name, kind.handler());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        self.handlers.read().contains_key(&key)
    }

    /// Convert one extension line.
    pub fn convert(&self, name: &str, raw: &str) -> Result<Value, String> {
        let key = name.to_ascii_lowercase();
        let handler = self.handlers.read().get(&key).cloned();
        match handler {
            Some(handler) => handler(raw),
            None => Ok(Value::String(raw.to_string())),
        }
    }
}
