//! OpenFOAM-style definition files.
//!
//! Entries are `name value;` with optional `// comment` tails, e.g. the
//! case parameters a run script writes next to `controlDict`:
//!
//! ```text
//! c       1;      // reference length
//! Ub      0.028;
//! solver  simpleFoam;
//! ```
//!
//! Multi-line values are not supported.

use crate::error::{ConvergenceError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionValue {
    /// First value token parsed as a number
    Number(f64),
    /// Raw value tokens
    Words(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    entries: BTreeMap<String, DefinitionValue>,
}

impl Definitions {
    pub fn parse(text: &str) -> Self {
        let uncommented: String = text
            .lines()
            .map(|line| line.split("//").next().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");

        let mut entries = BTreeMap::new();
        for statement in uncommented.split(';') {
            let mut tokens = statement.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            let words: Vec<String> = tokens.map(str::to_string).collect();

            let value = match words.first().map(|word| word.parse::<f64>()) {
                Some(Ok(number)) => DefinitionValue::Number(number),
                _ => DefinitionValue::Words(words),
            };
            entries.insert(name.to_string(), value);
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&DefinitionValue> {
        self.entries.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.entries.get(name)? {
            DefinitionValue::Number(number) => Some(*number),
            DefinitionValue::Words(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn read_definition_file(path: &Path) -> Result<Definitions> {
    let text = fs::read_to_string(path).map_err(|e| ConvergenceError::DefinitionFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let definitions = Definitions::parse(&text);
    debug!(
        "Read {} definitions from {}",
        definitions.len(),
        path.display()
    );
    Ok(definitions)
}

/// Numeric entry `key` of a definition file
pub fn read_number(path: &Path, key: &str) -> Result<f64> {
    read_definition_file(path)?
        .number(key)
        .ok_or_else(|| ConvergenceError::DefinitionFile {
            path: path.to_path_buf(),
            reason: format!("no numeric entry '{}'", key),
        })
}
