//! Header line handling for probe and residual files.
//!
//! Probe files declare their probe positions in `#` comments of the form
//! `# Probe <index> (<x> <y> <z>)`; residual logs declare their column order
//! in a `#` comment containing `Time`. Everything else starting with `#` is
//! an ordinary comment.

use crate::error::LineError;
use crate::models::ProbeLocation;
use std::collections::BTreeMap;
use tracing::debug;

/// Kind of a raw (non-blank) input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Data,
}

/// A line is a header iff its first character is `#`
pub fn classify_line(line: &str) -> LineKind {
    if line.starts_with('#') {
        LineKind::Header
    } else {
        LineKind::Data
    }
}

/// Probe index to position mapping collected from header comments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeLocationRegistry {
    locations: BTreeMap<usize, ProbeLocation>,
}

impl ProbeLocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the location declared by a header line, if it declares one.
    ///
    /// An index that is already known keeps its first position.
    pub fn observe(&mut self, line: &str) -> Result<(), LineError> {
        if !line.contains("Probe") || !line.contains('(') {
            return Ok(());
        }

        let location = parse_location_declaration(line)?;
        if self.locations.contains_key(&location.index) {
            debug!("Ignoring repeated declaration of probe {}", location.index);
            return Ok(());
        }

        self.locations.insert(location.index, location);
        Ok(())
    }

    /// Add every location of `other` whose index is not yet known
    pub fn merge_from(&mut self, other: &ProbeLocationRegistry) {
        for (index, location) in &other.locations {
            self.locations.entry(*index).or_insert(*location);
        }
    }

    pub fn get(&self, index: usize) -> Option<&ProbeLocation> {
        self.locations.get(&index)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Locations in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &ProbeLocation> {
        self.locations.values()
    }
}

fn parse_location_declaration(line: &str) -> Result<ProbeLocation, LineError> {
    let stripped = line.replace(['(', ')'], " ");
    let tokens: Vec<&str> = stripped.split_whitespace().collect();

    // "#", "Probe", index, x, y, z
    if tokens.len() < 6 {
        return Err(LineError::MalformedHeader {
            reason: format!(
                "expected '# Probe <index> (<x> <y> <z>)', found {} tokens",
                tokens.len()
            ),
        });
    }

    let index = tokens[2]
        .parse::<usize>()
        .map_err(|_| LineError::MalformedHeader {
            reason: format!("probe index '{}' is not an integer", tokens[2]),
        })?;

    let mut position = [0.0; 3];
    for (slot, token) in position.iter_mut().zip(&tokens[tokens.len() - 3..]) {
        *slot = token.parse::<f64>().map_err(|_| LineError::MalformedHeader {
            reason: format!("probe {} coordinate '{}' is not a number", index, token),
        })?;
    }

    Ok(ProbeLocation { index, position })
}

/// Column names declared by a residual header line, if it is a schema header
pub fn parse_residual_schema(line: &str) -> Option<Vec<String>> {
    if !line.to_lowercase().contains("time") {
        return None;
    }

    let columns = line
        .replace('\t', " ")
        .replace('#', "")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Some(columns)
}
