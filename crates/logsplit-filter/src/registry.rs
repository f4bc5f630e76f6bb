use std::collections::HashSet;

use logsplit_types::FilterSetConfig;

use crate::error::{FilterError, Result};
use crate::filter::Filter;

/// A named filter; one output channel
#[derive(Clone, Debug)]
pub struct RegistryEntry {
    pub name: String,
    pub filter: Filter,
}

/// Ordered, read-only set of named filters
///
/// Iteration order is configuration order, which is also the order
/// channels are created in (output files, tabs).
#[derive(Clone, Debug, Default)]
pub struct FilterRegistry {
    entries: Vec<RegistryEntry>,
}

impl FilterRegistry {
    /// Compile one filter per set, in order
    pub fn build<I>(sets: I) -> Result<Self>
    where
        I: IntoIterator<Item = FilterSetConfig>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for set in sets {
            if !seen.insert(set.name.clone()) {
                return Err(FilterError::duplicate_name(set.name));
            }

            let filter = Filter::new(set.match_rules(), set.combinator)
                .map_err(|e| e.in_channel(&set.name))?;

            tracing::debug!(
                channel = %set.name,
                rules = filter.len(),
                combinator = set.combinator.as_str(),
                "compiled filter"
            );

            entries.push(RegistryEntry {
                name: set.name,
                filter,
            });
        }

        Ok(Self { entries })
    }

    /// Entries as `(name, filter)` in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.filter))
    }

    /// Look up a filter by channel name
    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.filter)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
