//! Aggregated component concentrations.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::component::{Reagent, Source};
use crate::quantity::{Concentration, Ratio};

/// One aggregated component.
#[derive(Debug, Clone)]
pub struct TableEntry {
    /// The component itself.
    pub source: Source,
    /// Total concentration of this component in the enclosing mix.
    pub concentration: Concentration,
}

/// Components keyed by name, in first-seen order.
///
/// Inserting a name that is already present adds the concentrations, so a
/// component reached through two paths is reported once with its combined
/// concentration. An undefined contribution makes the total undefined.
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    entries: IndexMap<String, TableEntry>,
}

impl ComponentTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `concentration` of `source`, summing with any existing entry.
    pub fn insert(&mut self, source: Source, concentration: Concentration) {
        match self.entries.entry(source.name().to_string()) {
            Entry::Occupied(mut e) => {
                let entry = e.get_mut();
                entry.concentration = entry.concentration + concentration;
                entry.source = source;
            }
            Entry::Vacant(e) => {
                e.insert(TableEntry {
                    source,
                    concentration,
                });
            }
        }
    }

    /// Merge every entry of `other` into this table.
    pub fn merge(&mut self, other: ComponentTable) {
        for (_, entry) in other.entries {
            self.insert(entry.source, entry.concentration);
        }
    }

    /// Copy with every concentration multiplied by `factor`.
    pub fn scaled(&self, factor: Ratio) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    TableEntry {
                        source: entry.source.clone(),
                        concentration: entry.concentration * factor,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Look up an entry by component name.
    pub fn get(&self, name: &str) -> Option<&TableEntry> {
        self.entries.get(name)
    }

    /// Concentration of the named component, if present.
    pub fn concentration_of(&self, name: &str) -> Option<Concentration> {
        self.get(name).map(|e| e.concentration)
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Component names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Source, Concentration)> for ComponentTable {
    fn from_iter<I: IntoIterator<Item = (Source, Concentration)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (source, concentration) in iter {
            table.insert(source, concentration);
        }
        table
    }
}
