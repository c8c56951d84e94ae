//! Named-field encounter rows
//!
//! Row sources hand the analysis one [`EncounterRow`] per record of the primary
//! or follow-up extract. Fields are addressed by column name, never by position,
//! and a column the source did not provide reads as the empty string, which the
//! admissibility rules treat the same way as a blank cell.

use rustc_hash::FxHashMap;

/// One raw encounter record: column name to string value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterRow {
    fields: FxHashMap<String, String>,
}

impl EncounterRow {
    /// Create an empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Value of a field, or `""` if the row has no such column
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// Whether the row carries the named column at all
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of columns in the row
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EncounterRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { fields }
    }
}
