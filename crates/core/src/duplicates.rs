//! Duplicate customer detection.
//!
//! Two customers are duplicates when their phone numbers normalize to the
//! same key. Detection is a full rescan of whatever rows are supplied: build
//! a count per key, then mark every row whose key occurs more than once.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Reduce a phone number to its comparison key.
///
/// Whitespace, `(`, `)`, `-` and `+` are removed, so `"+233 (20) 123-4567"`
/// and `"233201234567"` produce the same key.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-' | '+'))
        .collect()
}

/// Occurrence counts per normalized phone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateIndex {
    counts: HashMap<String, usize>,
}

impl DuplicateIndex {
    /// Count every non-empty normalized phone.
    pub fn build<'a, I>(phones: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for key in phones.into_iter().flatten().map(normalize_phone) {
            if !key.is_empty() {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    /// How many rows share this phone's key.
    #[must_use]
    pub fn count(&self, phone: &str) -> usize {
        self.counts
            .get(&normalize_phone(phone))
            .copied()
            .unwrap_or(0)
    }

    /// Whether this phone appears on more than one row.
    #[must_use]
    pub fn is_duplicate(&self, phone: Option<&str>) -> bool {
        phone.is_some_and(|p| self.count(p) > 1)
    }

    /// Number of distinct keys shared by more than one row.
    #[must_use]
    pub fn duplicate_key_count(&self) -> usize {
        self.counts.values().filter(|&&n| n > 1).count()
    }
}

/// A row submitted for recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRow {
    /// Opaque row identifier echoed back in the mark.
    pub id: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Badge state for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMark {
    pub id: String,
    pub normalized_phone: String,
    pub duplicate: bool,
    /// Rows sharing this phone, including this one.
    pub occurrences: usize,
}

/// Compute badge state for every row, in input order.
#[must_use]
pub fn mark_duplicates(rows: &[PhoneRow]) -> Vec<DuplicateMark> {
    let index = DuplicateIndex::build(rows.iter().map(|r| r.phone.as_deref()));
    rows.iter()
        .map(|row| {
            let normalized_phone = row.phone.as_deref().map(normalize_phone).unwrap_or_default();
            let occurrences = if normalized_phone.is_empty() {
                0
            } else {
                index.counts.get(&normalized_phone).copied().unwrap_or(0)
            };
            DuplicateMark {
                id: row.id.clone(),
                normalized_phone,
                duplicate: occurrences > 1,
                occurrences,
            }
        })
        .collect()
}

/// Group row positions by shared phone key, keeping only groups of two or
/// more. Keys are ordered for stable reports.
pub fn duplicate_groups<'a, I>(phones: I) -> BTreeMap<String, Vec<usize>>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, phone) in phones.into_iter().enumerate() {
        let Some(key) = phone.map(normalize_phone).filter(|k| !k.is_empty()) else {
            continue;
        };
        groups.entry(key).or_default().push(position);
    }
    groups.retain(|_, rows| rows.len() > 1);
    groups
}
