//! Month labels ("agosto/2025") and their chronological sort keys

use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Default vocabulary, in calendar order
pub const PORTUGUESE_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VocabularyError {
    #[error("Expected 12 month names, got {0}")]
    WrongLength(usize),
    #[error("Duplicate month name: {0}")]
    Duplicate(String),
}

/// Chronological position of a month label: year first, then month index (0-11).
///
/// Labels that cannot be parsed get [`SortKey::SENTINEL`] and therefore
/// sort before every real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SortKey {
    pub year: i32,
    pub month_index: u32,
}

impl SortKey {
    pub const SENTINEL: SortKey = SortKey {
        year: 0,
        month_index: 0,
    };

    pub fn new(year: i32, month_index: u32) -> Self {
        Self { year, month_index }
    }
}

/// Ordered list of month names with a name -> index lookup
#[derive(Debug, Clone)]
pub struct MonthVocabulary {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl MonthVocabulary {
    pub fn new<I, S>(names: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .collect();

        if names.len() != 12 {
            return Err(VocabularyError::WrongLength(names.len()));
        }

        let mut index = HashMap::with_capacity(12);
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i as u32).is_some() {
                return Err(VocabularyError::Duplicate(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    /// Parse a comma-separated list, e.g. from the `MONTH_NAMES` env var
    pub fn from_csv(list: &str) -> Result<Self, VocabularyError> {
        Self::new(list.split(',').filter(|s| !s.trim().is_empty()))
    }

    /// Vocabulary from an optional `MONTH_NAMES` value; blank or absent means the default
    pub fn from_optional_csv(list: Option<&str>) -> Result<Self, VocabularyError> {
        match list.filter(|l| !l.trim().is_empty()) {
            Some(list) => Self::from_csv(list),
            None => Ok(Self::default()),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn month_index(&self, name: &str) -> Option<u32> {
        self.index.get(&name.trim().to_lowercase()).copied()
    }

    /// Parse `"<month-name>/<year>"` into a key, falling back to the sentinel
    pub fn sort_key(&self, label: &str) -> SortKey {
        match self.parse_label(label) {
            Some(key) => key,
            None => {
                warn!("Unparseable month label '{}', sorting it first", label);
                SortKey::SENTINEL
            }
        }
    }

    /// Strict variant of [`sort_key`](Self::sort_key)
    pub fn parse_label(&self, label: &str) -> Option<SortKey> {
        let lowered = label.to_lowercase();
        let mut parts = lowered.split('/');
        let (month, year) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(y), None) => (m, y),
            _ => return None,
        };

        let year: i32 = year.trim().parse().ok()?;
        let month_index = self.month_index(month)?;

        Some(SortKey::new(year, month_index))
    }

    /// Build the label for a key, e.g. `(2025, 7)` -> `"agosto/2025"`
    pub fn label(&self, key: SortKey) -> Option<String> {
        self.names
            .get(key.month_index as usize)
            .map(|name| format!("{}/{}", name, key.year))
    }
}

impl Default for MonthVocabulary {
    fn default() -> Self {
        let names: Vec<String> = PORTUGUESE_MONTHS.iter().map(|s| s.to_string()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i as u32))
            .collect();
        Self { names, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parses_label() {
        let vocab = MonthVocabulary::default();
        assert_eq!(vocab.sort_key("agosto/2025"), SortKey::new(2025, 7));
        assert_eq!(vocab.sort_key("janeiro/2024"), SortKey::new(2024, 0));
        assert_eq!(vocab.sort_key("Dezembro/2023"), SortKey::new(2023, 11));
        assert_eq!(vocab.sort_key("março / 2025"), SortKey::new(2025, 2));
    }

    #[test]
    fn test_sort_key_sentinel_for_bad_labels() {
        let vocab = MonthVocabulary::default();
        assert_eq!(vocab.sort_key("agosto"), SortKey::SENTINEL);
        assert_eq!(vocab.sort_key("agosto/20x5"), SortKey::SENTINEL);
        assert_eq!(vocab.sort_key("august/2025"), SortKey::SENTINEL);
        assert_eq!(vocab.sort_key("agosto/2025/1"), SortKey::SENTINEL);
        assert_eq!(vocab.sort_key(""), SortKey::SENTINEL);
    }

    #[test]
    fn test_sort_key_ordering() {
        assert!(SortKey::new(2024, 11) < SortKey::new(2025, 0));
        assert!(SortKey::new(2025, 1) < SortKey::new(2025, 2));
        assert!(SortKey::SENTINEL < SortKey::new(1, 0));
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocab = MonthVocabulary::from_csv(
            "january,february,march,april,may,june,july,august,september,october,november,december",
        )
        .unwrap();
        assert_eq!(vocab.sort_key("march/2025"), SortKey::new(2025, 2));
        assert_eq!(vocab.label(SortKey::new(2025, 2)), Some("march/2025".to_string()));
    }

    #[test]
    fn test_vocabulary_validation() {
        assert_eq!(
            MonthVocabulary::from_csv("a,b,c").unwrap_err(),
            VocabularyError::WrongLength(3)
        );
        assert!(matches!(
            MonthVocabulary::new(["a"; 12]),
            Err(VocabularyError::Duplicate(_))
        ));
    }

    #[test]
    fn test_optional_vocabulary() {
        let default = MonthVocabulary::from_optional_csv(None).unwrap();
        assert_eq!(default.names()[11], "dezembro");
        let blank = MonthVocabulary::from_optional_csv(Some("  ")).unwrap();
        assert_eq!(blank.names(), default.names());

        let english = MonthVocabulary::from_optional_csv(Some(
            "jan,feb,mar,apr,may,jun,jul,aug,sep,oct,nov,dec",
        ))
        .unwrap();
        assert_eq!(english.month_index("aug"), Some(7));
        assert!(MonthVocabulary::from_optional_csv(Some("jan,feb")).is_err());
    }
}
