use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// One component of a verse locator.
///
/// Corpus files carry locators either as JSON numbers or strings. The value
/// is kept exactly as loaded so it serializes back unchanged, and compared by
/// its string form because route parameters arrive as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocatorPart {
    Number(Number),
    Text(String),
}

impl LocatorPart {
    /// Compare against a route parameter.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            Self::Text(s) => s == raw,
            Self::Number(_) => self.to_string() == raw,
        }
    }
}

impl std::fmt::Display for LocatorPart {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            // Integral floats render without a fraction ("3.0" -> "3").
            Self::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e15 => {
                    write!(f, "{}", x as i64)
                }
                _ => write!(f, "{n}"),
            },
        }
    }
}

impl From<u32> for LocatorPart {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for LocatorPart {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A single verse of the corpus.
///
/// Fields this service does not interpret are kept in `extra` and echoed
/// back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub mandala: LocatorPart,
    pub hymn: LocatorPart,
    pub verse: LocatorPart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanskrit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub themes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerseRecord {
    /// Citation string, e.g. `Rig 1.1.1`.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("Rig {}.{}.{}", self.mandala, self.hymn, self.verse)
    }

    #[must_use]
    pub fn is_at(&self, mandala: &str, hymn: &str, verse: &str) -> bool {
        self.mandala.matches(mandala) && self.hymn.matches(hymn) && self.verse.matches(verse)
    }

    /// Any keyword, deity, or theme contains `needle` (already lowercased).
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.keywords
            .iter()
            .chain(&self.deities)
            .chain(&self.themes)
            .any(|s| s.to_lowercase().contains(needle))
    }

    #[must_use]
    pub fn has_theme(&self, lowered: &str) -> bool {
        self.themes.iter().any(|t| t.to_lowercase() == lowered)
    }

    #[must_use]
    pub fn has_deity(&self, lowered: &str) -> bool {
        self.deities.iter().any(|d| d.to_lowercase() == lowered)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
