//! Derived-field rules
//!
//! The only non-trivial per-record computation in the dashboard is the gender
//! grouping used by the users view. It is a presentation aid, not an identity
//! system: a fallback chain of stored value → name override table → `Other`.

use crate::core::traits::FieldDeriver;
use crate::types::{Record, Value};

/// Name of the derived field produced by [`GenderDeriver`]
pub const GENDER_GROUP: &str = "gender_group";

/// First names with a known grouping
///
/// Anything missing falls back to `Other`.
const NAME_OVERRIDES: [(&str, Gender); 16] = [
    ("ana", Gender::Female),
    ("maria", Gender::Female),
    ("joana", Gender::Female),
    ("beatriz", Gender::Female),
    ("carla", Gender::Female),
    ("sofia", Gender::Female),
    ("ines", Gender::Female),
    ("alice", Gender::Female),
    ("joao", Gender::Male),
    ("pedro", Gender::Male),
    ("miguel", Gender::Male),
    ("rui", Gender::Male),
    ("tiago", Gender::Male),
    ("bruno", Gender::Male),
    ("carlos", Gender::Male),
    ("bob", Gender::Male),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    /// Normalize a stored value onto the fixed vocabulary
    pub fn normalize(stored: &str) -> Option<Gender> {
        match fold(stored.trim()).as_str() {
            "m" | "male" | "man" | "masculino" | "homem" => Some(Gender::Male),
            "f" | "female" | "woman" | "feminino" | "mulher" => Some(Gender::Female),
            "o" | "other" | "outro" | "non-binary" | "nao binario" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Lowercase and strip the Latin accents common in Portuguese names
pub(crate) fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Infers `gender_group` for user records
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderDeriver;

impl GenderDeriver {
    pub fn infer(record: &Record) -> Gender {
        let stored = record
            .get("gender")
            .and_then(Value::as_text)
            .and_then(Gender::normalize);
        if let Some(gender) = stored {
            return gender;
        }

        let first_name = record
            .get("name")
            .and_then(Value::as_text)
            .and_then(|name| name.split_whitespace().next())
            .map(fold);

        first_name
            .and_then(|first| {
                NAME_OVERRIDES
                    .iter()
                    .find(|(name, _)| *name == first)
                    .map(|(_, gender)| *gender)
            })
            .unwrap_or(Gender::Other)
    }
}

impl FieldDeriver for GenderDeriver {
    fn name(&self) -> &str {
        GENDER_GROUP
    }

    fn derive(&self, record: &Record) -> Value {
        Value::from(Self::infer(record).label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::stored_wins(Some("F"), "Bob Marley", Gender::Female)]
    #[case::stored_portuguese(Some("Masculino"), "Ana", Gender::Male)]
    #[case::unknown_stored_falls_through(Some("prefer not to say"), "Ana Silva", Gender::Female)]
    #[case::accented_override(None, "João Pereira", Gender::Male)]
    #[case::case_insensitive(None, "MARIA", Gender::Female)]
    #[case::unmapped_name(None, "Kim Lee", Gender::Other)]
    #[case::stored_other(Some("other"), "Pedro", Gender::Other)]
    fn test_gender_fallback_chain(
        #[case] stored: Option<&str>,
        #[case] name: &str,
        #[case] expected: Gender,
    ) {
        let mut record = Record::new().with("name", name);
        if let Some(stored) = stored {
            record.insert("gender", stored);
        }
        assert_eq!(GenderDeriver::infer(&record), expected);
    }

    #[test]
    fn test_missing_name_is_other() {
        assert_eq!(GenderDeriver::infer(&Record::new()), Gender::Other);
    }

    #[test]
    fn test_deriver_exposes_label() {
        let record = Record::new().with("name", "Inês Costa");
        assert_eq!(GenderDeriver.derive(&record), Value::from("Female"));
        assert_eq!(GenderDeriver.name(), GENDER_GROUP);
    }
}
