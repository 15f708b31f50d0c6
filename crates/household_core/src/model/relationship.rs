//! Relationship-to-household-head enumeration.
//!
//! # Invariants
//! - The set is closed; `Head` (本人, "self") is the household head designation.
//! - Wire form is the Japanese label; the English variant name is accepted
//!   on input as well.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

macro_rules! relationships {
    ($($variant:ident => $label:literal, $name:literal;)+) => {
        /// Relationship of a member to the household head.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Relationship {
            $($variant,)+
        }

        impl Relationship {
            /// Every relationship in display order.
            pub const ALL: &'static [Relationship] = &[$(Relationship::$variant,)+];

            /// Wire label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Stable English name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

relationships! {
    Head => "本人", "self";
    Spouse => "配偶者", "spouse";
    Child => "子", "child";
    Father => "父", "father";
    Mother => "母", "mother";
    ElderBrother => "兄", "elder_brother";
    YoungerBrother => "弟", "younger_brother";
    ElderSister => "姉", "elder_sister";
    YoungerSister => "妹", "younger_sister";
    FatherInLaw => "義父", "father_in_law";
    MotherInLaw => "義母", "mother_in_law";
    ElderBrotherInLaw => "義兄", "elder_brother_in_law";
    YoungerBrotherInLaw => "義弟", "younger_brother_in_law";
    ElderSisterInLaw => "義姉", "elder_sister_in_law";
    YoungerSisterInLaw => "義妹", "younger_sister_in_law";
    Grandchild => "孫", "grandchild";
    GreatGrandchild => "ひ孫", "great_grandchild";
    Uncle => "おじ", "uncle";
    Aunt => "おば", "aunt";
    Cousin => "いとこ", "cousin";
    Grandfather => "祖父", "grandfather";
    Grandmother => "祖母", "grandmother";
    GreatGrandfather => "曽祖父", "great_grandfather";
    GreatGrandmother => "曽祖母", "great_grandmother";
    Niece => "姪", "niece";
    Nephew => "甥", "nephew";
    Other => "その他", "other";
}

impl Relationship {
    /// Returns whether this is the household head designation.
    pub fn is_head(self) -> bool {
        self == Self::Head
    }
}

/// Raw relationship input outside the closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipParseError(pub String);

impl Display for RelationshipParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown relationship: `{}`", self.0)
    }
}

impl Error for RelationshipParseError {}

impl FromStr for Relationship {
    type Err = RelationshipParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == value || candidate.name() == value)
            .ok_or_else(|| RelationshipParseError(value.to_string()))
    }
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Relationship {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Relationship {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lenient wire decoding: unknown or empty labels become `None`.
///
/// A record with an unknown relationship still loads; it simply fails
/// save-time validation until the operator picks a valid value.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Relationship>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse::<Relationship>() {
        Ok(relationship) => Some(relationship),
        Err(err) => {
            if !value.is_empty() {
                log::warn!("event=relationship_decode module=model status=unknown detail={err}");
            }
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::Relationship;

    #[test]
    fn parses_wire_label_and_english_name() {
        assert_eq!("本人".parse::<Relationship>().unwrap(), Relationship::Head);
        assert_eq!("spouse".parse::<Relationship>().unwrap(), Relationship::Spouse);
        assert!("boss".parse::<Relationship>().is_err());
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<&str> = Relationship::ALL.iter().map(|r| r.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Relationship::ALL.len());
    }

    #[test]
    fn only_self_is_head() {
        let heads: Vec<_> = Relationship::ALL.iter().filter(|r| r.is_head()).collect();
        assert_eq!(heads, vec![&Relationship::Head]);
    }
}
