//! Field validators for household and member input.
//!
//! # Responsibility
//! - Provide pure predicates over raw field input.
//! - Aggregate predicates per record for blur-time feedback and the
//!   save-time gate, both sharing this single implementation.
//!
//! # Invariants
//! - Every predicate is pure: same input, same answer, no side effects.
//! - Emptiness checks do not trim; whitespace-only text is accepted.

use crate::model::household::{HouseholdField, HouseholdFields};
use crate::model::member::{Member, MemberField};
use crate::model::relationship::Relationship;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,11}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+$").expect("valid email regex")
});
static ZIP_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{7}$").expect("valid zip regex"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// 10 or 11 ASCII digits.
pub fn is_valid_phone_number(value: &str) -> bool {
    PHONE_NUMBER_RE.is_match(value)
}

/// `local-part@domain.tld` shape, not full RFC 5322.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Exactly 7 ASCII digits, no hyphen.
pub fn is_valid_zip_code(value: &str) -> bool {
    ZIP_CODE_RE.is_match(value)
}

pub fn is_valid_address(value: &str) -> bool {
    !value.is_empty()
}

pub fn is_valid_family_name(value: &str) -> bool {
    !value.is_empty()
}

pub fn is_valid_given_name(value: &str) -> bool {
    !value.is_empty()
}

/// Returns whether `value` parses into a valid calendar date.
///
/// Accepts ISO dates, slash/dot separated dates, month-name dates, local
/// date-times, RFC 3339, RFC 2822 and a bare four-digit year.
pub fn is_valid_date(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(value, format).is_ok())
        || DATE_TIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_rfc2822(value).is_ok()
}

/// Raw relationship input must name a member of the closed enumeration.
pub fn is_valid_relationship(value: &str) -> bool {
    value.parse::<Relationship>().is_ok()
}

/// Validates one household field from raw input.
pub fn validate_household_field(field: HouseholdField, value: &str) -> bool {
    match field {
        HouseholdField::PhoneNumber => is_valid_phone_number(value),
        HouseholdField::Email => is_valid_email(value),
        HouseholdField::ZipCode => is_valid_zip_code(value),
        HouseholdField::Address => is_valid_address(value),
    }
}

/// Validates one member field from raw input.
pub fn validate_member_field(field: MemberField, value: &str) -> bool {
    match field {
        MemberField::FamilyName => is_valid_family_name(value),
        MemberField::GivenName => is_valid_given_name(value),
        MemberField::Birthday => is_valid_date(value),
        MemberField::Relationship => is_valid_relationship(value),
    }
}

/// Lists household fields that fail validation, in validation order.
pub fn check_household(fields: &HouseholdFields) -> Vec<HouseholdField> {
    HouseholdField::ALL
        .into_iter()
        .filter(|field| !validate_household_field(*field, fields.get(*field)))
        .collect()
}

/// Lists member fields that fail validation, in validation order.
pub fn check_member(member: &Member) -> Vec<MemberField> {
    let mut failed = Vec::new();
    if !is_valid_family_name(&member.family_name) {
        failed.push(MemberField::FamilyName);
    }
    if !is_valid_given_name(&member.given_name) {
        failed.push(MemberField::GivenName);
    }
    if !is_valid_date(&member.birthday) {
        failed.push(MemberField::Birthday);
    }
    if member.relationship.is_none() {
        failed.push(MemberField::Relationship);
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_number_accepts_ten_or_eleven_digits() {
        assert!(is_valid_phone_number("0312345678"));
        assert!(is_valid_phone_number("09012345678"));
        assert!(!is_valid_phone_number("031234567"));
        assert!(!is_valid_phone_number("090123456789"));
        assert!(!is_valid_phone_number("090-1234-5678"));
        assert!(!is_valid_phone_number("０９０１２３４５６７８"));
    }

    #[test]
    fn email_requires_dot_in_domain() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@example.co.jp"));
        assert!(!is_valid_email("a@bco"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@b.co"));
    }

    #[test]
    fn zip_code_is_seven_digits() {
        assert!(is_valid_zip_code("1000001"));
        assert!(!is_valid_zip_code("100-0001"));
        assert!(!is_valid_zip_code("100000"));
    }

    #[test]
    fn emptiness_checks_do_not_trim() {
        assert!(!is_valid_address(""));
        assert!(is_valid_address("   "));
        assert!(!is_valid_family_name(""));
        assert!(is_valid_given_name(" "));
    }

    #[test]
    fn date_accepts_loose_formats() {
        for value in [
            "1990-01-21",
            "1990/01/21",
            "01/21/1990",
            "January 21, 1990",
            "21 Jan 1990",
            "1990-01-21T09:30:00",
            "1990-01-21T09:30:00+09:00",
            "1990",
        ] {
            assert!(is_valid_date(value), "{value} should parse");
        }
        for value in ["", "1990-02-30", "not a date", "1990-13-01"] {
            assert!(!is_valid_date(value), "{value} should not parse");
        }
    }

    #[test]
    fn relationship_must_be_in_enumeration() {
        assert!(is_valid_relationship("本人"));
        assert!(is_valid_relationship("その他"));
        assert!(!is_valid_relationship("友人"));
        assert!(!is_valid_relationship(""));
    }

    #[test]
    fn check_household_reports_failing_fields_in_order() {
        let fields = HouseholdFields {
            zip_code: "1000001".to_string(),
            address: String::new(),
            phone_number: "123".to_string(),
            email: "a@b.co".to_string(),
        };
        assert_eq!(
            check_household(&fields),
            vec![HouseholdField::PhoneNumber, HouseholdField::Address]
        );
    }

    #[test]
    fn check_member_flags_every_empty_field() {
        assert_eq!(check_member(&Member::empty()), MemberField::ALL.to_vec());
    }

    #[test]
    fn validators_are_idempotent() {
        for value in ["09012345678", "a@b.co", "", "1990-01-21", "本人"] {
            assert_eq!(is_valid_phone_number(value), is_valid_phone_number(value));
            assert_eq!(is_valid_email(value), is_valid_email(value));
            assert_eq!(is_valid_date(value), is_valid_date(value));
            assert_eq!(is_valid_relationship(value), is_valid_relationship(value));
        }
    }
}
