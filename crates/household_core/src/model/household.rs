//! Household records and editable household fields.
//!
//! # Responsibility
//! - Define the server-side household record and search envelopes.
//! - Define the editable subset sent on create/update.
//!
//! # Invariants
//! - `uid` is server-assigned; the client never invents one.
//! - `name` is only populated by search responses.

use serde::{Deserialize, Serialize};

/// Opaque server-assigned household identifier.
pub type HouseholdId = String;

/// Household record as returned by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub uid: HouseholdId,
    /// Display name of the household head. Search results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub zip_code: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    /// RFC 3339 creation timestamp.
    pub created: String,
    /// RFC 3339 last-update timestamp.
    pub updated: String,
}

impl Household {
    /// Returns the editable projection of this record.
    pub fn fields(&self) -> HouseholdFields {
        HouseholdFields {
            zip_code: self.zip_code.clone(),
            address: self.address.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
        }
    }
}

/// Editable household attributes, used as create and update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdFields {
    pub zip_code: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
}

impl HouseholdFields {
    /// Returns the raw value of one field.
    pub fn get(&self, field: HouseholdField) -> &str {
        match field {
            HouseholdField::PhoneNumber => &self.phone_number,
            HouseholdField::Email => &self.email,
            HouseholdField::ZipCode => &self.zip_code,
            HouseholdField::Address => &self.address,
        }
    }

    /// Assigns one field without validation.
    pub fn set(&mut self, field: HouseholdField, value: impl Into<String>) {
        let value = value.into();
        match field {
            HouseholdField::PhoneNumber => self.phone_number = value,
            HouseholdField::Email => self.email = value,
            HouseholdField::ZipCode => self.zip_code = value,
            HouseholdField::Address => self.address = value,
        }
    }
}

/// Addressable household attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HouseholdField {
    PhoneNumber,
    Email,
    ZipCode,
    Address,
}

impl HouseholdField {
    /// All fields in save-time validation order.
    pub const ALL: [HouseholdField; 4] = [
        HouseholdField::PhoneNumber,
        HouseholdField::Email,
        HouseholdField::ZipCode,
        HouseholdField::Address,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhoneNumber => "phone_number",
            Self::Email => "email",
            Self::ZipCode => "zip_code",
            Self::Address => "address",
        }
    }
}

/// Search request for the household listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHouseholdsRequest {
    /// Substring matched against email and phone number.
    pub search: String,
    pub offset: i64,
    pub limit: i64,
}

impl FetchHouseholdsRequest {
    pub fn new(search: impl Into<String>, offset: i64, limit: i64) -> Self {
        Self {
            search: search.into(),
            offset,
            limit,
        }
    }

    /// Checks paging bounds: `limit >= 1` and `offset >= 0`.
    pub fn check_paging(&self) -> Result<(), String> {
        if self.limit < 1 {
            return Err(format!("limit is less than 1: {}", self.limit));
        }
        if self.offset < 0 {
            return Err(format!("offset is less than 0: {}", self.offset));
        }
        Ok(())
    }
}

/// Search response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHouseholdsResponse {
    /// Total number of matches before paging.
    pub count: u64,
    pub households: Vec<Household>,
}

#[cfg(test)]
mod tests {
    use super::{FetchHouseholdsRequest, HouseholdField, HouseholdFields};

    #[test]
    fn set_and_get_address_each_field() {
        let mut fields = HouseholdFields::default();
        for (index, field) in HouseholdField::ALL.into_iter().enumerate() {
            fields.set(field, format!("value-{index}"));
        }
        assert_eq!(fields.phone_number, "value-0");
        assert_eq!(fields.email, "value-1");
        assert_eq!(fields.zip_code, "value-2");
        assert_eq!(fields.address, "value-3");
        assert_eq!(fields.get(HouseholdField::Email), "value-1");
    }

    #[test]
    fn paging_bounds_are_checked() {
        assert!(FetchHouseholdsRequest::new("", 0, 1).check_paging().is_ok());
        assert!(FetchHouseholdsRequest::new("", 0, 0).check_paging().is_err());
        assert!(FetchHouseholdsRequest::new("", -1, 10).check_paging().is_err());
    }
}
