//! Customer records.

use serde::{Deserialize, Serialize};

use super::Extra;
use crate::catalog::Listable;
use crate::duplicates::normalize_phone;
use crate::types::{CustomerId, Email, EmailError};

/// A customer as returned by `GET /api/customers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(alias = "full_name")]
    pub name: String,
    #[serde(default, alias = "phone_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Listable for Customer {
    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.phone.as_deref());
        fields.extend(self.email.as_deref());
        fields
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// Body of `POST /api/customers` and `PUT /api/customers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Validation failures for [`CustomerInput`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerValidationError {
    #[error("Customer name is required")]
    MissingName,
    #[error("Phone number is required")]
    MissingPhone,
    #[error("Phone number must contain only digits, spaces, +, (, ) or -")]
    InvalidPhone,
    #[error("Phone number must have at least {min} digits")]
    PhoneTooShort { min: usize },
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

impl CustomerInput {
    /// Minimum digits in a phone number.
    pub const MIN_PHONE_DIGITS: usize = 7;

    /// Validate and tidy the input.
    ///
    /// Trims every field, drops blank optional fields and normalizes the
    /// email. The phone is kept as typed so it displays the way the cashier
    /// entered it.
    ///
    /// # Errors
    ///
    /// Returns the first [`CustomerValidationError`] found.
    pub fn validated(self) -> Result<Self, CustomerValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CustomerValidationError::MissingName);
        }

        let phone = self.phone.trim().to_string();
        if phone.is_empty() {
            return Err(CustomerValidationError::MissingPhone);
        }
        let normalized = normalize_phone(&phone);
        if !normalized.chars().all(|c| c.is_ascii_digit()) {
            return Err(CustomerValidationError::InvalidPhone);
        }
        if normalized.len() < Self::MIN_PHONE_DIGITS {
            return Err(CustomerValidationError::PhoneTooShort {
                min: Self::MIN_PHONE_DIGITS,
            });
        }

        let email = match self.email.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(Email::parse(raw)?.into_inner()),
            _ => None,
        };
        let address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(Self {
            name,
            phone,
            email,
            address,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, phone: &str, email: Option<&str>) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.map(String::from),
            address: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_customer_accepts_aliases_and_keeps_extra_fields() {
        let json = serde_json::json!({
            "id": 7,
            "full_name": "Ama Mensah",
            "phone_number": "+233 20 123 4567",
            "loyalty_points": 120
        });
        let customer: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(customer.name, "Ama Mensah");
        assert_eq!(customer.phone.as_deref(), Some("+233 20 123 4567"));
        assert_eq!(customer.extra.get("loyalty_points"), Some(&120.into()));
    }

    #[test]
    fn test_validated_trims_and_drops_blanks() {
        let tidy = input("  Kofi ", " 024-555-0101 ", Some("")).validated().unwrap();
        assert_eq!(tidy.name, "Kofi");
        assert_eq!(tidy.phone, "024-555-0101");
        assert_eq!(tidy.email, None);
        assert_eq!(tidy.address, None);
    }

    #[test]
    fn test_validated_rejects_bad_phone() {
        assert_eq!(
            input("Kofi", "", None).validated(),
            Err(CustomerValidationError::MissingPhone)
        );
        assert_eq!(
            input("Kofi", "call me", None).validated(),
            Err(CustomerValidationError::InvalidPhone)
        );
        assert_eq!(
            input("Kofi", "12-34", None).validated(),
            Err(CustomerValidationError::PhoneTooShort { min: 7 })
        );
    }

    #[test]
    fn test_validated_rejects_bad_email() {
        assert!(matches!(
            input("Kofi", "0245550101", Some("kofi@")).validated(),
            Err(CustomerValidationError::InvalidEmail(_))
        ));
    }
}
