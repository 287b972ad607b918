//! Duplicate customer report.
//!
//! Reads a customer export (a bare array, or an API response such as
//! `{"success": true, "customers": [...]}`) and prints every group of
//! customers sharing a normalized phone number.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use sellapp_core::duplicates::duplicate_groups;
use sellapp_core::envelope::{EnvelopeError, unwrap_envelope};
use sellapp_core::models::Customer;

/// Errors that can occur while reading a customer export.
#[derive(Debug, Error)]
pub enum DuplicatesError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid customer JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export holds no customers: {0}")]
    Envelope(#[from] EnvelopeError),
}

/// One group of customers sharing a phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub phone: String,
    pub customers: Vec<(String, String)>,
}

/// Read a customer export and print its duplicate groups.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[allow(clippy::print_stdout)]
pub fn report(path: &Path) -> Result<(), DuplicatesError> {
    let text = std::fs::read_to_string(path).map_err(|source| DuplicatesError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let customers = parse_customers(&text)?;
    let groups = find_groups(&customers);

    tracing::info!(
        customers = customers.len(),
        groups = groups.len(),
        "Duplicate scan complete"
    );

    if groups.is_empty() {
        println!("No duplicate phone numbers among {} customers", customers.len());
        return Ok(());
    }
    for group in &groups {
        println!("{} ({} customers)", group.phone, group.customers.len());
        for (id, name) in &group.customers {
            println!("  #{id} {name}");
        }
    }
    Ok(())
}

/// Parse an export into customers.
fn parse_customers(text: &str) -> Result<Vec<Customer>, DuplicatesError> {
    let list = match unwrap_envelope(serde_json::from_str(text)?)? {
        Value::Object(mut map) => map
            .remove("customers")
            .or_else(|| map.remove("items"))
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

fn find_groups(customers: &[Customer]) -> Vec<DuplicateGroup> {
    duplicate_groups(customers.iter().map(|c| c.phone.as_deref()))
        .into_iter()
        .map(|(phone, positions)| DuplicateGroup {
            phone,
            customers: positions
                .into_iter()
                .filter_map(|i| customers.get(i))
                .map(|c| (c.id.to_string(), c.name.clone()))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_from_bare_array() {
        let customers = parse_customers(
            r#"[
                {"id": 1, "name": "Ama", "phone": "+233 (20) 123-4567"},
                {"id": 2, "name": "Kwame", "phone": "233201234567"},
                {"id": 3, "name": "Efua", "phone": "0244000000"}
            ]"#,
        )
        .unwrap();
        let groups = find_groups(&customers);

        assert_eq!(groups.len(), 1);
        let group = groups.first().unwrap();
        assert_eq!(group.phone, "233201234567");
        assert_eq!(
            group.customers,
            vec![
                ("1".to_string(), "Ama".to_string()),
                ("2".to_string(), "Kwame".to_string())
            ]
        );
    }

    #[test]
    fn test_envelope_shapes() {
        let keyed = r#"{"success": true, "customers": [{"id": 1, "name": "Ama"}]}"#;
        assert_eq!(parse_customers(keyed).unwrap().len(), 1);

        let nested = r#"{"success": true, "data": {"customers": [{"id": 1, "name": "Ama"}]}}"#;
        assert_eq!(parse_customers(nested).unwrap().len(), 1);

        let rejected = r#"{"success": false, "error": "Unauthorized"}"#;
        assert!(matches!(
            parse_customers(rejected),
            Err(DuplicatesError::Envelope(EnvelopeError::Rejected(_)))
        ));
    }
}
