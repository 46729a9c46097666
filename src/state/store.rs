//! Contact store
//!
//! Ordered, append-only, in-memory list of contacts seeded at construction

use super::contact::Contact;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seed document parsed into every new store
const SEED_CONTACTS: &str = r#"{
    "contacts": [{
        "name": "郭仲杰",
        "department": "公司其他组织/TME商业广告部",
        "title": "员工",
        "phoneNumber": "0755-86013388-75789",
        "email": "authurguo@tencent.com"
    }]
}"#;

/// Errors raised while building a store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The seed document could not be parsed
    #[error("Invalid seed data: {0}")]
    InvalidSeed(#[from] serde_json::Error),
}

/// Ordered list of contacts
///
/// Serializes as `{"contacts": [...]}`, which is also the shape of the
/// `GET /contacts` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactStore {
    #[serde(default)]
    contacts: Vec<Contact>,
}

impl ContactStore {
    /// Create a store holding the seed record
    pub fn new() -> Result<Self, StoreError> {
        Self::from_json(SEED_CONTACTS)
    }

    /// Parse a `{"contacts": [...]}` document into a store
    pub fn from_json(data: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Append a contact to the end of the list
    pub fn append(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// All contacts in insertion order
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of contacts held
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the store holds no contacts
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Serialize the whole store as JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_holds_seed() {
        let store = ContactStore::new().expect("seed should parse");
        assert_eq!(store.len(), 1);

        let seed = &store.contacts()[0];
        assert_eq!(seed.name, "郭仲杰");
        assert_eq!(seed.department, "公司其他组织/TME商业广告部");
        assert_eq!(seed.title, "员工");
        assert_eq!(seed.phone_number, "0755-86013388-75789");
        assert_eq!(seed.email, "authurguo@tencent.com");
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = ContactStore::new().unwrap();
        store.append(Contact::named("first"));
        store.append(Contact::named("second"));
        store.append(Contact::named("first"));

        let names: Vec<&str> = store.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["郭仲杰", "first", "second", "first"]);
    }

    #[test]
    fn test_from_json_rejects_malformed_seed() {
        let result = ContactStore::from_json("{\"contacts\": [");
        assert!(matches!(result, Err(StoreError::InvalidSeed(_))));
    }

    #[test]
    fn test_from_json_empty_document() {
        let store = ContactStore::from_json("{}").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_to_json_wraps_contacts() {
        let store = ContactStore::new().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&store.to_json().unwrap()).unwrap();
        let contacts = value["contacts"].as_array().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0]["phoneNumber"], "0755-86013388-75789");
    }
}
