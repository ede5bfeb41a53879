//! The single persisted document: every user and chirp, serialized as one
//! JSON object.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use chirp_types::models::{Chirp, User};

use crate::error::{Result, StoreError};

/// In-memory form of the database file.
///
/// Both mappings are keyed by record id and ordered, so the JSON shape
/// (`{"<id>": {...}}`) is preserved while iteration follows id order.
/// `email_index` is derived from `users` on every decode and never written.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub chirps: BTreeMap<u64, Chirp>,
    #[serde(default)]
    pub users: BTreeMap<u64, User>,
    #[serde(skip)]
    email_index: HashMap<String, u64>,
}

impl Document {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut doc: Document = serde_json::from_slice(bytes)?;

        if let Some((key, chirp)) = doc.chirps.iter().find(|(k, c)| **k != c.id) {
            return Err(StoreError::Corrupt(format!(
                "chirp stored under key {} has id {}",
                key, chirp.id
            )));
        }
        if let Some((key, user)) = doc.users.iter().find(|(k, u)| **k != u.id) {
            return Err(StoreError::Corrupt(format!(
                "user stored under key {} has id {}",
                key, user.id
            )));
        }
        if doc.chirps.contains_key(&0) || doc.users.contains_key(&0) {
            return Err(StoreError::Corrupt("record with id 0".to_string()));
        }

        doc.rebuild_index();
        Ok(doc)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Lowest id wins if the file holds duplicate emails, matching a scan
    /// in id order.
    fn rebuild_index(&mut self) {
        self.email_index.clear();
        for user in self.users.values() {
            self.email_index.entry(user.email.clone()).or_insert(user.id);
        }
    }

    pub fn user_id_by_email(&self, email: &str) -> Option<u64> {
        self.email_index.get(email).copied()
    }

    pub fn next_chirp_id(&self) -> Result<u64> {
        next_id(&self.chirps, "chirp")
    }

    pub fn next_user_id(&self) -> Result<u64> {
        next_id(&self.users, "user")
    }

    pub fn insert_chirp(&mut self, author_id: u64, body: String) -> Result<Chirp> {
        let chirp = Chirp {
            id: self.next_chirp_id()?,
            author_id,
            body,
        };
        self.chirps.insert(chirp.id, chirp.clone());
        Ok(chirp)
    }

    pub fn insert_user(&mut self, email: String, password: String) -> Result<User> {
        let user = User {
            id: self.next_user_id()?,
            email,
            password,
            is_chirpy_red: false,
        };
        self.email_index.entry(user.email.clone()).or_insert(user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Change a user's email, keeping the index in step.
    pub fn set_user_email(&mut self, id: u64, email: String) -> bool {
        let Some(user) = self.users.get_mut(&id) else {
            return false;
        };
        user.email = email;
        self.rebuild_index();
        true
    }
}

/// Max-plus-one. A document whose largest id is `u64::MAX` has no next id.
fn next_id<T>(map: &BTreeMap<u64, T>, entity: &str) -> Result<u64> {
    match map.keys().next_back() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt(format!("{entity} id space exhausted at {max}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_allocates_from_one() {
        let doc = Document::default();
        assert_eq!(doc.next_chirp_id().unwrap(), 1);
        assert_eq!(doc.next_user_id().unwrap(), 1);
    }

    #[test]
    fn allocation_is_max_plus_one_not_count_plus_one() {
        let raw = br#"{
            "chirps": {
                "2": {"id": 2, "author_id": 1, "body": "two"},
                "7": {"id": 7, "author_id": 1, "body": "seven"}
            },
            "users": {}
        }"#;
        let mut doc = Document::decode(raw).unwrap();
        assert_eq!(doc.insert_chirp(1, "next".into()).unwrap().id, 8);
        assert_eq!(doc.next_user_id().unwrap(), 1);
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let mut doc = Document::default();
        let user = doc.insert_user("a@x.com".into(), "hash".into()).unwrap();
        doc.insert_chirp(user.id, "hello".into()).unwrap();
        doc.insert_chirp(user.id, "world".into()).unwrap();
        doc.users.get_mut(&user.id).unwrap().is_chirpy_red = true;

        let decoded = Document::decode(&doc.encode().unwrap()).unwrap();
        assert_eq!(decoded, doc);
        assert_eq!(decoded.user_id_by_email("a@x.com"), Some(1));
    }

    #[test]
    fn keys_are_decimal_strings_on_disk() {
        let mut doc = Document::default();
        doc.insert_chirp(4, "hi".into()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&doc.encode().unwrap()).unwrap();
        assert_eq!(value["chirps"]["1"]["author_id"], 4);
        assert!(value["users"].as_object().unwrap().is_empty());
    }

    #[test]
    fn mismatched_key_is_corrupt() {
        let raw = br#"{"chirps": {"1": {"id": 2, "author_id": 1, "body": "x"}}, "users": {}}"#;
        assert!(matches!(
            Document::decode(raw),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn exhausted_id_space_is_an_error_not_a_wrap() {
        let raw = format!(
            r#"{{"chirps": {{"{max}": {{"id": {max}, "author_id": 1, "body": "last"}}}}, "users": {{}}}}"#,
            max = u64::MAX
        );
        let mut doc = Document::decode(raw.as_bytes()).unwrap();
        assert!(matches!(
            doc.insert_chirp(1, "one more".into()),
            Err(StoreError::Corrupt(_))
        ));
        assert_eq!(doc.chirps.len(), 1);
        // The user id space is untouched.
        assert_eq!(doc.insert_user("a@x.com".into(), "h".into()).unwrap().id, 1);
    }

    #[test]
    fn zero_id_is_corrupt() {
        let raw = br#"{"chirps": {}, "users": {"0": {"id": 0, "email": "a@x.com", "password": "h"}}}"#;
        assert!(matches!(
            Document::decode(raw),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        assert!(matches!(
            Document::decode(b"{\"chirps\": "),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn email_change_moves_index_entry() {
        let mut doc = Document::default();
        doc.insert_user("old@x.com".into(), "h".into()).unwrap();
        doc.set_user_email(1, "new@x.com".into());
        assert_eq!(doc.user_id_by_email("old@x.com"), None);
        assert_eq!(doc.user_id_by_email("new@x.com"), Some(1));
    }
}
