use chirp_types::models::{Chirp, User};

use crate::error::{Result, StoreError};
use crate::Database;

/// Partial update of a user's credentials. `None` leaves a field as is.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl Database {
    // -- Chirps --

    pub fn create_chirp(&self, author_id: u64, body: &str) -> Result<Chirp> {
        self.with_doc_mut(|doc| doc.insert_chirp(author_id, body.to_string()))
    }

    /// All chirps, ascending by id.
    pub fn list_chirps(&self) -> Result<Vec<Chirp>> {
        self.with_doc(|doc| Ok(doc.chirps.values().cloned().collect()))
    }

    pub fn get_chirp(&self, id: u64) -> Result<Chirp> {
        self.with_doc(|doc| {
            doc.chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("chirp", id))
        })
    }

    // -- Users --

    /// Does not check email uniqueness; callers must look the email up first.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        self.with_doc_mut(|doc| doc.insert_user(email.to_string(), password_hash.to_string()))
    }

    pub fn get_user(&self, id: u64) -> Result<User> {
        self.with_doc(|doc| {
            doc.users
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("user", id))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.with_doc(|doc| {
            doc.user_id_by_email(email)
                .and_then(|id| doc.users.get(&id))
                .cloned()
                .ok_or_else(|| StoreError::not_found("user", email))
        })
    }

    pub fn update_user(&self, id: u64, update: UserUpdate) -> Result<User> {
        self.with_doc_mut(|doc| {
            if !doc.users.contains_key(&id) {
                return Err(StoreError::not_found("user", id));
            }
            if let Some(email) = update.email {
                doc.set_user_email(id, email);
            }
            let user = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("user", id))?;
            if let Some(hash) = update.password_hash {
                user.password = hash;
            }
            Ok(user.clone())
        })
    }

    /// Set the Chirpy Red flag. Applying the same value twice is a no-op
    /// that still succeeds.
    pub fn set_chirpy_red(&self, id: u64, value: bool) -> Result<()> {
        self.with_doc_mut(|doc| {
            let user = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("user", id))?;
            user.is_chirpy_red = value;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("database.json")).unwrap();
        (dir, db)
    }

    #[test]
    fn open_bootstraps_empty_document() {
        let (dir, db) = open_temp();
        assert!(dir.path().join("database.json").exists());
        assert!(db.list_chirps().unwrap().is_empty());
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("db.json");
        Database::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn reopen_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        {
            let db = Database::open(&path).unwrap();
            db.create_user("a@x.com", "hash").unwrap();
            db.create_chirp(1, "persisted").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_chirp(1).unwrap().body, "persisted");
        assert_eq!(db.get_user_by_email("a@x.com").unwrap().id, 1);
    }

    #[test]
    fn chirp_and_user_ids_are_independent() {
        let (_dir, db) = open_temp();
        assert_eq!(db.create_user("a@x.com", "h").unwrap().id, 1);
        assert_eq!(db.create_chirp(1, "first").unwrap().id, 1);
        assert_eq!(db.create_chirp(1, "second").unwrap().id, 2);
        assert_eq!(db.create_user("b@x.com", "h").unwrap().id, 2);
    }

    #[test]
    fn missing_records_are_not_found() {
        let (_dir, db) = open_temp();
        assert!(db.get_chirp(9).unwrap_err().is_not_found());
        assert!(db.get_user(9).unwrap_err().is_not_found());
        assert!(db.get_user_by_email("nobody@x.com").unwrap_err().is_not_found());
        assert!(db.update_user(9, UserUpdate::default()).unwrap_err().is_not_found());
        assert!(db.set_chirpy_red(9, true).unwrap_err().is_not_found());
    }

    #[test]
    fn email_lookup_is_case_sensitive() {
        let (_dir, db) = open_temp();
        db.create_user("A@x.com", "h").unwrap();
        assert!(db.get_user_by_email("a@x.com").unwrap_err().is_not_found());
    }

    #[test]
    fn partial_update_keeps_untouched_fields() {
        let (_dir, db) = open_temp();
        db.create_user("a@x.com", "old-hash").unwrap();

        let user = db
            .update_user(
                1,
                UserUpdate {
                    email: Some("b@x.com".into()),
                    password_hash: None,
                },
            )
            .unwrap();
        assert_eq!(user.email, "b@x.com");
        assert_eq!(user.password, "old-hash");

        let user = db
            .update_user(
                1,
                UserUpdate {
                    email: None,
                    password_hash: Some("new-hash".into()),
                },
            )
            .unwrap();
        assert_eq!(user.email, "b@x.com");
        assert_eq!(user.password, "new-hash");
        assert_eq!(db.get_user_by_email("b@x.com").unwrap().id, 1);
        assert!(db.get_user_by_email("a@x.com").is_err());
    }

    #[test]
    fn chirpy_red_is_idempotent() {
        let (_dir, db) = open_temp();
        db.create_user("a@x.com", "h").unwrap();
        db.set_chirpy_red(1, true).unwrap();
        db.set_chirpy_red(1, true).unwrap();
        assert!(db.get_user(1).unwrap().is_chirpy_red);
    }

    #[test]
    fn failed_mutation_leaves_file_untouched() {
        let (dir, db) = open_temp();
        db.create_chirp(1, "keep").unwrap();
        let before = std::fs::read(dir.path().join("database.json")).unwrap();
        db.set_chirpy_red(42, true).unwrap_err();
        let after = std::fs::read(dir.path().join("database.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn reset_empties_everything() {
        let (_dir, db) = open_temp();
        db.create_user("a@x.com", "h").unwrap();
        db.create_chirp(1, "gone").unwrap();
        db.reset().unwrap();
        assert!(db.list_chirps().unwrap().is_empty());
        assert_eq!(db.create_chirp(1, "fresh").unwrap().id, 1);
    }

    #[test]
    fn exhausted_id_space_does_not_poison_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        let max = u64::MAX;
        std::fs::write(
            &path,
            format!(r#"{{"chirps": {{"{max}": {{"id": {max}, "author_id": 1, "body": "last"}}}}, "users": {{}}}}"#),
        )
        .unwrap();
        let db = Database::open(&path).unwrap();

        assert!(matches!(db.create_chirp(1, "overflow"), Err(StoreError::Corrupt(_))));
        assert!(matches!(db.create_chirp(1, "again"), Err(StoreError::Corrupt(_))));
        // Reads and other mutations still work afterwards.
        assert_eq!(db.list_chirps().unwrap().len(), 1);
        assert_eq!(db.create_user("a@x.com", "h").unwrap().id, 1);
    }

    #[test]
    fn corrupt_file_is_reported_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            Database::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
