use super::models::Contact;
use crate::addresses::is_valid_address;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("A contact named {0} already exists")]
    DuplicateName(String),

    #[error("Address {0} is already saved as a contact")]
    DuplicateAddress(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Contact name cannot be empty")]
    EmptyName,

    #[error("Contact {0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub struct ContactRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ContactRepository<'a> {
    const INSERT_CONTACT: &'static str = "INSERT INTO contacts (name, address) VALUES (?1, ?2)";

    const UPDATE_CONTACT: &'static str =
        "UPDATE contacts SET name = ?1, address = ?2 WHERE id = ?3";

    const DELETE_CONTACT: &'static str = "DELETE FROM contacts WHERE name = ?1";

    const SELECT_CONTACTS: &'static str =
        "SELECT id, name, address FROM contacts ORDER BY name COLLATE NOCASE";

    const SELECT_BY_NAME: &'static str =
        "SELECT id, name, address FROM contacts WHERE name = ?1";

    const SELECT_BY_ADDRESS: &'static str =
        "SELECT id, name, address FROM contacts WHERE address = ?1";

    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
        Ok(Contact {
            id: row.get(0)?,
            name: row.get(1)?,
            address: row.get(2)?,
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Contact>, ContactError> {
        let contact = self
            .conn
            .query_row(Self::SELECT_BY_NAME, params![name], Self::row_to_contact)
            .optional()?;
        Ok(contact)
    }

    pub fn find_by_address(&self, address: &str) -> Result<Option<Contact>, ContactError> {
        let contact = self
            .conn
            .query_row(Self::SELECT_BY_ADDRESS, params![address], Self::row_to_contact)
            .optional()?;
        Ok(contact)
    }

    /// Rejects a name or address already used by a contact other than `exclude_id`.
    fn validate(&self, name: &str, address: &str, exclude_id: Option<i64>) -> Result<(), ContactError> {
        if name.is_empty() {
            return Err(ContactError::EmptyName);
        }
        if !is_valid_address(address) {
            return Err(ContactError::InvalidAddress(address.to_string()));
        }
        if let Some(existing) = self.find_by_name(name)? {
            if Some(existing.id) != exclude_id {
                return Err(ContactError::DuplicateName(existing.name));
            }
        }
        if let Some(existing) = self.find_by_address(address)? {
            if Some(existing.id) != exclude_id {
                return Err(ContactError::DuplicateAddress(address.to_string()));
            }
        }
        Ok(())
    }

    pub fn insert(&self, name: &str, address: &str) -> Result<Contact, ContactError> {
        let name = name.trim();
        let address = address.trim();
        self.validate(name, address, None)?;

        self.conn.execute(Self::INSERT_CONTACT, params![name, address])?;
        info!("Saved contact {}", name);
        Ok(Contact {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            address: address.to_string(),
        })
    }

    pub fn list(&self) -> Result<Vec<Contact>, ContactError> {
        let mut stmt = self.conn.prepare(Self::SELECT_CONTACTS)?;
        let contacts = stmt
            .query_map([], Self::row_to_contact)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }

    pub fn update(&self, id: i64, name: &str, address: &str) -> Result<Contact, ContactError> {
        let name = name.trim();
        let address = address.trim();
        self.validate(name, address, Some(id))?;

        let updated = self
            .conn
            .execute(Self::UPDATE_CONTACT, params![name, address, id])?;
        if updated == 0 {
            return Err(ContactError::NotFound(id.to_string()));
        }
        Ok(Contact {
            id,
            name: name.to_string(),
            address: address.to_string(),
        })
    }

    pub fn delete(&self, name: &str) -> Result<(), ContactError> {
        let removed = self.conn.execute(Self::DELETE_CONTACT, params![name.trim()])?;
        if removed == 0 {
            return Err(ContactError::NotFound(name.to_string()));
        }
        info!("Removed contact {}", name);
        Ok(())
    }
}
