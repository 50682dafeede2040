//! CRUD operations for [`Guest`] records.

use chrono::Utc;
use rusqlite::params;

use wishwall_shared::wish::validate_guest_name;
use wishwall_shared::{Guest, GuestId, GuestStatus};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::rows::{parse_guest_id, parse_ts, ts};

impl Database {
    /// Register a guest, or update the name and mobile of an existing one.
    /// The RSVP status is kept on update.
    pub fn upsert_guest(&self, id: &GuestId, name: &str, mobile: Option<&str>) -> Result<Guest> {
        validate_guest_name(name)?;
        let now = ts(Utc::now());

        self.conn().execute(
            "INSERT INTO guests (id, name, mobile, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'pending', ?4, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 mobile = excluded.mobile,
                 updated_at = excluded.updated_at",
            params![id.as_str(), name.trim(), mobile, now],
        )?;

        self.get_guest(id)
    }

    pub fn get_guest(&self, id: &GuestId) -> Result<Guest> {
        self.conn()
            .query_row(
                "SELECT id, name, mobile, status, created_at, updated_at
                 FROM guests WHERE id = ?1",
                params![id.as_str()],
                row_to_guest,
            )
            .map_err(not_found)
    }

    pub fn set_guest_status(&self, id: &GuestId, status: GuestStatus) -> Result<Guest> {
        let affected = self.conn().execute(
            "UPDATE guests SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.as_str(), status.as_str(), ts(Utc::now())],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_guest(id)
    }
}

fn row_to_guest(row: &rusqlite::Row<'_>) -> rusqlite::Result<Guest> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let mobile: Option<String> = row.get(2)?;
    let status: String = row.get(3)?;
    let created_str: String = row.get(4)?;
    let updated_str: String = row.get(5)?;

    Ok(Guest {
        id: parse_guest_id(0, &id_str)?,
        name,
        mobile,
        status: GuestStatus::from_str_lossy(&status),
        created_at: parse_ts(4, &created_str)?,
        updated_at: parse_ts(5, &updated_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_accept() {
        let db = Database::open_in_memory().unwrap();
        let id = GuestId::parse("g1").unwrap();

        let guest = db.upsert_guest(&id, "Alice", Some("+91 98765 43210")).unwrap();
        assert_eq!(guest.name, "Alice");
        assert_eq!(guest.status, GuestStatus::Pending);

        let accepted = db.set_guest_status(&id, GuestStatus::Accepted).unwrap();
        assert!(accepted.has_accepted());

        // Renaming keeps the RSVP.
        let renamed = db.upsert_guest(&id, "Alice Sharma", None).unwrap();
        assert_eq!(renamed.name, "Alice Sharma");
        assert_eq!(renamed.mobile, None);
        assert!(renamed.has_accepted());
    }

    #[test]
    fn unknown_guest_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = GuestId::parse("nobody").unwrap();
        assert!(matches!(db.get_guest(&id), Err(StoreError::NotFound)));
        assert!(matches!(
            db.set_guest_status(&id, GuestStatus::Accepted),
            Err(StoreError::NotFound)
        ));
    }
}
