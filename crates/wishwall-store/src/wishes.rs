//! CRUD operations for [`Wish`] records.

use chrono::Utc;
use rusqlite::params;

use wishwall_shared::wish::{validate_content, validate_guest_name};
use wishwall_shared::{GuestId, Wish, WishId};

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::rows::{row_to_wish, ts, WISH_COLUMNS};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Validate and insert a guest submission. The stored wish is always
    /// unapproved, whatever the caller passes.
    pub fn submit_wish(
        &self,
        guest_id: &GuestId,
        guest_name: &str,
        content: &str,
        image_url: Option<String>,
    ) -> Result<Wish> {
        validate_content(content)?;
        validate_guest_name(guest_name)?;

        let wish = Wish::pending(guest_id.clone(), guest_name, content, image_url);
        self.insert_wish(&wish)?;

        tracing::debug!(id = %wish.id, guest = %wish.guest_id, "wish stored");
        Ok(wish)
    }

    /// Insert a wish row as-is.
    pub fn insert_wish(&self, wish: &Wish) -> Result<()> {
        self.conn().execute(
            "INSERT INTO wishes (id, guest_id, guest_name, content, image_url,
                                 likes_count, replies_count, is_approved, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                wish.id.to_string(),
                wish.guest_id.as_str(),
                wish.guest_name,
                wish.content,
                wish.image_url,
                wish.likes_count,
                wish.replies_count,
                wish.is_approved as i32,
                ts(wish.created_at),
                ts(wish.updated_at),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_wish(&self, id: WishId) -> Result<Wish> {
        self.conn()
            .query_row(
                &format!("SELECT {WISH_COLUMNS} FROM wishes WHERE id = ?1"),
                params![id.to_string()],
                row_to_wish,
            )
            .map_err(not_found)
    }

    /// Most recent approved wishes, newest first.
    pub fn list_approved_wishes(&self, limit: u32) -> Result<Vec<Wish>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {WISH_COLUMNS}
             FROM wishes
             WHERE is_approved = 1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_wish)?;

        let mut wishes = Vec::new();
        for row in rows {
            wishes.push(row?);
        }
        Ok(wishes)
    }

    /// Every wish regardless of approval, newest first. Host view only.
    pub fn list_all_wishes(&self) -> Result<Vec<Wish>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {WISH_COLUMNS}
             FROM wishes
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map([], row_to_wish)?;

        let mut wishes = Vec::new();
        for row in rows {
            wishes.push(row?);
        }
        Ok(wishes)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Mark a wish approved and return the updated row. Approving an
    /// approved wish leaves it untouched.
    pub fn approve_wish(&self, id: WishId) -> Result<Wish> {
        let affected = self.conn().execute(
            "UPDATE wishes SET is_approved = 1, updated_at = ?2
             WHERE id = ?1 AND is_approved = 0",
            params![id.to_string(), ts(Utc::now())],
        )?;

        let wish = self.get_wish(id)?;
        if affected > 0 {
            tracing::info!(id = %id, "wish approved");
        }
        Ok(wish)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a wish and, through the foreign key, its likes. There is no
    /// soft delete.
    pub fn delete_wish(&self, id: WishId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM wishes WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}
