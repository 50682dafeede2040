//! Likes on approved wishes.
//!
//! The check and the write happen in one immediate transaction and the
//! `(wish_id, guest_id)` pair is a UNIQUE index, so concurrent requests from
//! the same guest can neither double-insert nor double-delete. The cached
//! `wishes.likes_count` is recomputed from the like rows in the same
//! transaction.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use wishwall_shared::protocol::LikeState;
use wishwall_shared::wish::validate_guest_name;
use wishwall_shared::{GuestId, WishId, WishLike};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::rows::{parse_guest_id, parse_ts, parse_uuid, ts};

impl Database {
    /// Flip the like of `guest_id` on a wish and return the new state.
    pub fn toggle_like(
        &mut self,
        wish_id: WishId,
        guest_id: &GuestId,
        guest_name: &str,
    ) -> Result<LikeState> {
        validate_guest_name(guest_name)?;

        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_likeable(&tx, wish_id)?;

        let removed = delete_like(&tx, wish_id, guest_id)?;
        if !removed {
            insert_like(&tx, wish_id, guest_id, guest_name)?;
        }
        let likes_count = refresh_likes_count(&tx, wish_id)?;
        tx.commit()?;

        tracing::debug!(wish = %wish_id, guest = %guest_id, liked = !removed, likes_count, "like toggled");

        Ok(LikeState {
            wish_id,
            liked: !removed,
            likes_count,
        })
    }

    /// Idempotently set whether `guest_id` likes a wish.
    pub fn set_like(
        &mut self,
        wish_id: WishId,
        guest_id: &GuestId,
        guest_name: &str,
        liked: bool,
    ) -> Result<LikeState> {
        validate_guest_name(guest_name)?;

        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_likeable(&tx, wish_id)?;

        if liked {
            insert_like(&tx, wish_id, guest_id, guest_name)?;
        } else {
            delete_like(&tx, wish_id, guest_id)?;
        }
        let likes_count = refresh_likes_count(&tx, wish_id)?;
        tx.commit()?;

        Ok(LikeState {
            wish_id,
            liked,
            likes_count,
        })
    }

    pub fn has_liked(&self, wish_id: WishId, guest_id: &GuestId) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM wish_likes WHERE wish_id = ?1 AND guest_id = ?2",
                params![wish_id.to_string(), guest_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_likes_for_wish(&self, wish_id: WishId) -> Result<Vec<WishLike>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, wish_id, guest_id, guest_name, created_at
             FROM wish_likes WHERE wish_id = ?1 ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![wish_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            let wish_str: String = row.get(1)?;
            let guest_str: String = row.get(2)?;
            let guest_name: String = row.get(3)?;
            let ts_str: String = row.get(4)?;

            Ok(WishLike {
                id: parse_uuid(0, &id_str)?,
                wish_id: WishId(parse_uuid(1, &wish_str)?),
                guest_id: parse_guest_id(2, &guest_str)?,
                guest_name,
                created_at: parse_ts(4, &ts_str)?,
            })
        })?;

        let mut likes = Vec::new();
        for row in rows {
            likes.push(row?);
        }
        Ok(likes)
    }
}

/// Only approved wishes can be liked; pending ones are invisible to guests.
fn ensure_likeable(conn: &Connection, wish_id: WishId) -> Result<()> {
    let approved: Option<i32> = conn
        .query_row(
            "SELECT is_approved FROM wishes WHERE id = ?1",
            params![wish_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match approved {
        Some(flag) if flag != 0 => Ok(()),
        _ => Err(StoreError::NotFound),
    }
}

fn insert_like(conn: &Connection, wish_id: WishId, guest_id: &GuestId, guest_name: &str) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO wish_likes (id, wish_id, guest_id, guest_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Uuid::new_v4().to_string(),
            wish_id.to_string(),
            guest_id.as_str(),
            guest_name.trim(),
            ts(Utc::now()),
        ],
    )?;
    Ok(affected > 0)
}

fn delete_like(conn: &Connection, wish_id: WishId, guest_id: &GuestId) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM wish_likes WHERE wish_id = ?1 AND guest_id = ?2",
        params![wish_id.to_string(), guest_id.as_str()],
    )?;
    Ok(affected > 0)
}

fn refresh_likes_count(conn: &Connection, wish_id: WishId) -> Result<u32> {
    conn.execute(
        "UPDATE wishes
         SET likes_count = (SELECT COUNT(*) FROM wish_likes WHERE wish_id = ?1),
             updated_at = ?2
         WHERE id = ?1",
        params![wish_id.to_string(), ts(Utc::now())],
    )?;
    let count: u32 = conn.query_row(
        "SELECT likes_count FROM wishes WHERE id = ?1",
        params![wish_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}
