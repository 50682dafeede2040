//! Column encoding shared by the CRUD modules.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

use wishwall_shared::{GuestId, Wish, WishId};

/// Column list matching [`row_to_wish`].
pub(crate) const WISH_COLUMNS: &str = "id, guest_id, guest_name, content, image_url, \
     likes_count, replies_count, is_approved, created_at, updated_at";

/// Fixed-width UTC timestamps so `ORDER BY created_at` sorts chronologically.
pub(crate) fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(idx, e))
}

pub(crate) fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| conversion(idx, e))
}

pub(crate) fn parse_guest_id(idx: usize, s: &str) -> rusqlite::Result<GuestId> {
    GuestId::parse(s).map_err(|e| conversion(idx, e))
}

pub(crate) fn row_to_wish(row: &rusqlite::Row<'_>) -> rusqlite::Result<Wish> {
    let id_str: String = row.get(0)?;
    let guest_str: String = row.get(1)?;
    let guest_name: String = row.get(2)?;
    let content: String = row.get(3)?;
    let image_url: Option<String> = row.get(4)?;
    let likes_count: u32 = row.get(5)?;
    let replies_count: u32 = row.get(6)?;
    let is_approved_int: i32 = row.get(7)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;

    Ok(Wish {
        id: WishId(parse_uuid(0, &id_str)?),
        guest_id: parse_guest_id(1, &guest_str)?,
        guest_name,
        content,
        image_url,
        likes_count,
        replies_count,
        is_approved: is_approved_int != 0,
        created_at: parse_ts(8, &created_str)?,
        updated_at: parse_ts(9, &updated_str)?,
    })
}
