//! # wishwall-store
//!
//! SQLite storage for the wishwall guestbook.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for wishes, likes
//! and guests. Every write that touches more than one row runs in a single
//! transaction; the one-like-per-guest rule is a UNIQUE index, not a
//! client-side check.

pub mod database;
pub mod guests;
pub mod likes;
pub mod migrations;
pub mod wishes;

mod error;
mod rows;

pub use database::Database;
pub use error::StoreError;
pub use wishwall_shared::{Guest, GuestStatus, Wish, WishLike};
