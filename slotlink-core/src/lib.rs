//! Core of slotlink: shareable scheduling links.
//!
//! An organiser marks free slots on a weekly grid ([`organizer`]); the
//! selection becomes a [`SchedulingPayload`] that travels inside a link
//! ([`codec`]) or lives in a [`store`]. An attendee sees the slots in
//! their own timezone ([`presenter`]), picks one, and [`booking`] turns
//! that into an invite and confirmation mails ([`invite`], [`mail`]).

pub mod booking;
pub mod calendar_week;
pub mod codec;
pub mod config;
pub mod error;
pub mod invite;
pub mod local_time;
pub mod mail;
pub mod organizer;
pub mod payload;
pub mod presenter;
pub mod selection;
pub mod store;
pub mod time_grid;
pub mod validation;

pub use error::{SlotLinkError, SlotLinkResult};
pub use local_time::LocalSlotKey;
pub use payload::{MeetingDuration, SchedulingPayload};
