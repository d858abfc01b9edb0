//! Google Calendar v3 adapter

mod client;
pub mod types;

pub use client::{GoogleCalendarClient, GoogleCalendarFactory};
