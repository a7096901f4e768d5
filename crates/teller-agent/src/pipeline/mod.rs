//! Query policy shared by every entry point (webhook, unified endpoint,
//! legacy endpoints).
//!
//! Channel and HTTP code only turns audio into text and back; everything
//! between the user's words and the reply text happens in
//! `Assistant::process_query`.

pub mod process;

pub use process::{is_greeting, Assistant};
