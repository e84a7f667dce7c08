//! Confab: the message pipeline of a single-user conversational front end.
//!
//! User text and files go out to a generative backend; replies come back as
//! structured rich text, with optional dictation and read-aloud.
//!
//! # Architecture
//!
//! - **Attachments** ([`attachment`]): allow-list validation, base64
//!   encoding, preview references.
//! - **Markup** ([`markup`]): reply text to [`markup::RichText`], with code
//!   content preserved byte for byte.
//! - **Speech** ([`speech`]): dictation and playback state machines over
//!   pluggable backends.
//! - **Conversation** ([`conversation`]): the `Idle`/`Sending` orchestrator
//!   and the session actor that owns all state.
//! - **Gateway** ([`gateway`]): the backend seam and its Gemini REST client.
//! - **Host** ([`host`]): JSON-lines bridge for native shells.

pub mod attachment;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod host;
pub mod markup;
pub mod speech;

pub use config::ChatConfig;
pub use conversation::{SessionClient, SessionEvent, SessionServer, session_channel};
pub use error::{ChatError, Result};
