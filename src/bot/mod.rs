//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `input`: Inbound events and their classification
//! - `controller`: The conversation state machine
//! - `ui_builder`: Reply keyboards for every screen
//! - `transport`: Outbound send operations
//! - `message_handler`: The teloxide dispatcher endpoint

pub mod controller;
pub mod input;
pub mod message_handler;
pub mod transport;
pub mod ui_builder;

pub use controller::{ControllerSettings, ConversationController};
pub use input::{Command, IncomingMessage, Input};
pub use message_handler::message_handler;
pub use transport::{ChatTransport, TelegramTransport, TextFormat};
pub use ui_builder::Keyboard;
