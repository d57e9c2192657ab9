//! # Bar Bot
//!
//! A Telegram bot for a food and drink venue: language choice, menu browsing
//! backed by an exported spreadsheet catalog, and a complaints channel
//! relayed to an admin chat.

pub mod bot;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod images;
pub mod localization;
pub mod session;
