//! Core library for relayctl
//!
//! This crate defines the server model, the Hetzner Cloud directory client,
//! the command interpreter and the outbound messaging transport used by the
//! webhook service and the operator CLI.

pub mod commands;
pub mod error;
pub mod hetzner;
pub mod messaging;
pub mod types;

// Re-exports
pub use commands::{Command, CommandHandler, Verb, HELP_MESSAGE};
pub use error::{Error, Result};
pub use hetzner::{HetznerClient, HetznerConfig, ServerAction, ServerDirectory};
pub use messaging::{mask_address, whatsapp_address, MessageSender, TwilioConfig, TwilioWhatsApp};
pub use types::{Datacenter, IpAddress, Location, PublicNet, Server, ServerStatus, ServerType};
