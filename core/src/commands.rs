//! Command interpretation
//!
//! Turns a free-text chat message such as `start web-01` into a typed
//! [`Command`], runs it against a [`ServerDirectory`] and formats the reply.
//! Every path produces a reply string; failures become user-facing text.

use tracing::{error, info, instrument};

use crate::hetzner::ServerDirectory;
use crate::types::{or_na, Server, ServerStatus};

/// Help text listing every supported command
pub const HELP_MESSAGE: &str = "*Hetzner Cloud Manager*

Available commands:

*list* - List all servers
*status <name|id>* - Get server status
*start <name|id>* - Power on server
*stop <name|id>* - Force power off
*shutdown <name|id>* - Graceful shutdown
*reboot <name|id>* - Reboot server
*help* - Show this message";

const LIST_FAILED: &str = "Failed to retrieve servers. Please try again later.";

/// Command verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Help,
    List,
    Status,
    PowerOn,
    PowerOff,
    Shutdown,
    Reboot,
    /// Unrecognised verb, kept for echoing back
    Unknown(String),
}

impl Verb {
    /// Parse an already lowercased token
    pub fn parse(token: &str) -> Self {
        match token {
            "help" => Self::Help,
            "list" | "servers" => Self::List,
            "status" => Self::Status,
            "start" | "poweron" => Self::PowerOn,
            "stop" | "poweroff" => Self::PowerOff,
            "shutdown" => Self::Shutdown,
            "reboot" => Self::Reboot,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical name used in usage messages
    pub fn name(&self) -> &str {
        match self {
            Self::Help => "help",
            Self::List => "list",
            Self::Status => "status",
            Self::PowerOn => "start",
            Self::PowerOff => "stop",
            Self::Shutdown => "shutdown",
            Self::Reboot => "reboot",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub target: Option<String>,
}

impl Command {
    /// Normalize and split a raw message
    ///
    /// Input is trimmed and lowercased; empty input is `help`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let mut tokens = normalized.split_whitespace();

        let verb = tokens.next().map(Verb::parse).unwrap_or(Verb::Help);
        let target = tokens.next().map(str::to_string);

        Self { verb, target }
    }
}

/// Runs chat commands against a server directory
pub struct CommandHandler<D> {
    directory: D,
}

impl<D: ServerDirectory> CommandHandler<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Interpret a raw message and produce the reply text
    #[instrument(skip(self))]
    pub async fn handle(&self, raw: &str) -> String {
        let command = Command::parse(raw);
        info!(verb = %command.verb.name(), target = ?command.target, "Handling command");

        let target = command.target.as_deref();
        match &command.verb {
            Verb::Help => HELP_MESSAGE.to_string(),
            Verb::List => self.list_servers().await,
            Verb::Status => self.status(target).await,
            Verb::PowerOn => self.power_on(target).await,
            Verb::PowerOff => self.power_off(target).await,
            Verb::Shutdown => self.shutdown(target).await,
            Verb::Reboot => self.reboot(target).await,
            Verb::Unknown(verb) => format!("Unknown command: {}\n\n{}", verb, HELP_MESSAGE),
        }
    }

    async fn list_servers(&self) -> String {
        match self.directory.list_servers().await {
            Ok(servers) => format_server_list(&servers),
            Err(e) => {
                error!(error = %e, "Failed to list servers");
                LIST_FAILED.to_string()
            }
        }
    }

    /// Resolve the target token by id when numeric, otherwise by name
    ///
    /// `Err` carries the reply to send instead of running the command.
    async fn resolve(&self, verb: Verb, target: Option<&str>) -> Result<Server, String> {
        let Some(token) = target else {
            return Err(format!("Usage: {} <server-name or id>", verb.name()));
        };

        let lookup = match token.parse::<i64>() {
            Ok(id) => self.directory.get_server(id).await,
            Err(_) => self.directory.get_server_by_name(token).await,
        };

        match lookup {
            Ok(Some(server)) => Ok(server),
            Ok(None) => Err(not_found(token)),
            Err(e) => {
                error!(token = %token, error = %e, "Server lookup failed");
                Err(not_found(token))
            }
        }
    }

    async fn status(&self, target: Option<&str>) -> String {
        match self.resolve(Verb::Status, target).await {
            Ok(server) => format_server_details(&server),
            Err(reply) => reply,
        }
    }

    async fn power_on(&self, target: Option<&str>) -> String {
        let server = match self.resolve(Verb::PowerOn, target).await {
            Ok(server) => server,
            Err(reply) => return reply,
        };

        if server.status == ServerStatus::Running {
            return format!("Server *{}* is already running.", server.name);
        }

        if self.directory.power_on(server.id).await {
            format!("Starting server *{}*... This may take a moment.", server.name)
        } else {
            format!("Failed to start server *{}*. Please try again.", server.name)
        }
    }

    async fn power_off(&self, target: Option<&str>) -> String {
        let server = match self.resolve(Verb::PowerOff, target).await {
            Ok(server) => server,
            Err(reply) => return reply,
        };

        if server.status == ServerStatus::Off {
            return already_off(&server);
        }

        if self.directory.power_off(server.id).await {
            format!("Forcing power off for *{}*...", server.name)
        } else {
            format!("Failed to stop server *{}*. Please try again.", server.name)
        }
    }

    async fn shutdown(&self, target: Option<&str>) -> String {
        let server = match self.resolve(Verb::Shutdown, target).await {
            Ok(server) => server,
            Err(reply) => return reply,
        };

        if server.status == ServerStatus::Off {
            return already_off(&server);
        }

        if self.directory.shutdown(server.id).await {
            format!("Gracefully shutting down *{}*...", server.name)
        } else {
            format!("Failed to shutdown server *{}*. Please try again.", server.name)
        }
    }

    async fn reboot(&self, target: Option<&str>) -> String {
        let server = match self.resolve(Verb::Reboot, target).await {
            Ok(server) => server,
            Err(reply) => return reply,
        };

        if self.directory.reboot(server.id).await {
            format!("Rebooting *{}*...", server.name)
        } else {
            format!("Failed to reboot server *{}*. Please try again.", server.name)
        }
    }
}

fn not_found(token: &str) -> String {
    format!("Server '{}' not found.", token)
}

fn already_off(server: &Server) -> String {
    format!("Server *{}* is already off.", server.name)
}

/// Format the server overview returned by `list`
pub fn format_server_list(servers: &[Server]) -> String {
    if servers.is_empty() {
        return "No servers found.".to_string();
    }

    let mut out = String::from("*Your Servers:*\n\n");
    for server in servers {
        out.push_str(&format!(
            "{} *{}* (ID: {})\n",
            server.status.glyph(),
            server.name,
            server.id
        ));
        out.push_str(&format!("   Status: {}\n", server.status));
        out.push_str(&format!("   IP: {}\n", or_na(server.public_net.ipv4())));
        out.push_str(&format!(
            "   Type: {}\n",
            or_na(server.server_type.as_ref().map(|t| &t.name))
        ));
        out.push_str(&format!(
            "   Location: {}\n",
            or_na(server.location().map(|l| &l.city))
        ));
        out.push('\n');
    }

    out
}

/// Format the detail view returned by `status`
pub fn format_server_details(server: &Server) -> String {
    let location = server.location();

    format!(
        "{} *{}*\n\n\
         *Status:* {}\n\
         *ID:* {}\n\
         *IPv4:* {}\n\
         *IPv6:* {}\n\
         *Type:* {}\n\
         *Specs:* {}\n\
         *Location:* {}, {}",
        server.status.glyph(),
        server.name,
        server.status,
        server.id,
        or_na(server.public_net.ipv4()),
        or_na(server.public_net.ipv6()),
        or_na(server.server_type.as_ref().map(|t| &t.name)),
        or_na(server.server_type.as_ref().map(|t| t.specs())),
        or_na(location.map(|l| &l.city)),
        or_na(location.map(|l| &l.country)),
    )
}
