//! Shared types
//!
//! A [`Server`] is a read-through projection of the Hetzner Cloud API. Nothing
//! here is cached or mutated locally; every command re-reads remote state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown for any missing optional field
pub const NOT_AVAILABLE: &str = "N/A";

/// Render an optional value, substituting [`NOT_AVAILABLE`] when absent
pub fn or_na<T: fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Cloud server as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub status: ServerStatus,
    #[serde(default)]
    pub public_net: PublicNet,
    #[serde(default)]
    pub server_type: Option<ServerType>,
    #[serde(default)]
    pub datacenter: Option<Datacenter>,
}

impl Server {
    /// Create a server with only the identifying fields set
    pub fn new(id: i64, name: impl Into<String>, status: ServerStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            public_net: PublicNet::default(),
            server_type: None,
            datacenter: None,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        self.datacenter.as_ref().and_then(|dc| dc.location.as_ref())
    }
}

/// Server power state
///
/// Unrecognised states are kept verbatim in [`ServerStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    Running,
    Off,
    Starting,
    Stopping,
    Other(String),
}

impl ServerStatus {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Off => "off",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Other(raw) => raw,
        }
    }

    /// Status indicator shown in front of a server line
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Running => "🟢",
            Self::Off => "🔴",
            Self::Starting | Self::Stopping => "🟡",
            Self::Other(_) => "⚪",
        }
    }
}

impl From<String> for ServerStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "running" => Self::Running,
            "off" => Self::Off,
            "starting" => Self::Starting,
            "stopping" => Self::Stopping,
            _ => Self::Other(raw),
        }
    }
}

impl From<ServerStatus> for String {
    fn from(status: ServerStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public network addresses
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PublicNet {
    #[serde(default)]
    pub ipv4: Option<IpAddress>,
    #[serde(default)]
    pub ipv6: Option<IpAddress>,
}

impl PublicNet {
    pub fn ipv4(&self) -> Option<&str> {
        self.ipv4.as_ref().map(|a| a.ip.as_str())
    }

    pub fn ipv6(&self) -> Option<&str> {
        self.ipv6.as_ref().map(|a| a.ip.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpAddress {
    pub ip: String,
}

/// Server type (plan) descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cores: u32,
    /// Memory in GB
    pub memory: f64,
    /// Disk size in GB
    pub disk: u64,
}

impl ServerType {
    /// Human readable hardware summary, e.g. `2 vCPU, 4GB RAM, 40GB Disk`
    pub fn specs(&self) -> String {
        format!(
            "{} vCPU, {}GB RAM, {}GB Disk",
            self.cores, self.memory, self.disk
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Datacenter {
    pub name: String,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub city: String,
    pub country: String,
}

/// `GET /servers` response envelope
#[derive(Debug, Deserialize)]
pub struct ServersResponse {
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl ServersResponse {
    /// Page to request next, if the listing continues
    pub fn next_page(&self) -> Option<u32> {
        self.meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .and_then(|p| p.next_page)
    }
}

/// Listing metadata
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub next_page: Option<u32>,
    pub last_page: Option<u32>,
    pub total_entries: Option<u32>,
}

/// `GET /servers/{id}` response envelope
#[derive(Debug, Deserialize)]
pub struct ServerResponse {
    pub server: Option<Server>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_glyphs() {
        assert_eq!(ServerStatus::Running.glyph(), "🟢");
        assert_eq!(ServerStatus::Off.glyph(), "🔴");
        assert_eq!(ServerStatus::Starting.glyph(), "🟡");
        assert_eq!(ServerStatus::Stopping.glyph(), "🟡");
        assert_eq!(ServerStatus::Other("migrating".into()).glyph(), "⚪");
    }

    #[test]
    fn test_unknown_status_keeps_raw_text() {
        let status = ServerStatus::from("rebuilding".to_string());
        assert_eq!(status, ServerStatus::Other("rebuilding".to_string()));
        assert_eq!(status.to_string(), "rebuilding");
    }

    #[test]
    fn test_or_na() {
        assert_eq!(or_na(Some("1.2.3.4")), "1.2.3.4");
        assert_eq!(or_na(None::<&str>), "N/A");
    }

    #[test]
    fn test_deserialize_full_server() {
        let json = r#"{
            "id": 42,
            "name": "web-01",
            "status": "running",
            "public_net": {
                "ipv4": { "ip": "1.2.3.4", "blocked": false },
                "ipv6": { "ip": "2001:db8::/64", "blocked": false }
            },
            "server_type": {
                "name": "cx22",
                "description": "CX22",
                "cores": 2,
                "memory": 4.0,
                "disk": 40
            },
            "datacenter": {
                "name": "fsn1-dc14",
                "description": "Falkenstein 1 virtual DC 14",
                "location": { "name": "fsn1", "city": "Falkenstein", "country": "DE" }
            },
            "created": "2024-01-01T00:00:00+00:00"
        }"#;

        let server: Server = serde_json::from_str(json).unwrap();
        assert_eq!(server.id, 42);
        assert_eq!(server.status, ServerStatus::Running);
        assert_eq!(server.public_net.ipv4(), Some("1.2.3.4"));
        assert_eq!(server.public_net.ipv6(), Some("2001:db8::/64"));
        assert_eq!(
            server.server_type.as_ref().unwrap().specs(),
            "2 vCPU, 4GB RAM, 40GB Disk"
        );
        assert_eq!(server.location().unwrap().city, "Falkenstein");
    }

    #[test]
    fn test_deserialize_sparse_server() {
        let json = r#"{
            "id": 7,
            "name": "bare",
            "status": "off",
            "public_net": { "ipv4": null, "ipv6": null }
        }"#;

        let server: Server = serde_json::from_str(json).unwrap();
        assert_eq!(server.status, ServerStatus::Off);
        assert!(server.public_net.ipv4().is_none());
        assert!(server.server_type.is_none());
        assert!(server.location().is_none());
    }

    #[test]
    fn test_listing_next_page() {
        let json = r#"{
            "servers": [],
            "meta": { "pagination": { "page": 1, "per_page": 50, "next_page": 2, "last_page": 2 } }
        }"#;
        let body: ServersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.next_page(), Some(2));

        let last: ServersResponse =
            serde_json::from_str(r#"{ "servers": [], "meta": { "pagination": { "next_page": null } } }"#)
                .unwrap();
        assert_eq!(last.next_page(), None);

        let bare: ServersResponse = serde_json::from_str(r#"{ "servers": [] }"#).unwrap();
        assert_eq!(bare.next_page(), None);
    }
}
