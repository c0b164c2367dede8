use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::state::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: invalid IPv4 address for {key}: {value:?}")]
    InvalidAddress {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: invalid port for {key}: {value:?} (expected 1-65535)")]
    InvalidPort {
        line: usize,
        key: String,
        value: String,
    },
    #[error("line {line}: invalid player id {value:?} (expected 1 or 2)")]
    InvalidPlayer { line: usize, value: String },
    #[error("missing required key {0}")]
    MissingKey(&'static str),
}

/// Where this instance listens and where its peer listens. Loaded once and
/// reused verbatim for every (re)connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub local_bind_address: Ipv4Addr,
    pub local_port: u16,
    pub peer_address: SocketAddrV4,
    pub player: PlayerId,
}

impl ConnectionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn local_address(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.local_bind_address, self.local_port))
    }

    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = player;
        self
    }
}

impl FromStr for ConnectionConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut host_ip = None;
        let mut host_port = None;
        let mut client_ip = None;
        let mut client_port = None;
        let mut player = PlayerId::One;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let Some((key, value)) = split_entry(raw) else {
                continue;
            };

            match key.to_ascii_lowercase().as_str() {
                "host_ip" | "hostip" => host_ip = Some(parse_ip(line, key, value)?),
                "host_port" | "hostport" => host_port = Some(parse_port(line, key, value)?),
                "client_ip" | "clientip" => client_ip = Some(parse_ip(line, key, value)?),
                "client_port" | "clientport" => client_port = Some(parse_port(line, key, value)?),
                "player_id" | "playerid" => {
                    player = value
                        .parse::<i64>()
                        .ok()
                        .and_then(PlayerId::from_number)
                        .ok_or_else(|| ConfigError::InvalidPlayer {
                            line,
                            value: value.to_string(),
                        })?;
                }
                _ => {}
            }
        }

        Ok(Self {
            local_bind_address: host_ip.ok_or(ConfigError::MissingKey("host_ip"))?,
            local_port: host_port.ok_or(ConfigError::MissingKey("host_port"))?,
            peer_address: SocketAddrV4::new(
                client_ip.ok_or(ConfigError::MissingKey("client_ip"))?,
                client_port.ok_or(ConfigError::MissingKey("client_port"))?,
            ),
            player,
        })
    }
}

/// `key = value`, skipping blanks, `#` comments and lines without a value.
fn split_entry(raw: &str) -> Option<(&str, &str)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

fn parse_ip(line: usize, key: &str, value: &str) -> Result<Ipv4Addr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        line,
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_port(line: usize, key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .ok()
        .filter(|&port| port >= 1)
        .ok_or_else(|| ConfigError::InvalidPort {
            line,
            key: key.to_string(),
            value: value.to_string(),
        })
}
