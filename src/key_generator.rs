//! Identifier extraction for rate limiting.

use crate::error::ThrottlerError;
use std::net::SocketAddr;

/// Derives the per-client identifier the limiters key on.
pub struct KeyGenerator;

impl KeyGenerator {
    /// Identifier for a connected peer: its host, without the port.
    pub fn from_peer(peer: &SocketAddr) -> String {
        peer.ip().to_string()
    }

    /// Identifier from a textual `host:port` peer address.
    ///
    /// The address is split at its last `:`, so bracketed IPv6 peers such as
    /// `[::1]:8080` yield `::1`.
    pub fn from_remote_addr(remote_addr: &str) -> Result<String, ThrottlerError> {
        let (host, _port) = remote_addr.rsplit_once(':').ok_or_else(|| {
            ThrottlerError::InvalidIdentifier(format!("malformed client address '{}'", remote_addr))
        })?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(ThrottlerError::InvalidIdentifier(format!(
                "client address '{}' has no host",
                remote_addr
            )));
        }

        Ok(host.to_string())
    }
}
