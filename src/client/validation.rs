//! Endpoint validation
//!
//! User-supplied host and port text is checked before any connection attempt.
//! Only strict dotted-quad IPv4 addresses are accepted: no host names, no
//! IPv6, no shorthand forms such as `10.1`.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static IPV4_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .expect("IPv4 pattern is a valid regex")
});

/// Rejected endpoint input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Host or port field left empty
    #[error("Please enter IP and port")]
    MissingField,

    /// Host is not a dotted-quad IPv4 address
    #[error("IP format error")]
    InvalidIp(String),

    /// Port parsed but outside 1..=65535
    #[error("port out of range")]
    PortOutOfRange(i64),

    /// Port is not an integer
    #[error("port error")]
    InvalidPort(String),
}

/// Validated receiver address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Receiver IPv4 address
    pub ip: Ipv4Addr,
    /// Receiver TCP port
    pub port: u16,
}

impl Endpoint {
    /// Endpoint from already-validated parts
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Socket address to connect to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// True when `ip` is a strict dotted-quad IPv4 address (octets 0-255)
pub fn is_valid_ip(ip: &str) -> bool {
    IPV4_PATTERN.is_match(ip)
}

/// Validate an IPv4 address string
pub fn validate_ip(ip: &str) -> Result<Ipv4Addr, ValidationError> {
    if !is_valid_ip(ip) {
        return Err(ValidationError::InvalidIp(ip.to_string()));
    }
    // The pattern admits leading zeros ("010"), which Ipv4Addr's parser
    // refuses, so build the address from the octets directly.
    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(ip.split('.')) {
        *slot = part
            .parse::<u8>()
            .map_err(|_| ValidationError::InvalidIp(ip.to_string()))?;
    }
    Ok(Ipv4Addr::from(octets))
}

/// Validate a port string (1..=65535)
pub fn validate_port(port: &str) -> Result<u16, ValidationError> {
    let value: i64 = port
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidPort(port.to_string()))?;

    if !(1..=65535).contains(&value) {
        return Err(ValidationError::PortOutOfRange(value));
    }
    Ok(value as u16)
}

/// Validate host and port fields as entered by the user
///
/// Fields are trimmed first; either one empty yields
/// [`ValidationError::MissingField`].
pub fn parse_endpoint(ip: &str, port: &str) -> Result<Endpoint, ValidationError> {
    let ip = ip.trim();
    let port = port.trim();

    if ip.is_empty() || port.is_empty() {
        return Err(ValidationError::MissingField);
    }

    Ok(Endpoint::new(validate_ip(ip)?, validate_port(port)?))
}
