//! Where the benchmark connects to or listens on.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::{DEFAULT_BIND_IP, DEFAULT_PORT, DEFAULT_SERVER_IP};

/// Stream endpoint.
///
/// Parsed from `tcp:IP:PORT` (or plain `IP:PORT`), `unix:PATH` or
/// `vsock:CID:PORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// TCP socket address.
    Tcp(SocketAddr),
    /// Unix domain socket path.
    Unix(PathBuf),
    /// AF_VSOCK context id and port.
    Vsock {
        /// Context id.
        cid: u32,
        /// Port.
        port: u32,
    },
}

impl Target {
    /// `127.0.0.1:5001`.
    pub fn default_client() -> Self {
        Target::Tcp(SocketAddr::new(IpAddr::V4(DEFAULT_SERVER_IP), DEFAULT_PORT))
    }

    /// `0.0.0.0:5001`.
    pub fn default_server() -> Self {
        Target::Tcp(SocketAddr::new(IpAddr::V4(DEFAULT_BIND_IP), DEFAULT_PORT))
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidTarget(s.to_string());

        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Target::Unix(PathBuf::from(path)));
        }

        if let Some(rest) = s.strip_prefix("vsock:") {
            let (cid, port) = rest.split_once(':').ok_or_else(invalid)?;
            let cid = cid.parse().map_err(|_| invalid())?;
            let port = port.parse().map_err(|_| invalid())?;
            return Ok(Target::Vsock { cid, port });
        }

        let addr = s.strip_prefix("tcp:").unwrap_or(s);
        addr.parse().map(Target::Tcp).map_err(|_| invalid())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tcp(addr) => write!(f, "tcp:{}", addr),
            Target::Unix(path) => write!(f, "unix:{}", path.display()),
            Target::Vsock { cid, port } => write!(f, "vsock:{}:{}", cid, port),
        }
    }
}
