use std::io;
use std::net::TcpStream;
use std::os::unix::net::UnixStream;

use log::info;
use vsock::{VsockAddr, VsockStream};
use xbench::{sender, Error, Result, SendReport, Target, TransferConfig};

pub struct TransClient {
    target: Target,
}

impl TransClient {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Connects to the target and runs one transfer over the connection.
    pub fn run(&self, config: &TransferConfig) -> Result<SendReport> {
        info!("Connecting to target: {}", self.target);
        match &self.target {
            Target::Tcp(addr) => {
                let stream = TcpStream::connect(addr).map_err(|e| self.connect_error(e))?;
                info!("TCP socket connected.");
                sender::run(stream, config)
            }
            Target::Unix(path) => {
                let stream = UnixStream::connect(path).map_err(|e| self.connect_error(e))?;
                info!("Unix socket connected.");
                sender::run(stream, config)
            }
            Target::Vsock { cid, port } => {
                let stream = VsockStream::connect(&VsockAddr::new(*cid, *port))
                    .map_err(|e| self.connect_error(e))?;
                info!("Vsock socket connected.");
                sender::run(stream, config)
            }
        }
    }

    fn connect_error(&self, source: io::Error) -> Error {
        Error::Connect {
            target: self.target.to_string(),
            source,
        }
    }
}
