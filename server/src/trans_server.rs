use std::fs;
use std::io;
use std::net::TcpListener;
use std::os::unix::net::UnixListener;

use log::{debug, info};
use vsock::{VsockAddr, VsockListener};
use xbench::{receiver, Error, ReceiveReport, Result, Target, TransferConfig};

pub struct TransServer {
    target: Target,
}

impl TransServer {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Binds the target, serves exactly one transfer, and releases the
    /// listening socket again.
    pub fn run(&self, config: &TransferConfig) -> Result<ReceiveReport> {
        match &self.target {
            Target::Tcp(addr) => {
                let listener = TcpListener::bind(addr).map_err(|e| self.bind_error(e))?;
                info!("Server listening on TCP {}", addr);
                receiver::serve(listener, config)
            }
            Target::Unix(path) => {
                if path.exists() {
                    debug!("Removing stale socket file {:?}", path);
                    let _ = fs::remove_file(path);
                }
                let listener = UnixListener::bind(path).map_err(|e| self.bind_error(e))?;
                info!("Server listening on Unix Socket {:?}", path);
                let report = receiver::serve(listener, config);
                let _ = fs::remove_file(path);
                report
            }
            Target::Vsock { cid, port } => {
                let listener = VsockListener::bind(&VsockAddr::new(*cid, *port))
                    .map_err(|e| self.bind_error(e))?;
                info!("Server listening on Vsock CID:{} Port:{}", cid, port);
                receiver::serve(listener, config)
            }
        }
    }

    fn bind_error(&self, source: io::Error) -> Error {
        Error::Bind {
            target: self.target.to_string(),
            source,
        }
    }
}
