//! TCP connect probe adapter.

use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

use crate::app::ports::{PortProbe, ProbeOutcome};

/// [`PortProbe`] using `TcpStream::connect_timeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

/// Connect failures that just mean "nobody is listening".
fn is_closed(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::TimedOut
            | ErrorKind::WouldBlock
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
    )
}

impl PortProbe for TcpProbe {
    fn probe(&self, host: Ipv4Addr, port: u16, timeout: Duration) -> io::Result<ProbeOutcome> {
        let addr = SocketAddr::from((host, port));
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_stream) => Ok(ProbeOutcome::Open),
            Err(e) if is_closed(e.kind()) => Ok(ProbeOutcome::Closed),
            Err(e) => Err(e),
        }
    }
}
