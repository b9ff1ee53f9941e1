//! IPv4 CIDR ranges.
//!
//! Parsing is non-strict: host bits set in the address are masked off, so
//! `192.168.1.77/24` names the same range as `192.168.1.0/24`.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::CidrError;

/// An IPv4 network: base address (host bits cleared) plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: u32,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        if prefix > 32 {
            return Err(CidrError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Self {
            network: u32::from(addr) & mask(prefix),
            prefix,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network | !mask(self.prefix))
    }

    /// Number of usable host addresses.
    ///
    /// Network and broadcast are excluded up to /30; a /31 has two usable
    /// addresses and a /32 one.
    pub fn host_count(&self) -> u64 {
        let size = 1u64 << (32 - u32::from(self.prefix));
        if self.prefix >= 31 { size } else { size - 2 }
    }

    /// Usable hosts in ascending order.
    pub fn hosts(&self) -> Hosts {
        let first = if self.prefix >= 31 {
            u64::from(self.network)
        } else {
            u64::from(self.network) + 1
        };
        Hosts {
            next: first,
            end: first + self.host_count(),
        }
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(s.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrError::InvalidAddress(addr.to_string()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(prefix.to_string()))?;
        Self::new(addr, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}

fn mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}

/// Iterator over the usable hosts of an [`Ipv4Cidr`].
#[derive(Debug, Clone)]
pub struct Hosts {
    next: u64,
    end: u64,
}

impl Iterator for Hosts {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.next >= self.end {
            return None;
        }
        let addr = Ipv4Addr::from(self.next as u32);
        self.next += 1;
        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.end - self.next) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Hosts {}
