use std::net::{IpAddr, Ipv4Addr};

use ipnet::Ipv4Net;
use pnet::datalink::NetworkInterface;

use crate::constants::MIN_PREFIX_LEN;
use crate::error::{Error, Result};

/// IPv4 network swept by one interface's probe transmitter.
///
/// Only non-loopback networks of /24 or narrower are accepted.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NetworkScope {
    net: Ipv4Net,
}

impl NetworkScope {
    /// Validates `net` as a scan scope.
    ///
    /// # Errors
    /// Returns [`Error::Loopback`] for loopback addresses and
    /// [`Error::NetworkTooLarge`] for prefixes shorter than /24.
    pub fn new(net: Ipv4Net) -> Result<Self> {
        if net.addr().is_loopback() {
            return Err(Error::Loopback(net));
        }
        if net.prefix_len() < MIN_PREFIX_LEN {
            return Err(Error::NetworkTooLarge {
                prefix: net.prefix_len(),
            });
        }
        Ok(Self { net })
    }

    /// Derives the scope from the first IPv4 network assigned to `interface`.
    pub fn from_interface(interface: &NetworkInterface) -> Result<Self> {
        let net = interface
            .ips
            .iter()
            .find_map(|net| match net.ip() {
                IpAddr::V4(ipv4) => Ipv4Net::new(ipv4, net.prefix()).ok(),
                IpAddr::V6(_) => None,
            })
            .ok_or(Error::NoIpv4Network)?;
        Self::new(net)
    }

    /// The interface's own address, used as the sender of probes.
    pub fn addr(&self) -> Ipv4Addr {
        self.net.addr()
    }

    pub fn net(&self) -> Ipv4Net {
        self.net
    }

    pub fn addresses(&self) -> Addresses {
        Addresses::new(self.net)
    }
}

/// Every address of a network in ascending order, network and broadcast
/// addresses included.
///
/// A network without free host bits yields nothing.
#[derive(Clone, Debug)]
pub struct Addresses {
    next: u32,
    remaining: u64,
}

impl Addresses {
    pub fn new(net: Ipv4Net) -> Self {
        let host_bits = 32 - u32::from(net.prefix_len());
        let remaining = if host_bits == 0 { 0 } else { 1u64 << host_bits };
        Self {
            next: u32::from(net.network()),
            remaining,
        }
    }
}

impl Iterator for Addresses {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let addr = Ipv4Addr::from(self.next);
        self.remaining -= 1;
        self.next = self.next.wrapping_add(1);
        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (len, Some(len))
    }
}

impl ExactSizeIterator for Addresses {}
