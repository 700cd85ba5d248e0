use std::io;

use thiserror::Error as ThisError;

pub type OpaqueError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(ThisError, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("at least one interface is required")]
    NoInterfaces,
    #[error("invalid endpoint {endpoint:?}, reason: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("interface {0} not found")]
    InterfaceNotFound(String),
    #[error("interface does not have mac address")]
    MissingMac,
    #[error("no IPv4 network found")]
    NoIpv4Network,
    #[error("skipping loopback network {0}")]
    Loopback(ipnet::Ipv4Net),
    #[error("network /{prefix} is too large, at most /24 is scanned")]
    NetworkTooLarge { prefix: u8 },
    #[error("failed to open capture handle, reason: {0}")]
    Capture(#[source] io::Error),
    #[error("failed to write probe, reason: {0}")]
    Transmit(#[source] io::Error),
    #[error("error while reading the interface traffic, reason: {0}")]
    Receive(#[source] io::Error),
    #[error("capture stream closed")]
    CaptureClosed,
    #[error("DNS lookup of {host} failed: {reason}")]
    Dns { host: String, reason: String },
    #[error("send failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("send error: {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to serialize nodes: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report: {0}")]
    Stdout(#[source] io::Error),
    #[error("{0}")]
    Opaque(#[from] OpaqueError),
}

pub type Result<T> = std::result::Result<T, Error>;
