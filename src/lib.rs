//! Discovers live hosts on local Ethernet segments.
//!
//! Every configured interface is swept with broadcast ARP requests on a fixed
//! interval while ARP replies are captured from the same interface. Replies
//! from all interfaces are folded into one snapshot, keyed by hardware
//! address, which is flushed to stdout or an HTTP endpoint every five seconds.
//!
//! ## Example
//! ```no_run
//! use arp_presence::{daemon, DaemonConfigBuilder};
//! use std::time::Duration;
//!
//! # async fn scan() -> arp_presence::error::Result<()> {
//! let config = DaemonConfigBuilder::new(["eth0"])
//!     .with_interval(Duration::from_secs(30))
//!     .with_endpoint("https://example.com/nodes")
//!     .with_cache_dns(true)
//!     .build()?;
//! for scan in daemon::run(config).await? {
//!     println!("{}: {:?}", scan.name(), scan.state());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod daemon;
pub mod dns;
pub mod error;
pub mod node;
pub mod receiver;
pub mod reporter;
pub mod scan;
pub mod scope;
pub mod transmitter;

pub(crate) mod frame;

pub use aggregator::Aggregator;
pub use config::{DaemonConfig, DaemonConfigBuilder, ReportSink};
pub use dns::DnsCache;
pub use node::{DiscoveredNode, NodeSnapshot};
pub use reporter::{Delivery, Reporter};
pub use scan::{InterfaceScan, ScanState, StopReason};
pub use scope::{Addresses, NetworkScope};
