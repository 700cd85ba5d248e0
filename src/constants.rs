use std::time::Duration;

pub const MAC_ADDR_LEN: u8 = 6;
pub const IP_V4_LEN: u8 = 4;
pub const ARP_PACK_LEN: usize = 28;
pub const ETH_HEADER_LEN: usize = 14;
pub const ETH_PACK_LEN: usize = ETH_HEADER_LEN + ARP_PACK_LEN;

/// Largest frame the receiver reads in one go.
pub const CAPTURE_BUF_LEN: usize = 65536;

/// Networks with a shorter prefix are not scanned.
pub const MIN_PREFIX_LEN: u8 = 24;

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);
pub const FLUSH_PERIOD: Duration = Duration::from_secs(5);
