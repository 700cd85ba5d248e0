use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{info, warn};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Process-lifetime cache of the report endpoint's IPv4 address.
///
/// Successful lookups are kept forever; failed ones are retried on the next
/// connection. The lock is held across the lookup, so concurrent connections
/// to the same host never resolve it twice.
#[derive(Debug, Clone, Default)]
pub struct DnsCache {
    inner: Arc<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: Mutex<HashMap<String, Ipv4Addr>>,
    lookups: AtomicUsize,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached address of `host`, resolving it on first use.
    pub async fn lookup(&self, host: &str) -> Result<Ipv4Addr> {
        let mut entries = self.inner.entries.lock().await;
        if let Some(ip) = entries.get(host) {
            return Ok(*ip);
        }
        self.inner.lookups.fetch_add(1, Ordering::Relaxed);
        let ip = match resolve_ipv4(host).await {
            Ok(ip) => ip,
            Err(err) => {
                warn!("{}", err);
                return Err(err);
            }
        };
        info!("DNS lookup: {} -> {}", host, ip);
        entries.insert(host.into(), ip);
        Ok(ip)
    }

    pub async fn cached(&self, host: &str) -> Option<Ipv4Addr> {
        self.inner.entries.lock().await.get(host).copied()
    }

    /// Number of lookups that went to the system resolver.
    pub fn lookups(&self) -> usize {
        self.inner.lookups.load(Ordering::Relaxed)
    }
}

async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr> {
    let dns_error = |reason: String| Error::Dns {
        host: host.into(),
        reason,
    };
    tokio::net::lookup_host((host, 0))
        .await
        .map_err(|err| dns_error(err.to_string()))?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| dns_error("no IPv4 address".into()))
}

impl Resolve for DnsCache {
    fn resolve(&self, name: Name) -> Resolving {
        let cache = self.clone();
        Box::pin(async move {
            let ip = cache.lookup(name.as_str()).await?;
            // Port 0 is replaced with the URL's port by the connector.
            let addrs: Addrs = Box::new(std::iter::once(SocketAddr::new(IpAddr::V4(ip), 0)));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}
