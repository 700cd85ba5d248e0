use log::{info, warn};
use pnet::datalink::{self, NetworkInterface};

use crate::aggregator::Aggregator;
use crate::config::DaemonConfig;
use crate::constants::FLUSH_PERIOD;
use crate::dns::DnsCache;
use crate::error::{Error, Result};
use crate::node::node_queue;
use crate::reporter::Reporter;
use crate::scan::InterfaceScan;

/// Runs the daemon until every interface scan has stopped.
///
/// Interfaces that cannot be found are logged and skipped. One aggregator and
/// reporter serve all interfaces. Returns the stopped scans, empty when no
/// interface could be resolved.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub async fn run(config: DaemonConfig) -> Result<Vec<InterfaceScan>> {
    let interfaces = resolve_interfaces(&config.interfaces, datalink::interfaces());
    if interfaces.is_empty() {
        warn!("no usable interface, nothing to scan");
        return Ok(Vec::new());
    }

    let dns_cache = config.cache_dns.then(DnsCache::new);
    let reporter = Reporter::new(config.sink, dns_cache)?;
    let aggregator = Aggregator::new();
    let (tx, rx) = node_queue();

    let drain = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.drain(rx).await })
    };
    let flush = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.flush_every(&reporter, FLUSH_PERIOD).await })
    };

    let scans = interfaces.into_iter().map(|interface| {
        let mut scan = InterfaceScan::new(interface, config.interval, tx.clone());
        tokio::spawn(async move {
            scan.run().await;
            scan
        })
    });
    let joined = futures::future::join_all(scans).await;
    drop(tx);

    drain.abort();
    flush.abort();

    let mut stopped = Vec::with_capacity(joined.len());
    for result in joined {
        match result {
            Ok(scan) => stopped.push(scan),
            Err(err) => warn!("interface scan task failed: {}", err),
        }
    }
    info!("all interface scans stopped");
    Ok(stopped)
}

/// Picks the requested interfaces out of `available`, in request order.
pub fn resolve_interfaces(
    names: &[String],
    available: Vec<NetworkInterface>,
) -> Vec<NetworkInterface> {
    names
        .iter()
        .filter_map(|name| match available.iter().find(|iface| &iface.name == name) {
            Some(iface) => Some(iface.clone()),
            None => {
                warn!("{}", Error::InterfaceNotFound(name.clone()));
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DaemonConfigBuilder, ReportSink};
    use crate::frame::tests::{arp_frame, OWN_MAC};
    use crate::reporter::tests::SharedBuf;
    use crate::reporter::Delivery;
    use crate::scan::{ScanState, StopReason};
    use crate::scope::NetworkScope;
    use ipnet::Ipv4Net;
    use pnet::ipnetwork::{IpNetwork, Ipv4Network};
    use pnet::packet::arp::ArpOperations;
    use pnet::util::MacAddr;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn interface(name: &str) -> NetworkInterface {
        NetworkInterface {
            name: name.into(),
            description: String::new(),
            index: 1,
            mac: None,
            ips: vec![IpNetwork::V4(
                Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 5), 24).unwrap(),
            )],
            flags: 0,
        }
    }

    #[test]
    fn test_unknown_interfaces_are_skipped() {
        let names = vec!["wlan0".to_string(), "missing0".to_string(), "eth0".to_string()];
        let resolved = resolve_interfaces(&names, vec![interface("eth0"), interface("wlan0")]);
        let resolved: Vec<_> = resolved.iter().map(|iface| iface.name.as_str()).collect();
        assert_eq!(resolved, vec!["wlan0", "eth0"]);
    }

    #[tokio::test]
    async fn test_no_resolvable_interface_does_no_work() {
        let config = DaemonConfigBuilder::new(["definitely-not-an-interface0"])
            .build()
            .unwrap();
        assert!(run(config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loopback_scan_stops_without_stopping_daemon_setup() {
        let loopback = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.is_loopback());
        let Some(loopback) = loopback else {
            return;
        };
        let config = DaemonConfigBuilder::new([loopback.name.clone()])
            .build()
            .unwrap();
        let stopped = run(config).await.unwrap();
        assert_eq!(stopped.len(), 1);
        assert!(matches!(
            stopped[0].state(),
            ScanState::Stopped(StopReason::Init(_))
        ));
    }

    #[tokio::test]
    async fn test_repeated_replies_report_latest_address() {
        const PEER: MacAddr = MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01);

        let (tx, rx) = node_queue();
        let mut eth0 = interface("eth0");
        eth0.mac = Some(OWN_MAC);
        let mut scan = InterfaceScan::new(eth0, Duration::from_secs(3600), tx);
        let source = tokio_test::io::Builder::new()
            .read(&arp_frame(ArpOperations::Reply, PEER, Ipv4Addr::new(10, 0, 0, 9)))
            .read(&arp_frame(ArpOperations::Reply, PEER, Ipv4Addr::new(10, 0, 0, 10)))
            .build();
        let scope =
            NetworkScope::new(Ipv4Net::new(Ipv4Addr::new(10, 0, 0, 5), 24).unwrap()).unwrap();
        scan.drive(tokio::io::sink(), source, OWN_MAC, scope).await;
        drop(scan);

        let aggregator = Aggregator::new();
        aggregator.drain(rx).await;

        let console = SharedBuf::default();
        let reporter = Reporter::new(ReportSink::Stdout, None)
            .unwrap()
            .with_console(console.clone());
        assert_eq!(aggregator.flush(&reporter).await, Delivery::Printed);
        assert_eq!(
            console.contents(),
            "{\n  \"aa:bb:cc:dd:ee:01\": \"10.0.0.10\"\n}\n"
        );
        assert_eq!(aggregator.flush(&reporter).await, Delivery::Skipped);
    }
}
