use std::fmt;
use std::time::Duration;

use afpacket::tokio::RawPacketStream;
use log::{info, warn};
use pnet::datalink::NetworkInterface;
use pnet::util::MacAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::node::NodeSender;
use crate::receiver::Receiver;
use crate::scope::NetworkScope;
use crate::transmitter::Transmitter;

/// Why an interface stopped scanning.
#[derive(Debug)]
pub enum StopReason {
    /// The interface could not be prepared for scanning.
    Init(Error),
    /// A probe could not be written.
    Transmit(Error),
    /// The capture failed or ended.
    Receive(Error),
}

impl StopReason {
    pub fn error(&self) -> &Error {
        match self {
            StopReason::Init(err) | StopReason::Transmit(err) | StopReason::Receive(err) => err,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Init(err) => write!(f, "initialization failed: {}", err),
            StopReason::Transmit(err) => write!(f, "writing packets: {}", err),
            StopReason::Receive(err) => write!(f, "reading packets: {}", err),
        }
    }
}

#[derive(Debug)]
pub enum ScanState {
    Initializing,
    Running,
    Stopped(StopReason),
}

/// Scan lifecycle of a single interface.
///
/// One probe transmitter and one reply receiver share a capture handle bound
/// to the interface. Whichever fails first stops the other, leaving the scan
/// in [`ScanState::Stopped`]. Other interfaces are unaffected.
#[derive(Debug)]
pub struct InterfaceScan {
    interface: NetworkInterface,
    interval: Duration,
    queue: NodeSender,
    state: ScanState,
}

impl InterfaceScan {
    pub fn new(interface: NetworkInterface, interval: Duration, queue: NodeSender) -> Self {
        Self {
            interface,
            interval,
            queue,
            state: ScanState::Initializing,
        }
    }

    pub fn name(&self) -> &str {
        &self.interface.name
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Consumes the scan, returning why it stopped.
    ///
    /// Returns `None` if the scan never ran.
    pub fn into_stop_reason(self) -> Option<StopReason> {
        match self.state {
            ScanState::Stopped(reason) => Some(reason),
            _ => None,
        }
    }

    /// Opens the capture handle and scans until the interface fails.
    pub async fn run(&mut self) {
        let (mac, scope) = match self.prepare() {
            Ok(prepared) => prepared,
            Err(err) => return self.stop(StopReason::Init(err)),
        };
        info!(
            "Using network range {} for interface {}",
            scope.net(),
            self.interface.name
        );
        let stream = match open_stream(&self.interface.name) {
            Ok(stream) => stream,
            Err(err) => return self.stop(StopReason::Init(err)),
        };
        self.drive(stream.clone(), stream, mac, scope).await;
    }

    fn prepare(&self) -> Result<(MacAddr, NetworkScope)> {
        let mac = self.interface.mac.ok_or(Error::MissingMac)?;
        let scope = NetworkScope::from_interface(&self.interface)?;
        Ok((mac, scope))
    }

    pub(crate) async fn drive<W, R>(&mut self, sink: W, source: R, mac: MacAddr, scope: NetworkScope)
    where
        W: AsyncWrite + Unpin,
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.state = ScanState::Running;

        let token = CancellationToken::new();
        let listener_token = token.clone();
        let mut receiver = Receiver::new(source, mac, self.queue.clone());
        let listener = tokio::task::spawn(async move {
            tokio::select! {
                result = receiver.listen() => {
                    listener_token.cancel();
                    result
                },
                _ = listener_token.cancelled() => Ok(()),
            }
        });

        let mut transmitter = Transmitter::new(sink, mac, scope, self.interval);
        let transmit_error = tokio::select! {
            biased;
            err = transmitter.run() => Some(err),
            _ = token.cancelled() => None,
        };
        token.cancel();

        let joined = listener.await;
        let reason = match transmit_error {
            Some(err) => StopReason::Transmit(err),
            None => match joined {
                Ok(Err(err)) => StopReason::Receive(err),
                Ok(Ok(())) => StopReason::Receive(Error::CaptureClosed),
                Err(err) => StopReason::Receive(Error::Opaque(Box::new(err))),
            },
        };
        self.stop(reason);
    }

    fn stop(&mut self, reason: StopReason) {
        warn!("{} error: {}", self.interface.name, reason);
        self.state = ScanState::Stopped(reason);
    }
}

fn open_stream(interface_name: &str) -> Result<RawPacketStream> {
    let mut stream = RawPacketStream::new().map_err(Error::Capture)?;
    stream.bind(interface_name).map_err(Error::Capture)?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::{arp_frame, OWN_MAC};
    use crate::node::{node_queue, DiscoveredNode};
    use ipnet::Ipv4Net;
    use pnet::ipnetwork::{IpNetwork, Ipv4Network};
    use pnet::packet::arp::ArpOperations;
    use std::io;
    use std::net::Ipv4Addr;

    const PEER: MacAddr = MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01);

    fn interface(mac: Option<MacAddr>, addr: Ipv4Addr, prefix: u8) -> NetworkInterface {
        NetworkInterface {
            name: "eth0".into(),
            description: String::new(),
            index: 2,
            mac,
            ips: vec![IpNetwork::V4(Ipv4Network::new(addr, prefix).unwrap())],
            flags: 0,
        }
    }

    fn scope() -> NetworkScope {
        NetworkScope::new(Ipv4Net::new(Ipv4Addr::new(10, 0, 0, 5), 24).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_loopback_interface_stops_during_init() {
        let (tx, _rx) = node_queue();
        let mut scan = InterfaceScan::new(
            interface(Some(OWN_MAC), Ipv4Addr::new(127, 0, 0, 1), 8),
            Duration::from_secs(30),
            tx,
        );
        assert!(matches!(scan.state(), ScanState::Initializing));
        scan.run().await;
        assert!(matches!(
            scan.state(),
            ScanState::Stopped(StopReason::Init(Error::Loopback(_)))
        ));
    }

    #[tokio::test]
    async fn test_interface_without_mac_stops_during_init() {
        let (tx, _rx) = node_queue();
        let mut scan = InterfaceScan::new(
            interface(None, Ipv4Addr::new(10, 0, 0, 5), 24),
            Duration::from_secs(30),
            tx,
        );
        scan.run().await;
        assert!(matches!(
            scan.into_stop_reason(),
            Some(StopReason::Init(Error::MissingMac))
        ));
    }

    #[tokio::test]
    async fn test_wide_network_stops_during_init() {
        let (tx, _rx) = node_queue();
        let mut scan = InterfaceScan::new(
            interface(Some(OWN_MAC), Ipv4Addr::new(10, 0, 0, 5), 16),
            Duration::from_secs(30),
            tx,
        );
        scan.run().await;
        assert!(matches!(
            scan.state(),
            ScanState::Stopped(StopReason::Init(Error::NetworkTooLarge { prefix: 16 }))
        ));
    }

    #[tokio::test]
    async fn test_capture_end_stops_scan_and_keeps_replies() {
        let (tx, mut rx) = node_queue();
        let mut scan = InterfaceScan::new(
            interface(Some(OWN_MAC), Ipv4Addr::new(10, 0, 0, 5), 24),
            Duration::from_secs(3600),
            tx,
        );
        let source = tokio_test::io::Builder::new()
            .read(&arp_frame(ArpOperations::Reply, PEER, Ipv4Addr::new(10, 0, 0, 9)))
            .read(&arp_frame(ArpOperations::Reply, PEER, Ipv4Addr::new(10, 0, 0, 10)))
            .build();

        scan.drive(tokio::io::sink(), source, OWN_MAC, scope()).await;

        assert!(matches!(
            scan.state(),
            ScanState::Stopped(StopReason::Receive(Error::CaptureClosed))
        ));
        assert_eq!(
            rx.recv().await,
            Some(DiscoveredNode::new(PEER, Ipv4Addr::new(10, 0, 0, 9)))
        );
        assert_eq!(
            rx.recv().await,
            Some(DiscoveredNode::new(PEER, Ipv4Addr::new(10, 0, 0, 10)))
        );
    }

    #[tokio::test]
    async fn test_write_failure_stops_scan() {
        let (tx, _rx) = node_queue();
        let mut scan = InterfaceScan::new(
            interface(Some(OWN_MAC), Ipv4Addr::new(10, 0, 0, 5), 24),
            Duration::from_secs(30),
            tx,
        );
        let sink = tokio_test::io::Builder::new()
            .write_error(io::Error::new(io::ErrorKind::Other, "interface down"))
            .build();
        let source = tokio_test::io::Builder::new()
            .wait(Duration::from_secs(3600))
            .build();

        scan.drive(sink, source, OWN_MAC, scope()).await;

        let reason = scan.into_stop_reason().unwrap();
        assert!(matches!(reason, StopReason::Transmit(Error::Transmit(_))));
        assert!(reason.to_string().starts_with("writing packets"));
    }
}
