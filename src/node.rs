use std::collections::HashMap;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use serde::Serialize;
use tokio::sync::mpsc;

/// One observed ARP responder.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DiscoveredNode {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl DiscoveredNode {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self { mac, ip }
    }
}

/// Sending half of the node queue, cloned once per reply receiver.
pub type NodeSender = mpsc::UnboundedSender<DiscoveredNode>;
/// Receiving half of the node queue, owned by the aggregator.
pub type NodeReceiver = mpsc::UnboundedReceiver<DiscoveredNode>;

pub fn node_queue() -> (NodeSender, NodeReceiver) {
    mpsc::unbounded_channel()
}

/// Distinct nodes seen since the last flush, keyed by hardware address.
///
/// Serializes as a flat object mapping `"aa:bb:cc:dd:ee:ff"` to `"10.0.0.1"`.
#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize)]
#[serde(transparent)]
pub struct NodeSnapshot {
    nodes: HashMap<String, String>,
}

impl NodeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `node`, replacing any earlier address seen for the same hardware address.
    pub fn insert(&mut self, node: DiscoveredNode) {
        self.nodes.insert(node.mac.to_string(), node.ip.to_string());
    }

    pub fn get(&self, mac: &MacAddr) -> Option<&str> {
        self.nodes.get(&mac.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().map(|(mac, ip)| (mac.as_str(), ip.as_str()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<DiscoveredNode> for NodeSnapshot {
    fn from_iter<I: IntoIterator<Item = DiscoveredNode>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for node in iter {
            snapshot.insert(node);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC_A: MacAddr = MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01);
    const MAC_B: MacAddr = MacAddr(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x02);

    #[test]
    fn test_last_address_wins() {
        let snapshot: NodeSnapshot = [
            DiscoveredNode::new(MAC_A, Ipv4Addr::new(10, 0, 0, 9)),
            DiscoveredNode::new(MAC_B, Ipv4Addr::new(10, 0, 0, 3)),
            DiscoveredNode::new(MAC_A, Ipv4Addr::new(10, 0, 0, 10)),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&MAC_A), Some("10.0.0.10"));
        assert_eq!(snapshot.get(&MAC_B), Some("10.0.0.3"));
    }

    #[test]
    fn test_json_is_flat_object() {
        let snapshot: NodeSnapshot = [DiscoveredNode::new(MAC_A, Ipv4Addr::new(10, 0, 0, 10))]
            .into_iter()
            .collect();
        let json = snapshot.to_json().unwrap();
        assert_eq!(json, "{\n  \"aa:bb:cc:dd:ee:01\": \"10.0.0.10\"\n}");
    }

    #[tokio::test]
    async fn test_queue_keeps_arrival_order() {
        let (tx, mut rx) = node_queue();
        let other = tx.clone();
        tx.send(DiscoveredNode::new(MAC_A, Ipv4Addr::new(10, 0, 0, 1)))
            .unwrap();
        other
            .send(DiscoveredNode::new(MAC_B, Ipv4Addr::new(10, 0, 0, 2)))
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().mac, MAC_A);
        assert_eq!(rx.recv().await.unwrap().mac, MAC_B);
    }
}
