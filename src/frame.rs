use std::net::Ipv4Addr;

use pnet::packet::arp::{Arp, ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::{FromPacket, Packet};
use pnet::util::MacAddr;

use crate::constants::{ARP_PACK_LEN, ETH_PACK_LEN, IP_V4_LEN, MAC_ADDR_LEN};
use crate::error::{Error, Result};
use crate::node::DiscoveredNode;

/// Serializes a broadcast ARP request asking who owns `target_ip`.
pub(crate) fn request_frame(
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_ip: Ipv4Addr,
) -> Result<[u8; ETH_PACK_LEN]> {
    let mut eth_buf = [0; ETH_PACK_LEN];
    let mut eth_packet = MutableEthernetPacket::new(&mut eth_buf)
        .ok_or(Error::Opaque("failed to create Ethernet frame".into()))?;
    eth_packet.set_destination(MacAddr::broadcast());
    eth_packet.set_source(sender_mac);
    eth_packet.set_ethertype(EtherTypes::Arp);

    let mut arp_buf = [0; ARP_PACK_LEN];
    let mut arp_packet = MutableArpPacket::new(&mut arp_buf)
        .ok_or(Error::Opaque("failed to create ARP packet".into()))?;
    arp_packet.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp_packet.set_protocol_type(EtherTypes::Ipv4);
    arp_packet.set_hw_addr_len(MAC_ADDR_LEN);
    arp_packet.set_proto_addr_len(IP_V4_LEN);
    arp_packet.set_operation(ArpOperations::Request);
    arp_packet.set_sender_hw_addr(sender_mac);
    arp_packet.set_sender_proto_addr(sender_ip);
    arp_packet.set_target_hw_addr(MacAddr::zero());
    arp_packet.set_target_proto_addr(target_ip);

    eth_packet.set_payload(arp_packet.packet());
    Ok(eth_buf)
}

pub(crate) fn parse_arp_packet(bytes: &[u8]) -> Result<Arp> {
    let ethernet_packet =
        EthernetPacket::new(bytes).ok_or(Error::Opaque("failed to parse Ethernet frame".into()))?;
    if ethernet_packet.get_ethertype() == EtherTypes::Arp {
        Ok(ArpPacket::new(ethernet_packet.payload())
            .ok_or(Error::Opaque("failed to parse ARP packet".into()))?
            .from_packet())
    } else {
        Err(Error::Opaque("not an ARP packet".into()))
    }
}

/// Turns a captured frame into a discovered node.
///
/// Anything but an ARP reply is dropped, as are replies sent from `own_mac`.
pub(crate) fn accept_reply(bytes: &[u8], own_mac: MacAddr) -> Option<DiscoveredNode> {
    let arp = parse_arp_packet(bytes).ok()?;
    if arp.operation != ArpOperations::Reply || arp.sender_hw_addr == own_mac {
        return None;
    }
    Some(DiscoveredNode::new(arp.sender_hw_addr, arp.sender_proto_addr))
}
