//! 以太网帧
//!
//! 控制器只关心帧头的源/目的地址以及 ARP 载荷；其余载荷只保留最少的字段。
//! 线上格式的编解码交给 `etherparse`。

use std::net::Ipv4Addr;

use super::id::MacAddr;
use etherparse::{
    ArpEthIpv4Packet, ArpOperation, ArpPacketSlice, EtherType, Ethernet2Header, IpNumber,
    Ipv4Header,
};
use thiserror::Error;

pub const ETHERTYPE_IPV4: u16 = EtherType::IPV4.0;
pub const ETHERTYPE_ARP: u16 = EtherType::ARP.0;

/// ARP 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request,
    Reply,
    Other(u16),
}

impl ArpOp {
    fn operation(self) -> ArpOperation {
        match self {
            ArpOp::Request => ArpOperation::REQUEST,
            ArpOp::Reply => ArpOperation::REPLY,
            ArpOp::Other(c) => ArpOperation(c),
        }
    }

    fn from_operation(op: ArpOperation) -> ArpOp {
        match op {
            ArpOperation::REQUEST => ArpOp::Request,
            ArpOperation::REPLY => ArpOp::Reply,
            ArpOperation(c) => ArpOp::Other(c),
        }
    }
}

/// ARP（以太网 + IPv4）报文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub op: ArpOp,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

/// 帧载荷
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Arp(ArpPacket),
    Ipv4 { src: Ipv4Addr, dst: Ipv4Addr },
    Other { ethertype: u16, data: Vec<u8> },
}

/// 以太网帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub src: MacAddr,
    pub dst: MacAddr,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// 某一层的头部不完整或字段非法
    #[error("malformed {layer} header: {reason}")]
    Malformed { layer: &'static str, reason: String },
    #[error("unsupported ARP hardware/protocol type")]
    UnsupportedArp,
}

impl Frame {
    pub fn is_arp(&self) -> bool {
        matches!(self.payload, Payload::Arp(_))
    }

    pub fn ethertype(&self) -> u16 {
        match &self.payload {
            Payload::Arp(_) => ETHERTYPE_ARP,
            Payload::Ipv4 { .. } => ETHERTYPE_IPV4,
            Payload::Other { ethertype, .. } => *ethertype,
        }
    }

    /// 编码为线上字节
    pub fn to_bytes(&self) -> Vec<u8> {
        let eth = Ethernet2Header {
            source: self.src.octets(),
            destination: self.dst.octets(),
            ether_type: EtherType(self.ethertype()),
        };
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&eth.to_bytes());
        match &self.payload {
            Payload::Arp(arp) => {
                let pkt = ArpEthIpv4Packet {
                    operation: arp.op.operation(),
                    sender_mac: arp.sender_mac.octets(),
                    sender_ipv4: arp.sender_ip.octets(),
                    target_mac: arp.target_mac.octets(),
                    target_ipv4: arp.target_ip.octets(),
                };
                out.extend_from_slice(&pkt.to_bytes());
            }
            Payload::Ipv4 { src, dst } => {
                let mut hdr = Ipv4Header {
                    total_len: Ipv4Header::MIN_LEN as u16,
                    time_to_live: 64,
                    protocol: IpNumber::UDP,
                    source: src.octets(),
                    destination: dst.octets(),
                    ..Default::default()
                };
                hdr.header_checksum = hdr.calc_header_checksum();
                out.extend_from_slice(&hdr.to_bytes());
            }
            Payload::Other { data, .. } => out.extend_from_slice(data),
        }
        out
    }

    /// 从线上字节解析
    pub fn parse(bytes: &[u8]) -> Result<Frame, FrameError> {
        let (eth, body) = Ethernet2Header::from_slice(bytes)
            .map_err(|e| malformed("ethernet", e))?;

        let payload = match eth.ether_type {
            EtherType::ARP => {
                let arp = ArpPacketSlice::from_slice(body)
                    .map_err(|e| malformed("arp", e))?
                    .to_packet()
                    .try_eth_ipv4()
                    .map_err(|_| FrameError::UnsupportedArp)?;
                Payload::Arp(ArpPacket {
                    op: ArpOp::from_operation(arp.operation),
                    sender_mac: MacAddr(arp.sender_mac),
                    sender_ip: Ipv4Addr::from(arp.sender_ipv4),
                    target_mac: MacAddr(arp.target_mac),
                    target_ip: Ipv4Addr::from(arp.target_ipv4),
                })
            }
            EtherType::IPV4 => {
                let (hdr, _) = Ipv4Header::from_slice(body)
                    .map_err(|e| malformed("ipv4", e))?;
                Payload::Ipv4 {
                    src: Ipv4Addr::from(hdr.source),
                    dst: Ipv4Addr::from(hdr.destination),
                }
            }
            EtherType(other) => Payload::Other {
                ethertype: other,
                data: body.to_vec(),
            },
        };
        Ok(Frame {
            src: MacAddr(eth.source),
            dst: MacAddr(eth.destination),
            payload,
        })
    }
}

fn malformed(layer: &'static str, e: impl std::fmt::Display) -> FrameError {
    FrameError::Malformed {
        layer,
        reason: e.to_string(),
    }
}
