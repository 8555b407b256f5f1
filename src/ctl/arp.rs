//! ARP 代答
//!
//! 按地址表直接合成 ARP 应答，从入端口发回请求方。与选路流程完全独立。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::net::{ArpOp, ArpPacket, Frame, MacAddr, Payload, PortNo};
use tracing::{debug, trace};

use super::command::{PacketData, PacketOut};
use super::error::ControlError;

/// IP -> MAC 地址表（静态注入或由主机跟踪模块学习）
#[derive(Debug, Default, Clone)]
pub struct AddressResolver {
    table: HashMap<Ipv4Addr, MacAddr>,
}

impl AddressResolver {
    pub fn new(entries: impl IntoIterator<Item = (Ipv4Addr, MacAddr)>) -> Self {
        Self {
            table: entries.into_iter().collect(),
        }
    }

    /// 学习（或覆盖）一条地址映射
    pub fn learn(&mut self, ip: Ipv4Addr, mac: MacAddr) -> Option<MacAddr> {
        let prev = self.table.insert(ip, mac);
        debug!(ip = %ip, mac = %mac, replaced = ?prev, "学习地址映射");
        prev
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.table.get(&ip).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// 处理一个 ARP 帧。
    ///
    /// 请求 -> `Ok(Some(packet_out))`；应答等其他操作码 -> `Ok(None)`；
    /// 目标地址未知 -> [`ControlError::UnknownAddress`]。
    pub fn answer(&self, frame: &Frame, in_port: PortNo) -> Result<Option<PacketOut>, ControlError> {
        let Payload::Arp(req) = &frame.payload else {
            return Ok(None);
        };
        if req.op != ArpOp::Request {
            trace!(op = ?req.op, "非 ARP 请求，忽略");
            return Ok(None);
        }

        let hw = self
            .lookup(req.target_ip)
            .ok_or(ControlError::UnknownAddress { ip: req.target_ip })?;

        let reply = Frame {
            src: hw,
            dst: frame.src,
            payload: Payload::Arp(ArpPacket {
                op: ArpOp::Reply,
                sender_mac: hw,
                sender_ip: req.target_ip,
                target_mac: frame.src,
                target_ip: req.sender_ip,
            }),
        };
        debug!(who_has = %req.target_ip, is_at = %hw, tell = %req.sender_ip, "合成 ARP 应答");

        Ok(Some(PacketOut {
            data: PacketData::Raw(reply.to_bytes()),
            in_port: Some(in_port),
            out_port: PortNo::IN_PORT,
        }))
    }
}
