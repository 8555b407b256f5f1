//! 上行事件
//!
//! 由发现模块、传输层等外部协作者产生，交给 [`super::Controller`] 处理。

use crate::net::{ConnectionId, Frame, NodeId, PortNo};

/// 发现了一条交换机之间的链路
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDiscovered {
    pub dpid1: NodeId,
    pub port1: PortNo,
    pub dpid2: NodeId,
    pub port2: PortNo,
}

/// 端口统计应答中的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortStat {
    pub port: PortNo,
    pub tx_bytes: u64,
}

/// 交换机上送的报文（新流的首包或 ARP）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub dpid: NodeId,
    pub conn: ConnectionId,
    pub in_port: PortNo,
    pub frame: Frame,
    /// 交换机缓存了报文时的 buffer id；否则 packet-out 带上完整帧
    pub buffer_id: Option<u32>,
}
