//! 下行命令
//!
//! 控制器通过注入的 [`CommandSink`] 发出命令，不直接接触传输层，
//! 测试时可用 [`RecordingSink`] 记录全部命令。

use crate::net::{ConnectionId, MacAddr, PortNo};

use super::error::SendError;

/// 流表匹配：按源/目的硬件地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowMatch {
    pub dl_src: MacAddr,
    pub dl_dst: MacAddr,
}

/// 交换机上的转发规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRule {
    pub matcher: FlowMatch,
    pub out_port: PortNo,
    /// 空闲超时（秒）
    pub idle_timeout: u16,
    /// 硬超时（秒）
    pub hard_timeout: u16,
}

/// packet-out 携带的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketData {
    /// 交换机缓存中的报文
    Buffered(u32),
    /// 完整的帧字节
    Raw(Vec<u8>),
}

/// 把一个报文从指定端口发出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketOut {
    pub data: PacketData,
    /// 报文的入端口；`out_port` 为 [`PortNo::IN_PORT`] 时必填
    pub in_port: Option<PortNo>,
    pub out_port: PortNo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    /// 端口统计请求（应答以独立事件异步到达）
    PortStatsRequest,
    FlowMod(FlowRule),
    PacketOut(PacketOut),
}

/// 命令出口：发送是非阻塞的、尽力而为的
pub trait CommandSink {
    fn send(&mut self, conn: ConnectionId, cmd: SwitchCommand) -> Result<(), SendError>;
}

/// 记录所有命令的 sink；`closed` 中的连接发送失败
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<(ConnectionId, SwitchCommand)>,
    pub closed: Vec<ConnectionId>,
}

impl RecordingSink {
    pub fn flow_mods(&self) -> impl Iterator<Item = (ConnectionId, &FlowRule)> {
        self.sent.iter().filter_map(|(c, cmd)| match cmd {
            SwitchCommand::FlowMod(rule) => Some((*c, rule)),
            _ => None,
        })
    }

    pub fn packet_outs(&self) -> impl Iterator<Item = (ConnectionId, &PacketOut)> {
        self.sent.iter().filter_map(|(c, cmd)| match cmd {
            SwitchCommand::PacketOut(out) => Some((*c, out)),
            _ => None,
        })
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, conn: ConnectionId, cmd: SwitchCommand) -> Result<(), SendError> {
        if self.closed.contains(&conn) {
            return Err(SendError::ConnectionClosed { conn });
        }
        self.sent.push((conn, cmd));
        Ok(())
    }
}
