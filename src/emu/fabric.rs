//! 仿真交换机
//!
//! 用于在没有真实交换机的情况下驱动控制器：接收下行命令（先放进 outbox，
//! 由 [`super::ControllerWorld`] 在事件结束后统一处理），维护流表与端口累计发送字节数。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ctl::{CommandSink, FlowRule, PortStat, SendError, SwitchCommand};
use crate::net::{ConnectionId, MacAddr, NodeId, PortNo};
use crate::sim::SimTime;
use tracing::{debug, trace, warn};

/// 每条下行命令在本地端口上计入的控制流量（bytes）
const CONTROL_MSG_BYTES: f64 = 128.0;

#[derive(Debug, Clone)]
struct InstalledFlow {
    rule: FlowRule,
    installed_at: SimTime,
    expires_at: SimTime,
    bytes_per_sec: f64,
}

impl InstalledFlow {
    fn active_at(&self, now: SimTime) -> bool {
        self.installed_at <= now && now < self.expires_at
    }
}

/// 一台仿真交换机
#[derive(Debug, Default)]
struct EmuSwitch {
    conn: Option<ConnectionId>,
    /// 端口背景负载（bytes/s）
    background: BTreeMap<PortNo, f64>,
    tx_bytes: BTreeMap<PortNo, f64>,
    flows: Vec<InstalledFlow>,
    accrued_until: SimTime,
}

impl EmuSwitch {
    /// 把端口计数推进到 `now`：背景负载 + 流表中流量与 [accrued_until, now] 的重叠部分。
    fn accrue(&mut self, now: SimTime) {
        let from = self.accrued_until;
        if now <= from {
            return;
        }
        let dt = SimTime(now.0 - from.0).as_secs_f64();
        for (&port, &rate) in &self.background {
            *self.tx_bytes.entry(port).or_default() += rate * dt;
        }
        for f in &self.flows {
            let start = from.max(f.installed_at);
            let end = now.min(f.expires_at);
            if end > start {
                let overlap = SimTime(end.0 - start.0).as_secs_f64();
                *self.tx_bytes.entry(f.rule.out_port).or_default() += f.bytes_per_sec * overlap;
            }
        }
        self.flows.retain(|f| f.expires_at > now);
        self.accrued_until = now;
    }

    fn port_stats(&mut self, now: SimTime) -> Vec<PortStat> {
        self.accrue(now);
        self.tx_bytes
            .iter()
            .map(|(&port, &bytes)| PortStat {
                port,
                tx_bytes: bytes as u64,
            })
            .collect()
    }

    fn charge_control(&mut self) {
        *self.tx_bytes.entry(PortNo::LOCAL).or_default() += CONTROL_MSG_BYTES;
    }
}

/// 仿真交换机计数
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FabricStats {
    pub stats_requests: u64,
    pub flow_mods: u64,
    pub packet_outs: u64,
    /// 命中已有流表、无需上送控制器的报文数
    pub dataplane_hits: u64,
    pub rejected_sends: u64,
}

/// 全部仿真交换机
#[derive(Debug, Default)]
pub struct Fabric {
    switches: BTreeMap<NodeId, EmuSwitch>,
    by_conn: HashMap<ConnectionId, NodeId>,
    closed: BTreeSet<ConnectionId>,
    next_conn: u64,
    next_buffer: u32,
    /// (src, dst) -> 流建立后产生的负载
    offered: HashMap<(MacAddr, MacAddr), f64>,
    outbox: Vec<(ConnectionId, SwitchCommand)>,
    pub stats: FabricStats,
}

impl Fabric {
    pub fn add_switch(&mut self, dpid: NodeId) {
        self.switches.entry(dpid).or_default();
    }

    pub fn has_switch(&self, dpid: NodeId) -> bool {
        self.switches.contains_key(&dpid)
    }

    /// 设置端口背景负载
    pub fn set_background(&mut self, dpid: NodeId, port: PortNo, bytes_per_sec: f64) -> bool {
        let Some(sw) = self.switches.get_mut(&dpid) else {
            return false;
        };
        sw.background.insert(port, bytes_per_sec);
        sw.tx_bytes.entry(port).or_default();
        true
    }

    /// 建立控制连接，返回新连接句柄
    pub fn connect(&mut self, dpid: NodeId) -> Option<ConnectionId> {
        let sw = self.switches.get_mut(&dpid)?;
        let conn = ConnectionId(self.next_conn);
        self.next_conn += 1;
        sw.conn = Some(conn);
        self.by_conn.insert(conn, dpid);
        debug!(dpid = %dpid, conn = %conn, "仿真交换机已连接");
        Some(conn)
    }

    /// 关闭控制连接。之后发往该连接的命令都会失败。
    pub fn disconnect(&mut self, dpid: NodeId) -> Option<ConnectionId> {
        let conn = self.switches.get_mut(&dpid)?.conn.take()?;
        self.closed.insert(conn);
        debug!(dpid = %dpid, conn = %conn, "仿真交换机连接关闭");
        Some(conn)
    }

    pub fn conn_of(&self, dpid: NodeId) -> Option<ConnectionId> {
        self.switches.get(&dpid).and_then(|s| s.conn)
    }

    pub fn dpid_of(&self, conn: ConnectionId) -> Option<NodeId> {
        self.by_conn.get(&conn).copied()
    }

    pub fn next_buffer_id(&mut self) -> u32 {
        let id = self.next_buffer;
        self.next_buffer = self.next_buffer.wrapping_add(1);
        id
    }

    /// 登记一条流建立后在所经端口上的负载
    pub fn offer(&mut self, src: MacAddr, dst: MacAddr, bytes_per_sec: f64) {
        self.offered.insert((src, dst), bytes_per_sec);
    }

    /// `dpid` 上是否有匹配 (src, dst) 且未过期的流表
    pub fn has_flow(&self, dpid: NodeId, src: MacAddr, dst: MacAddr, now: SimTime) -> bool {
        self.switches.get(&dpid).is_some_and(|sw| {
            sw.flows.iter().any(|f| {
                f.active_at(now) && f.rule.matcher.dl_src == src && f.rule.matcher.dl_dst == dst
            })
        })
    }

    pub fn flow_count(&self, dpid: NodeId) -> usize {
        self.switches.get(&dpid).map_or(0, |s| s.flows.len())
    }

    pub fn take_outbox(&mut self) -> Vec<(ConnectionId, SwitchCommand)> {
        std::mem::take(&mut self.outbox)
    }

    /// 在 `conn` 对应的交换机上安装一条规则。硬超时为 0 表示永不过期。
    pub fn install(&mut self, conn: ConnectionId, rule: FlowRule, now: SimTime) {
        let Some(dpid) = self.dpid_of(conn) else {
            warn!(conn = %conn, "未知连接，忽略流表");
            return;
        };
        let bytes_per_sec = self
            .offered
            .get(&(rule.matcher.dl_src, rule.matcher.dl_dst))
            .copied()
            .unwrap_or(0.0);
        let Some(sw) = self.switches.get_mut(&dpid) else {
            return;
        };
        sw.accrue(now);
        let expires_at = if rule.hard_timeout == 0 {
            SimTime(u64::MAX)
        } else {
            now.after(SimTime::from_secs(rule.hard_timeout as u64))
        };
        sw.flows.push(InstalledFlow {
            rule,
            installed_at: now,
            expires_at,
            bytes_per_sec,
        });
        trace!(dpid = %dpid, out_port = %rule.out_port, expires_at = %expires_at, "安装流表");
    }

    /// 生成端口统计应答（含本地端口）
    pub fn port_stats(&mut self, dpid: NodeId, now: SimTime) -> Option<Vec<PortStat>> {
        Some(self.switches.get_mut(&dpid)?.port_stats(now))
    }
}

impl CommandSink for Fabric {
    fn send(&mut self, conn: ConnectionId, cmd: SwitchCommand) -> Result<(), SendError> {
        if self.closed.contains(&conn) {
            self.stats.rejected_sends += 1;
            return Err(SendError::ConnectionClosed { conn });
        }
        let Some(dpid) = self.dpid_of(conn) else {
            self.stats.rejected_sends += 1;
            return Err(SendError::UnknownConnection { conn });
        };
        match &cmd {
            SwitchCommand::PortStatsRequest => self.stats.stats_requests += 1,
            SwitchCommand::FlowMod(_) => self.stats.flow_mods += 1,
            SwitchCommand::PacketOut(_) => self.stats.packet_outs += 1,
        }
        if let Some(sw) = self.switches.get_mut(&dpid) {
            sw.charge_control();
        }
        self.outbox.push((conn, cmd));
        Ok(())
    }
}
