//! 沿选定路径下发流表
//!
//! 对路径上的每个交换机（`path[1..len-1]`）下发一条按 (src, dst) 硬件地址匹配的规则，
//! 并把触发选路的报文直接从第一跳的出端口发出，而不是等新规则生效后再匹配。

use std::collections::BTreeMap;

use crate::net::{ConnectionId, MacAddr, NodeId, TopologyGraph};
use tracing::{debug, warn};

use super::command::{CommandSink, FlowMatch, FlowRule, PacketData, PacketOut, SwitchCommand};
use super::error::ControlError;

/// 规则超时设置（秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimeouts {
    pub idle: u16,
    pub hard: u16,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self { idle: 3, hard: 6 }
    }
}

/// 一次下发的结果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InstallReport {
    pub rules_sent: usize,
    pub packet_out_sent: bool,
    /// 发送失败（连接缺失/关闭、缺边），均不重试
    pub failures: Vec<ControlError>,
}

/// 触发本次选路的报文
#[derive(Debug, Clone)]
pub struct TriggerPacket {
    pub conn: ConnectionId,
    pub data: PacketData,
    pub dl_src: MacAddr,
    pub dl_dst: MacAddr,
}

/// 沿 `path` 下发流表。所有发送都是尽力而为：失败只记录，不中断后续跳。
pub fn install_path(
    graph: &TopologyGraph,
    connections: &BTreeMap<NodeId, ConnectionId>,
    path: &[NodeId],
    trigger: &TriggerPacket,
    timeouts: FlowTimeouts,
    sink: &mut dyn CommandSink,
) -> InstallReport {
    let mut report = InstallReport::default();
    if path.len() < 3 {
        debug!(path = ?path, "路径上没有交换机，不下发流表");
        return report;
    }

    for i in 1..path.len() - 1 {
        let (cur, next) = (path[i], path[i + 1]);
        let out_port = match graph.require_port(cur, next) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "跳过缺边的一跳");
                report.failures.push(e.into());
                continue;
            }
        };

        let rule = FlowRule {
            matcher: FlowMatch {
                dl_src: trigger.dl_src,
                dl_dst: trigger.dl_dst,
            },
            out_port,
            idle_timeout: timeouts.idle,
            hard_timeout: timeouts.hard,
        };
        match connections.get(&cur) {
            Some(&conn) => match sink.send(conn, SwitchCommand::FlowMod(rule)) {
                Ok(()) => {
                    report.rules_sent += 1;
                    debug!(switch = %cur, out_port = %out_port, "下发流表");
                }
                Err(e) => {
                    warn!(switch = %cur, error = %e, "流表下发失败");
                    report.failures.push(e.into());
                }
            },
            None => {
                warn!(switch = %cur, "交换机没有控制连接，跳过流表");
                report.failures.push(ControlError::NoConnection { dpid: cur });
            }
        }

        // 首包直接从第一跳出端口发出
        if i == 1 {
            let out = PacketOut {
                data: trigger.data.clone(),
                in_port: None,
                out_port,
            };
            match sink.send(trigger.conn, SwitchCommand::PacketOut(out)) {
                Ok(()) => report.packet_out_sent = true,
                Err(e) => {
                    warn!(error = %e, "首包 packet-out 失败");
                    report.failures.push(e.into());
                }
            }
        }
    }

    report
}
