//! 控制器统计信息

use serde::Serialize;

/// 控制器事件计数
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStats {
    pub packet_ins: u64,
    pub arp_replies: u64,
    pub arp_unknown: u64,
    pub flows_routed: u64,
    /// 选出的路径上没有交换机（源与目的相同或直连），无需下发
    pub local_routes: u64,
    pub unreachable: u64,
    pub rules_sent: u64,
    pub send_failures: u64,
    pub stats_requests: u64,
    pub stats_replies: u64,
}
