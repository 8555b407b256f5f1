//! 控制器核心
//!
//! 持有拓扑图、端口利用率、连接表与地址表；所有事件处理都以 `&mut self` 执行到底，
//! 彼此之间不会交错，因此不需要任何锁。

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::net::{
    ConnectionId, MacAddr, NodeId, Selection, TopologyGraph, UtilizationTracker,
    all_simple_paths, link_tuples, path_cost, select,
};
use tracing::{debug, info, trace, warn};

use super::arp::AddressResolver;
use super::command::{CommandSink, PacketData, SwitchCommand};
use super::config::{ConfigError, ControllerConfig};
use super::decision::DecisionLog;
use super::error::ControlError;
use super::event::{LinkDiscovered, PacketIn, PortStat};
use super::flow::{FlowTimeouts, InstallReport, TriggerPacket, install_path};
use super::stats::ControllerStats;

/// 一次 packet-in 的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum PacketInOutcome {
    /// 已代答 ARP 请求
    ArpReplied,
    /// ARP 应答等，无需处理
    ArpIgnored,
    /// 选路并下发了流表
    Routed {
        selection: Selection,
        install: InstallReport,
    },
    /// 无法处理，报文被丢弃
    Dropped(ControlError),
}

/// 负载感知选路控制器
#[derive(Debug)]
pub struct Controller {
    graph: TopologyGraph,
    util: UtilizationTracker,
    resolver: AddressResolver,
    connections: BTreeMap<NodeId, ConnectionId>,
    timeouts: FlowTimeouts,
    max_path_nodes: usize,
    poll_interval_secs: u64,
    pub stats: ControllerStats,
    decisions: Option<DecisionLog>,
}

impl Controller {
    /// 按配置构造：校验配置、注入静态链路与地址表。
    pub fn new(cfg: &ControllerConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let mut graph = TopologyGraph::new();
        for l in &cfg.static_links {
            graph.add_edge(l.from, l.to, l.port);
        }
        let resolver =
            AddressResolver::new(cfg.static_address_table.iter().map(|e| (e.ip, e.mac)));

        info!(
            static_edges = graph.edge_count(),
            addresses = resolver.len(),
            poll_interval_secs = cfg.poll_interval_secs,
            "🚦 控制器初始化完成"
        );

        Ok(Self {
            graph,
            util: UtilizationTracker::new(cfg.poll_interval_secs),
            resolver,
            connections: BTreeMap::new(),
            timeouts: FlowTimeouts {
                idle: cfg.idle_timeout_secs,
                hard: cfg.hard_timeout_secs,
            },
            max_path_nodes: cfg.max_path_nodes,
            poll_interval_secs: cfg.poll_interval_secs,
            stats: ControllerStats::default(),
            decisions: None,
        })
    }

    /// 开启选路决策记录
    pub fn enable_decision_log(&mut self) {
        self.decisions.get_or_insert_with(DecisionLog::default);
    }

    pub fn decisions(&self) -> Option<&DecisionLog> {
        self.decisions.as_ref()
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn utilization(&self) -> &UtilizationTracker {
        &self.util
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn connections(&self) -> &BTreeMap<NodeId, ConnectionId> {
        &self.connections
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    /// 交换机连接建立
    #[tracing::instrument(skip(self))]
    pub fn on_connection_up(&mut self, dpid: NodeId, conn: ConnectionId) {
        if let Some(old) = self.connections.insert(dpid, conn) {
            debug!(old = %old, "替换旧连接");
        }
        info!(connections = self.connections.len(), "🔌 交换机已连接");
    }

    /// 交换机连接断开。只有 `conn` 仍是该交换机的当前连接时才移除。
    #[tracing::instrument(skip(self))]
    pub fn on_connection_down(&mut self, dpid: NodeId, conn: ConnectionId) -> bool {
        if self.connections.get(&dpid) != Some(&conn) {
            debug!("连接已被替换或不存在，忽略");
            return false;
        }
        self.connections.remove(&dpid);
        info!(connections = self.connections.len(), "交换机连接断开");
        true
    }

    /// 发现链路：加入两个方向的边，并把两端计数器清零。
    #[tracing::instrument(skip(self), fields(dpid1 = %ev.dpid1, dpid2 = %ev.dpid2))]
    pub fn on_link_discovered(&mut self, ev: LinkDiscovered) {
        self.graph.add_link(ev.dpid1, ev.port1, ev.dpid2, ev.port2);
        self.util.reset_counter(ev.dpid1, ev.port1);
        self.util.reset_counter(ev.dpid2, ev.port2);
        info!(port1 = %ev.port1, port2 = %ev.port2, "🔗 发现链路");
    }

    /// 主机地址学习
    pub fn on_host_learned(&mut self, ip: Ipv4Addr, mac: MacAddr) {
        self.resolver.learn(ip, mac);
    }

    /// 轮询周期到：向每个已知连接发一次端口统计请求。
    ///
    /// 发送失败只记录，本周期不重试；下个周期按届时的连接表重新发送。
    /// 返回成功发出的请求数。
    #[tracing::instrument(skip(self, sink))]
    pub fn on_stats_tick(&mut self, sink: &mut dyn CommandSink) -> usize {
        let mut sent = 0;
        for (&dpid, &conn) in &self.connections {
            match sink.send(conn, SwitchCommand::PortStatsRequest) {
                Ok(()) => sent += 1,
                Err(e) => {
                    self.stats.send_failures += 1;
                    warn!(dpid = %dpid, error = %e, "端口统计请求发送失败");
                }
            }
        }
        self.stats.stats_requests += sent as u64;
        debug!(sent, connections = self.connections.len(), "📊 已发出端口统计请求");
        sent
    }

    /// 端口统计应答：逐项交给利用率跟踪器（本地端口会被忽略）。
    #[tracing::instrument(skip(self, stats), fields(entries = stats.len()))]
    pub fn on_stats_received(&mut self, dpid: NodeId, stats: &[PortStat]) {
        self.stats.stats_replies += 1;
        for s in stats {
            self.util.sample(dpid, s.port, s.tx_bytes);
        }
        trace!("端口统计已更新");
    }

    /// 计算 `src` 到 `dst` 的最优路径。
    pub fn compute_route(&self, src: NodeId, dst: NodeId) -> Result<Selection, ControlError> {
        if !self.graph.contains_node(src) {
            debug!(src = %src, "源节点不在拓扑中");
            return Err(ControlError::UnreachableDestination { src, dst });
        }
        let paths = all_simple_paths(&self.graph, src, dst, self.max_path_nodes);

        let mut candidates = Vec::with_capacity(paths.len());
        for path in paths {
            match link_tuples(&self.graph, &path) {
                Ok(links) => {
                    let cost = path_cost(&self.util, &links);
                    trace!(path = ?path, cost, "候选路径");
                    candidates.push((path, cost));
                }
                Err(e) => warn!(path = ?path, error = %e, "候选路径缺少反向边，跳过"),
            }
        }

        select(candidates).ok_or(ControlError::UnreachableDestination { src, dst })
    }

    /// 交换机上送报文：ARP 走代答，其余按新流选路并下发流表。
    #[tracing::instrument(skip(self, ev, sink), fields(dpid = %ev.dpid, in_port = %ev.in_port, src = %ev.frame.src, dst = %ev.frame.dst))]
    pub fn on_packet_in(&mut self, ev: PacketIn, sink: &mut dyn CommandSink) -> PacketInOutcome {
        self.stats.packet_ins += 1;

        if ev.frame.is_arp() {
            return self.handle_arp(&ev, sink);
        }

        let src = NodeId::from_mac(ev.frame.src);
        let dst = NodeId::from_mac(ev.frame.dst);
        let selection = match self.compute_route(src, dst) {
            Ok(s) => s,
            Err(e) => {
                self.stats.unreachable += 1;
                warn!(error = %e, "无可用路径，丢弃报文");
                return PacketInOutcome::Dropped(e);
            }
        };

        info!(
            path = ?selection.path,
            cost = selection.cost,
            mean_rejected = ?selection.mean_rejected,
            candidates = selection.candidates,
            "🧭 选定最优路径"
        );
        if let Some(log) = &mut self.decisions {
            log.push(src, dst, &selection);
        }

        let trigger = TriggerPacket {
            conn: ev.conn,
            data: match ev.buffer_id {
                Some(id) => PacketData::Buffered(id),
                None => PacketData::Raw(ev.frame.to_bytes()),
            },
            dl_src: ev.frame.src,
            dl_dst: ev.frame.dst,
        };
        let install = install_path(
            &self.graph,
            &self.connections,
            &selection.path,
            &trigger,
            self.timeouts,
            sink,
        );

        if selection.path.len() < 3 {
            self.stats.local_routes += 1;
        } else {
            self.stats.flows_routed += 1;
        }
        self.stats.rules_sent += install.rules_sent as u64;
        self.stats.send_failures += install.failures.len() as u64;
        PacketInOutcome::Routed { selection, install }
    }

    fn handle_arp(&mut self, ev: &PacketIn, sink: &mut dyn CommandSink) -> PacketInOutcome {
        match self.resolver.answer(&ev.frame, ev.in_port) {
            Ok(Some(out)) => match sink.send(ev.conn, SwitchCommand::PacketOut(out)) {
                Ok(()) => {
                    self.stats.arp_replies += 1;
                    PacketInOutcome::ArpReplied
                }
                Err(e) => {
                    self.stats.send_failures += 1;
                    warn!(error = %e, "ARP 应答发送失败");
                    PacketInOutcome::Dropped(e.into())
                }
            },
            Ok(None) => PacketInOutcome::ArpIgnored,
            Err(e) => {
                self.stats.arp_unknown += 1;
                warn!(error = %e, "ARP 目标未知，丢弃请求");
                PacketInOutcome::Dropped(e)
            }
        }
    }
}
