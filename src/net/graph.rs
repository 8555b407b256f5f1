//! 拓扑图
//!
//! 以 `(from, to) -> 出端口` 的有向边保存网络邻接关系。
//! 静态的主机侧链路在启动时注入，交换机之间的链路由发现事件动态加入。

use std::collections::HashMap;

use super::id::{NodeId, PortNo};
use thiserror::Error;
use tracing::{debug, trace};

/// 有向拓扑图
#[derive(Debug, Default, Clone)]
pub struct TopologyGraph {
    edges: HashMap<(NodeId, NodeId), PortNo>,
    /// from -> 按插入顺序排列的邻居（保证路径枚举顺序稳定）
    adj: HashMap<NodeId, Vec<NodeId>>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条有向边。已存在的边只更新端口，邻居顺序不变。
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, port: PortNo) {
        if self.edges.insert((from, to), port).is_none() {
            self.adj.entry(from).or_default().push(to);
            trace!(from = %from, to = %to, port = %port, "新增有向边");
        } else {
            trace!(from = %from, to = %to, port = %port, "更新有向边端口");
        }
    }

    /// 添加一条双向链路：`dpid1 --port1--> dpid2` 与 `dpid2 --port2--> dpid1`。
    pub fn add_link(&mut self, dpid1: NodeId, port1: PortNo, dpid2: NodeId, port2: PortNo) {
        self.add_edge(dpid1, dpid2, port1);
        self.add_edge(dpid2, dpid1, port2);
        debug!(
            dpid1 = %dpid1,
            port1 = %port1,
            dpid2 = %dpid2,
            port2 = %port2,
            edges = self.edges.len(),
            "链路已加入拓扑"
        );
    }

    /// 从 `node` 出发一跳可达的所有节点
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adj.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// 有向边 `from -> to` 在 `from` 侧的出端口
    pub fn edge_port(&self, from: NodeId, to: NodeId) -> Option<PortNo> {
        self.edges.get(&(from, to)).copied()
    }

    /// 与 [`TopologyGraph::edge_port`] 相同，但缺边时返回错误。
    pub fn require_port(&self, from: NodeId, to: NodeId) -> Result<PortNo, MissingEdge> {
        self.edge_port(from, to).ok_or(MissingEdge { from, to })
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.adj.contains_key(&node)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// 路径上引用了拓扑中不存在的有向边
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no edge {from} -> {to} in topology")]
pub struct MissingEdge {
    pub from: NodeId,
    pub to: NodeId,
}
