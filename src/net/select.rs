//! 负载感知的路径选择
//!
//! 每条候选路径的代价 = 路径上每一跳两侧端口速率之和的累加；
//! 取代价最小者（代价相同时先出现者胜出）。

use super::graph::{MissingEdge, TopologyGraph};
use super::id::{NodeId, PortNo};
use super::paths::Path;
use super::utilization::UtilizationTracker;
use serde::Serialize;

/// 路径上的一跳：`(dpid_a, port_a, dpid_b, port_b)`，两侧各自的出端口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTuple {
    pub dpid_a: NodeId,
    pub port_a: PortNo,
    pub dpid_b: NodeId,
    pub port_b: PortNo,
}

/// 把路径转换为逐跳的 [`LinkTuple`]。两个方向的边都必须存在。
pub fn link_tuples(graph: &TopologyGraph, path: &[NodeId]) -> Result<Vec<LinkTuple>, MissingEdge> {
    path.windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            Ok(LinkTuple {
                dpid_a: a,
                port_a: graph.require_port(a, b)?,
                dpid_b: b,
                port_b: graph.require_port(b, a)?,
            })
        })
        .collect()
}

/// 路径聚合利用率：Σ rate(a, port_a) + rate(b, port_b)
pub fn path_cost(tracker: &UtilizationTracker, links: &[LinkTuple]) -> f64 {
    links
        .iter()
        .map(|l| tracker.rate(l.dpid_a, l.port_a) + tracker.rate(l.dpid_b, l.port_b))
        .sum()
}

/// 选路结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub path: Path,
    pub cost: f64,
    /// 其余候选路径的平均代价；只有一条候选时为 `None`
    pub mean_rejected: Option<f64>,
    /// 参与比较的候选路径数
    pub candidates: usize,
}

/// 在 `(路径, 代价)` 候选中选出代价最小的一条。候选为空时返回 `None`。
pub fn select(candidates: Vec<(Path, f64)>) -> Option<Selection> {
    let n = candidates.len();
    let total: f64 = candidates.iter().map(|(_, c)| *c).sum();

    let mut best: Option<(Path, f64)> = None;
    for (path, cost) in candidates {
        match &best {
            Some((_, best_cost)) if cost >= *best_cost => {}
            _ => best = Some((path, cost)),
        }
    }

    let (path, cost) = best?;
    let mean_rejected = if n > 1 {
        Some((total - cost) / (n - 1) as f64)
    } else {
        None
    };
    Some(Selection {
        path,
        cost,
        mean_rejected,
        candidates: n,
    })
}
