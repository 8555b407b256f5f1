//! 简单路径枚举
//!
//! 用显式栈做深度优先搜索 + 回溯，列出 src 到 dst 的全部无环路径。
//! 最坏情况下是指数级的；这里面对的拓扑只有几十个节点。

use std::collections::HashSet;

use super::graph::TopologyGraph;
use super::id::NodeId;

/// 从源到目的（含两端）的节点序列
pub type Path = Vec<NodeId>;

/// 默认的最大路径长度（节点数）
pub const DEFAULT_MAX_PATH_NODES: usize = 64;

/// 列出 `src` 到 `dst` 的全部简单路径。
///
/// - `src == dst` 时返回单节点路径；
/// - 不可达时返回空列表；
/// - 到达 `dst` 即结束该路径，不再从 `dst` 继续扩展；
/// - 超过 `max_nodes` 个节点的路径被裁掉。
///
/// 结果顺序由 [`TopologyGraph::neighbors`] 的插入顺序决定。
pub fn all_simple_paths(
    graph: &TopologyGraph,
    src: NodeId,
    dst: NodeId,
    max_nodes: usize,
) -> Vec<Path> {
    if src == dst {
        return vec![vec![src]];
    }
    if max_nodes < 2 {
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut path: Path = vec![src];
    let mut on_path: HashSet<NodeId> = HashSet::from([src]);
    // cursor[i]：path[i] 下一个待尝试的邻居下标
    let mut cursor: Vec<usize> = vec![0];

    while let (Some(&cur), Some(&idx)) = (path.last(), cursor.last()) {
        let Some(&next) = graph.neighbors(cur).get(idx) else {
            // 邻居已用尽，回溯
            cursor.pop();
            if let Some(n) = path.pop() {
                on_path.remove(&n);
            }
            continue;
        };
        if let Some(c) = cursor.last_mut() {
            *c += 1;
        }

        if on_path.contains(&next) || path.len() + 1 > max_nodes {
            continue;
        }
        if next == dst {
            let mut found = path.clone();
            found.push(next);
            paths.push(found);
            continue;
        }
        path.push(next);
        on_path.insert(next);
        cursor.push(0);
    }

    paths
}
