//! 网络模型模块
//!
//! 此模块包含控制器决策所需的网络模型：标识符、拓扑图、端口利用率、
//! 路径枚举与负载感知选路，以及以太网/ARP 帧。

// 子模块声明
mod id;
mod graph;
mod utilization;
mod paths;
mod select;
mod packet;

// 重新导出公共接口
pub use id::{ConnectionId, MacAddr, NodeId, ParseMacError, PortNo};
pub use graph::{MissingEdge, TopologyGraph};
pub use utilization::UtilizationTracker;
pub use paths::{DEFAULT_MAX_PATH_NODES, Path, all_simple_paths};
pub use select::{LinkTuple, Selection, link_tuples, path_cost, select};
pub use packet::{ArpOp, ArpPacket, ETHERTYPE_ARP, ETHERTYPE_IPV4, Frame, FrameError, Payload};
