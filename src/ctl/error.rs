//! 控制器错误类型
//!
//! 除启动配置错误外，这里的错误都在本地恢复（记录日志并丢弃），不会向上终止进程。

use std::net::Ipv4Addr;

use crate::net::{ConnectionId, MissingEdge, NodeId};
use thiserror::Error;

/// 下发命令失败（尽力而为，不重试）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// 连接已关闭
    #[error("connection {conn} is closed")]
    ConnectionClosed { conn: ConnectionId },
    /// 传输层不认识该连接
    #[error("connection {conn} is unknown to the transport")]
    UnknownConnection { conn: ConnectionId },
}

/// 处理单个事件时可能出现的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// 源和目的之间没有路径
    #[error("no path from {src} to {dst}")]
    UnreachableDestination { src: NodeId, dst: NodeId },
    /// ARP 目标地址不在地址表中
    #[error("no hardware address known for {ip}")]
    UnknownAddress { ip: Ipv4Addr },
    /// 路径上的交换机没有已注册的连接
    #[error("no connection registered for switch {dpid}")]
    NoConnection { dpid: NodeId },
    #[error(transparent)]
    MissingEdge(#[from] MissingEdge),
    #[error(transparent)]
    Send(#[from] SendError),
}
