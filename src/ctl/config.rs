//! 控制器配置
//!
//! 静态链路与地址表在构造时注入；核心不关心它们是写死的还是由外部协作者学到的。

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::net::{DEFAULT_MAX_PATH_NODES, MacAddr, NodeId, PortNo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::flow::FlowTimeouts;

/// 一条静态有向边（通常是主机与交换机之间的链路，两个方向各一条）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticLink {
    pub from: NodeId,
    pub to: NodeId,
    pub port: PortNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// 端口统计轮询周期（秒）
    pub poll_interval_secs: u64,
    pub static_links: Vec<StaticLink>,
    pub static_address_table: Vec<AddressEntry>,
    pub idle_timeout_secs: u16,
    pub hard_timeout_secs: u16,
    /// 路径枚举允许的最大节点数
    pub max_path_nodes: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let timeouts = FlowTimeouts::default();
        Self {
            poll_interval_secs: 5,
            static_links: Vec::new(),
            static_address_table: Vec::new(),
            idle_timeout_secs: timeouts.idle,
            hard_timeout_secs: timeouts.hard,
            max_path_nodes: DEFAULT_MAX_PATH_NODES,
        }
    }
}

/// 启动配置错误：唯一会导致进程退出的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ControllerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: ControllerConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be positive".into(),
            ));
        }
        if self.max_path_nodes == 0 {
            return Err(ConfigError::Invalid(
                "max_path_nodes must be positive".into(),
            ));
        }
        if let Some(l) = self.static_links.iter().find(|l| l.port.is_local()) {
            return Err(ConfigError::Invalid(format!(
                "static link {} -> {} uses the reserved local port",
                l.from, l.to
            )));
        }
        Ok(())
    }
}
