use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::ctl::{ConfigError, ControllerConfig};
use crate::net::{MacAddr, NodeId, PortNo};
use serde::{Deserialize, Serialize};

/// 一次仿真运行的完整描述（scenario.json）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub controller: ControllerConfig,
    pub switches: Vec<SwitchSpec>,
    #[serde(default)]
    pub hosts: Vec<HostSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub port_load: Vec<PortLoadSpec>,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    /// 统计请求到应答到达控制器的往返时延（毫秒）
    #[serde(default = "default_stats_reply_delay_ms")]
    pub stats_reply_delay_ms: u64,
    /// 为 true 时在 t=0 把所有主机地址上报给控制器（模拟主机跟踪模块）
    #[serde(default)]
    pub learn_hosts: bool,
}

fn default_stats_reply_delay_ms() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchSpec {
    pub dpid: NodeId,
    #[serde(default)]
    pub connect_at_ms: u64,
    #[serde(default)]
    pub disconnect_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    /// 主机所连的交换机及端口
    pub switch: NodeId,
    pub port: PortNo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub dpid1: NodeId,
    pub port1: PortNo,
    pub dpid2: NodeId,
    pub port2: PortNo,
    #[serde(default)]
    pub discover_at_ms: u64,
}

/// 某交换机端口上的背景发送负载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortLoadSpec {
    pub dpid: NodeId,
    pub port: PortNo,
    pub bytes_per_sec: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub src: MacAddr,
    pub dst: MacAddr,
    pub start_ms: u64,
    /// 流建立后在所经端口上产生的发送负载
    #[serde(default)]
    pub bytes_per_sec: u64,
    /// 先发 ARP 请求解析目的地址
    #[serde(default)]
    pub arp_first: bool,
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        spec.controller.validate()?;
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn host_by_mac(&self, mac: MacAddr) -> Option<&HostSpec> {
        self.hosts.iter().find(|h| h.mac == mac)
    }
}
