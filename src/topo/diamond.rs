//! Diamond 拓扑构建
//!
//! 拓扑结构：
//!
//! ```text
//!            s4
//!          /    \
//!   h1 - s3      s6 - h2
//!          \    /
//!            s5
//! ```
//!
//! 主机侧链路是静态注入的，交换机之间的四条链路在 t=0 由链路发现上报。

use std::net::Ipv4Addr;

use crate::ctl::{AddressEntry, ControllerConfig, StaticLink};
use crate::net::{MacAddr, NodeId, PortNo};
use crate::sim::{FlowSpec, HostSpec, LinkSpec, PortLoadSpec, ScenarioSpec, SwitchSpec};

pub const H1: NodeId = NodeId(1);
pub const H2: NodeId = NodeId(2);
pub const S3: NodeId = NodeId(3);
pub const S4: NodeId = NodeId(4);
pub const S5: NodeId = NodeId(5);
pub const S6: NodeId = NodeId(6);

pub const H1_MAC: MacAddr = MacAddr::from_index(1);
pub const H2_MAC: MacAddr = MacAddr::from_index(2);

/// Diamond 拓扑配置选项
#[derive(Debug, Clone)]
pub struct DiamondOpts {
    /// s4 -> s6 方向的背景负载（bytes/s）
    pub upper_load: u64,
    /// s5 -> s6 方向的背景负载（bytes/s）
    pub lower_load: u64,
    /// 每条主机流建立后的负载（bytes/s）
    pub flow_bytes_per_sec: u64,
    pub poll_interval_secs: u64,
    /// h1 -> h2 的开始时间；h2 -> h1 在其后 8 秒开始
    pub flow_start_ms: u64,
}

impl Default for DiamondOpts {
    fn default() -> Self {
        Self {
            upper_load: 1_000_000,
            lower_load: 0,
            flow_bytes_per_sec: 250_000,
            poll_interval_secs: 5,
            flow_start_ms: 12_000,
        }
    }
}

/// 构建 diamond scenario
pub fn build_diamond(opts: &DiamondOpts) -> ScenarioSpec {
    let h1_ip = Ipv4Addr::new(10, 0, 0, 1);
    let h2_ip = Ipv4Addr::new(10, 0, 0, 2);

    let edge = |from: NodeId, to: NodeId, port: u16| StaticLink {
        from,
        to,
        port: PortNo(port),
    };
    let controller = ControllerConfig {
        poll_interval_secs: opts.poll_interval_secs,
        static_links: vec![edge(H1, S3, 0), edge(S3, H1, 1), edge(H2, S6, 0), edge(S6, H2, 3)],
        static_address_table: vec![
            AddressEntry { ip: h1_ip, mac: H1_MAC },
            AddressEntry { ip: h2_ip, mac: H2_MAC },
        ],
        ..ControllerConfig::default()
    };

    let link = |dpid1: NodeId, port1: u16, dpid2: NodeId, port2: u16| LinkSpec {
        dpid1,
        port1: PortNo(port1),
        dpid2,
        port2: PortNo(port2),
        discover_at_ms: 0,
    };

    let mut port_load = Vec::new();
    for (dpid, load) in [(S4, opts.upper_load), (S5, opts.lower_load)] {
        if load > 0 {
            port_load.push(PortLoadSpec {
                dpid,
                port: PortNo(2),
                bytes_per_sec: load,
            });
        }
    }

    ScenarioSpec {
        controller,
        switches: [S3, S4, S5, S6]
            .into_iter()
            .map(|dpid| SwitchSpec {
                dpid,
                connect_at_ms: 0,
                disconnect_at_ms: None,
            })
            .collect(),
        hosts: vec![
            HostSpec {
                name: Some("h1".into()),
                mac: H1_MAC,
                ip: h1_ip,
                switch: S3,
                port: PortNo(1),
            },
            HostSpec {
                name: Some("h2".into()),
                mac: H2_MAC,
                ip: h2_ip,
                switch: S6,
                port: PortNo(3),
            },
        ],
        links: vec![link(S3, 2, S4, 1), link(S4, 2, S6, 1), link(S3, 3, S5, 1), link(S5, 2, S6, 2)],
        port_load,
        flows: vec![
            FlowSpec {
                src: H1_MAC,
                dst: H2_MAC,
                start_ms: opts.flow_start_ms,
                bytes_per_sec: opts.flow_bytes_per_sec,
                arp_first: true,
            },
            FlowSpec {
                src: H2_MAC,
                dst: H1_MAC,
                start_ms: opts.flow_start_ms + 8_000,
                bytes_per_sec: opts.flow_bytes_per_sec,
                arp_first: true,
            },
        ],
        stats_reply_delay_ms: 10,
        learn_hosts: false,
    }
}
