//! 仿真事件
//!
//! 把外部协作者（传输层、链路发现、主机跟踪、主机流量）产生的事件交给控制器。

use std::net::Ipv4Addr;

use crate::ctl::{LinkDiscovered, PacketIn, PacketInOutcome};
use crate::net::{ArpOp, ArpPacket, Frame, MacAddr, NodeId, Payload};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::{debug, info, warn};

use super::world::ControllerWorld;

/// 事件：交换机建立控制连接
#[derive(Debug)]
pub struct ConnectionUp {
    pub dpid: NodeId,
}

impl Event for ConnectionUp {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        let w = ControllerWorld::from_world(world);
        match w.fabric.connect(self.dpid) {
            Some(conn) => w.ctl.on_connection_up(self.dpid, conn),
            None => warn!(dpid = %self.dpid, "未知交换机，无法建立连接"),
        }
    }
}

/// 事件：交换机控制连接断开
#[derive(Debug)]
pub struct ConnectionDown {
    pub dpid: NodeId,
}

impl Event for ConnectionDown {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        let w = ControllerWorld::from_world(world);
        if let Some(conn) = w.fabric.disconnect(self.dpid) {
            w.ctl.on_connection_down(self.dpid, conn);
        }
    }
}

/// 事件：链路发现模块上报一条交换机间链路
#[derive(Debug)]
pub struct LinkUp(pub LinkDiscovered);

impl Event for LinkUp {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        ControllerWorld::from_world(world).ctl.on_link_discovered(self.0);
    }
}

/// 事件：主机跟踪模块学到一个地址
#[derive(Debug)]
pub struct HostLearned {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

impl Event for HostLearned {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        ControllerWorld::from_world(world)
            .ctl
            .on_host_learned(self.ip, self.mac);
    }
}

/// 事件：周期性统计轮询，执行后按 `interval` 重新调度自身
#[derive(Debug)]
pub struct StatsTick {
    pub interval: SimTime,
}

impl Event for StatsTick {
    #[tracing::instrument(skip(self, sim, world), fields(now = %sim.now()))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ControllerWorld::from_world(world);
        w.ctl.on_stats_tick(&mut w.fabric);
        sim.schedule_in(self.interval, *self);
    }
}

/// 事件：端口统计应答到达控制器
#[derive(Debug)]
pub struct StatsReply {
    pub dpid: NodeId,
}

impl Event for StatsReply {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = ControllerWorld::from_world(world);
        match w.fabric.port_stats(self.dpid, sim.now()) {
            Some(stats) => w.ctl.on_stats_received(self.dpid, &stats),
            None => warn!(dpid = %self.dpid, "统计应答来自未知交换机"),
        }
    }
}

/// 主机发出的报文
#[derive(Debug, Clone)]
pub enum HostTraffic {
    /// 新流的首包；流建立后在所经端口上产生 `bytes_per_sec` 的负载
    Data { dst: MacAddr, bytes_per_sec: u64 },
    /// 广播 ARP 请求
    ArpRequest { target_ip: Ipv4Addr },
}

/// 事件：主机向其接入交换机发送一个报文
#[derive(Debug)]
pub struct HostSend {
    pub src: MacAddr,
    pub traffic: HostTraffic,
}

impl Event for HostSend {
    #[tracing::instrument(skip(self, sim, world), fields(src = %self.src, now = %sim.now()))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let HostSend { src, traffic } = *self;
        let w = ControllerWorld::from_world(world);
        let now = sim.now();
        let Some(&at) = w.hosts.get(&src) else {
            warn!("未知主机，丢弃报文");
            return;
        };

        let frame = match traffic {
            HostTraffic::Data { dst, bytes_per_sec } => {
                w.fabric.offer(src, dst, bytes_per_sec as f64);
                if w.fabric.has_flow(at.switch, src, dst, now) {
                    w.fabric.stats.dataplane_hits += 1;
                    debug!("命中已有流表，报文在数据面转发");
                    return;
                }
                let dst_ip = w
                    .hosts
                    .get(&dst)
                    .map_or(Ipv4Addr::UNSPECIFIED, |h| h.ip);
                Frame {
                    src,
                    dst,
                    payload: Payload::Ipv4 {
                        src: at.ip,
                        dst: dst_ip,
                    },
                }
            }
            HostTraffic::ArpRequest { target_ip } => Frame {
                src,
                dst: MacAddr::BROADCAST,
                payload: Payload::Arp(ArpPacket {
                    op: ArpOp::Request,
                    sender_mac: src,
                    sender_ip: at.ip,
                    target_mac: MacAddr([0; 6]),
                    target_ip,
                }),
            },
        };

        let Some(conn) = w.fabric.conn_of(at.switch) else {
            warn!(switch = %at.switch, "接入交换机没有控制连接，报文丢弃");
            return;
        };
        let buffer_id = w.fabric.next_buffer_id();
        let ev = PacketIn {
            dpid: at.switch,
            conn,
            in_port: at.port,
            frame,
            buffer_id: Some(buffer_id),
        };
        match w.ctl.on_packet_in(ev, &mut w.fabric) {
            PacketInOutcome::Routed { selection, install } => info!(
                path = ?selection.path,
                rules = install.rules_sent,
                failures = install.failures.len(),
                "新流已处理"
            ),
            outcome => debug!(outcome = ?outcome, "packet-in 已处理"),
        }
    }
}
