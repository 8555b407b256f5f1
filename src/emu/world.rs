//! 控制器世界实现
//!
//! 持有控制器与仿真交换机；每个事件结束后处理仿真交换机收到的下行命令。

use std::any::Any;
use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::ctl::{Controller, SwitchCommand};
use crate::net::{MacAddr, NodeId, PortNo};
use crate::sim::{SimTime, Simulator, World};
use tracing::{debug, trace};

use super::events::StatsReply;
use super::fabric::Fabric;

/// 主机接入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostAttachment {
    pub ip: Ipv4Addr,
    pub switch: NodeId,
    pub port: PortNo,
}

pub struct ControllerWorld {
    pub ctl: Controller,
    pub fabric: Fabric,
    pub hosts: HashMap<MacAddr, HostAttachment>,
    /// 统计请求发出后多久应答到达控制器
    pub stats_reply_delay: SimTime,
}

impl ControllerWorld {
    pub fn new(ctl: Controller, fabric: Fabric, stats_reply_delay: SimTime) -> Self {
        Self {
            ctl,
            fabric,
            hosts: HashMap::new(),
            stats_reply_delay,
        }
    }

    /// 事件里取回具体的世界类型
    pub(crate) fn from_world(world: &mut dyn World) -> &mut ControllerWorld {
        world
            .as_any_mut()
            .downcast_mut::<ControllerWorld>()
            .expect("world must be ControllerWorld")
    }
}

impl World for ControllerWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn after_event(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        for (conn, cmd) in self.fabric.take_outbox() {
            match cmd {
                SwitchCommand::PortStatsRequest => {
                    if let Some(dpid) = self.fabric.dpid_of(conn) {
                        trace!(dpid = %dpid, "调度端口统计应答");
                        sim.schedule_in(self.stats_reply_delay, StatsReply { dpid });
                    }
                }
                SwitchCommand::FlowMod(rule) => self.fabric.install(conn, rule, now),
                SwitchCommand::PacketOut(out) => {
                    debug!(conn = %conn, out_port = %out.out_port, "交换机发出 packet-out");
                }
            }
        }
    }
}
