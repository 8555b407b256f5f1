//! 按 scenario 构建控制器世界并调度初始事件

use crate::ctl::{ConfigError, Controller, LinkDiscovered};
use crate::sim::{ScenarioSpec, SimTime, Simulator};
use tracing::{debug, info};

use super::events::{ConnectionDown, ConnectionUp, HostLearned, HostSend, HostTraffic, LinkUp, StatsTick};
use super::fabric::Fabric;
use super::world::{ControllerWorld, HostAttachment};

/// 构建世界，并把连接、链路发现、统计轮询和主机流量事件放入 `sim`。
///
/// scenario 中引用了不存在的交换机或主机时返回 [`ConfigError::Invalid`]。
pub fn bootstrap(spec: &ScenarioSpec, sim: &mut Simulator) -> Result<ControllerWorld, ConfigError> {
    let ctl = Controller::new(&spec.controller)?;

    let mut fabric = Fabric::default();
    for sw in &spec.switches {
        fabric.add_switch(sw.dpid);
    }
    for load in &spec.port_load {
        if !fabric.set_background(load.dpid, load.port, load.bytes_per_sec as f64) {
            return Err(ConfigError::Invalid(format!(
                "port load references unknown switch {}",
                load.dpid
            )));
        }
    }

    let mut world = ControllerWorld::new(
        ctl,
        fabric,
        SimTime::from_millis(spec.stats_reply_delay_ms),
    );
    for h in &spec.hosts {
        let label = h.name.as_deref().unwrap_or("unnamed");
        if !world.fabric.has_switch(h.switch) {
            return Err(ConfigError::Invalid(format!(
                "host {label} ({}) attached to unknown switch {}",
                h.mac, h.switch
            )));
        }
        debug!(host = label, mac = %h.mac, ip = %h.ip, switch = %h.switch, port = %h.port, "主机接入");
        world.hosts.insert(
            h.mac,
            HostAttachment {
                ip: h.ip,
                switch: h.switch,
                port: h.port,
            },
        );
        if spec.learn_hosts {
            sim.schedule(SimTime::ZERO, HostLearned { ip: h.ip, mac: h.mac });
        }
    }

    for sw in &spec.switches {
        sim.schedule(SimTime::from_millis(sw.connect_at_ms), ConnectionUp { dpid: sw.dpid });
        if let Some(at) = sw.disconnect_at_ms {
            sim.schedule(SimTime::from_millis(at), ConnectionDown { dpid: sw.dpid });
        }
    }
    for l in &spec.links {
        sim.schedule(
            SimTime::from_millis(l.discover_at_ms),
            LinkUp(LinkDiscovered {
                dpid1: l.dpid1,
                port1: l.port1,
                dpid2: l.dpid2,
                port2: l.port2,
            }),
        );
    }

    let interval = SimTime::from_secs(spec.controller.poll_interval_secs);
    sim.schedule(SimTime::ZERO, StatsTick { interval });

    for f in &spec.flows {
        let start = SimTime::from_millis(f.start_ms);
        let data_at = if f.arp_first {
            let target = spec.host_by_mac(f.dst).ok_or_else(|| {
                ConfigError::Invalid(format!("flow destination {} is not a known host", f.dst))
            })?;
            sim.schedule(
                start,
                HostSend {
                    src: f.src,
                    traffic: HostTraffic::ArpRequest {
                        target_ip: target.ip,
                    },
                },
            );
            start.after(SimTime::from_millis(1))
        } else {
            start
        };
        sim.schedule(
            data_at,
            HostSend {
                src: f.src,
                traffic: HostTraffic::Data {
                    dst: f.dst,
                    bytes_per_sec: f.bytes_per_sec,
                },
            },
        );
    }

    info!(
        switches = spec.switches.len(),
        hosts = spec.hosts.len(),
        links = spec.links.len(),
        flows = spec.flows.len(),
        "scenario 已加载"
    );
    Ok(world)
}
