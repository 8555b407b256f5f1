use crate::ctl::{
    ControlError, Controller, ControllerConfig, FlowMatch, FlowRule, LinkDiscovered, PacketData,
    PacketIn, PacketInOutcome, PacketOut, PortStat, RecordingSink, SwitchCommand,
};
use crate::net::{ConnectionId, Frame, MacAddr, NodeId, Payload, PortNo};
use crate::topo::diamond::{DiamondOpts, H1_MAC, H2_MAC, S3, S4, S5, S6, build_diamond};
use std::net::Ipv4Addr;

fn conn(dpid: NodeId) -> ConnectionId {
    ConnectionId(100 + dpid.0)
}

/// diamond 拓扑：静态主机链路 + 发现的 4 条交换机链路，4 台交换机都已连接
fn diamond_ctl() -> Controller {
    let spec = build_diamond(&DiamondOpts::default());
    let mut ctl = Controller::new(&spec.controller).expect("valid config");
    for l in &spec.links {
        ctl.on_link_discovered(LinkDiscovered {
            dpid1: l.dpid1,
            port1: l.port1,
            dpid2: l.dpid2,
            port2: l.port2,
        });
    }
    for dpid in [S3, S4, S5, S6] {
        ctl.on_connection_up(dpid, conn(dpid));
    }
    ctl
}

/// 让 `dpid:port` 的速率为 `rate`（interval = 5s）
fn load_port(ctl: &mut Controller, dpid: NodeId, port: u16, rate: u64) {
    ctl.on_stats_received(dpid, &[PortStat { port: PortNo(port), tx_bytes: 1_000 }]);
    ctl.on_stats_received(
        dpid,
        &[PortStat {
            port: PortNo(port),
            tx_bytes: 1_000 + rate * 5,
        }],
    );
}

fn first_packet(src: MacAddr, dst: MacAddr) -> PacketIn {
    PacketIn {
        dpid: S3,
        conn: conn(S3),
        in_port: PortNo(1),
        frame: Frame {
            src,
            dst,
            payload: Payload::Ipv4 {
                src: Ipv4Addr::new(10, 0, 0, 1),
                dst: Ipv4Addr::new(10, 0, 0, 2),
            },
        },
        buffer_id: Some(7),
    }
}

#[test]
fn link_discovery_is_symmetric_and_zeroes_counters() {
    let mut ctl = Controller::new(&ControllerConfig::default()).expect("default config");
    ctl.on_link_discovered(LinkDiscovered {
        dpid1: NodeId(10),
        port1: PortNo(4),
        dpid2: NodeId(11),
        port2: PortNo(9),
    });

    let g = ctl.graph();
    assert_eq!(g.edge_port(NodeId(10), NodeId(11)), Some(PortNo(4)));
    assert_eq!(g.edge_port(NodeId(11), NodeId(10)), Some(PortNo(9)));
    assert_eq!(ctl.utilization().counter(NodeId(10), PortNo(4)), Some(0));
    assert_eq!(ctl.utilization().counter(NodeId(11), PortNo(9)), Some(0));
}

#[test]
fn new_flow_takes_least_loaded_path_and_installs_rules_per_switch() {
    let mut ctl = diamond_ctl();
    load_port(&mut ctl, S4, 2, 1_000_000);

    let mut sink = RecordingSink::default();
    let outcome = ctl.on_packet_in(first_packet(H1_MAC, H2_MAC), &mut sink);

    let PacketInOutcome::Routed { selection, install } = outcome else {
        panic!("expected routed outcome, got {outcome:?}");
    };
    let ids: Vec<u64> = selection.path.iter().map(|n| n.0).collect();
    assert_eq!(ids, vec![1, 3, 5, 6, 2]);
    assert_eq!(selection.cost, 0.0);
    assert_eq!(selection.mean_rejected, Some(1_000_000.0));
    assert_eq!(install.rules_sent, 3);
    assert!(install.packet_out_sent);
    assert!(install.failures.is_empty());

    let matcher = FlowMatch {
        dl_src: H1_MAC,
        dl_dst: H2_MAC,
    };
    let rule = |out_port: u16| {
        SwitchCommand::FlowMod(FlowRule {
            matcher,
            out_port: PortNo(out_port),
            idle_timeout: 3,
            hard_timeout: 6,
        })
    };
    assert_eq!(
        sink.sent,
        vec![
            (conn(S3), rule(3)),
            (
                conn(S3),
                SwitchCommand::PacketOut(PacketOut {
                    data: PacketData::Buffered(7),
                    in_port: None,
                    out_port: PortNo(3),
                })
            ),
            (conn(S5), rule(2)),
            (conn(S6), rule(3)),
        ]
    );
    assert_eq!(ctl.stats.flows_routed, 1);
    assert_eq!(ctl.stats.rules_sent, 3);
}

#[test]
fn equal_cost_paths_prefer_first_discovered() {
    let mut ctl = diamond_ctl();
    let sel = ctl.compute_route(NodeId(1), NodeId(2)).expect("reachable");
    let ids: Vec<u64> = sel.path.iter().map(|n| n.0).collect();
    assert_eq!(ids, vec![1, 3, 4, 6, 2]);
    assert_eq!(sel.candidates, 2);
    assert_eq!(sel.mean_rejected, Some(0.0));

    load_port(&mut ctl, S4, 1, 10);
    let sel = ctl.compute_route(NodeId(1), NodeId(2)).expect("reachable");
    assert!(sel.path.contains(&S5));
}

#[test]
fn installing_same_flow_twice_repeats_identical_commands() {
    let mut ctl = diamond_ctl();
    let mut sink = RecordingSink::default();

    ctl.on_packet_in(first_packet(H1_MAC, H2_MAC), &mut sink);
    let first = sink.sent.len();
    ctl.on_packet_in(first_packet(H1_MAC, H2_MAC), &mut sink);

    assert_eq!(first, 4);
    assert_eq!(sink.sent.len(), 2 * first);
    assert_eq!(sink.sent[..first], sink.sent[first..]);
    assert_eq!(sink.flow_mods().count(), 6);
    assert_eq!(sink.packet_outs().count(), 2);
}

#[test]
fn unreachable_destination_drops_without_side_effects() {
    let mut ctl = diamond_ctl();
    let mut sink = RecordingSink::default();

    let outcome = ctl.on_packet_in(first_packet(H1_MAC, MacAddr::from_index(9)), &mut sink);
    assert_eq!(
        outcome,
        PacketInOutcome::Dropped(ControlError::UnreachableDestination {
            src: NodeId(1),
            dst: NodeId(9),
        })
    );
    assert!(sink.sent.is_empty());
    assert_eq!(ctl.stats.unreachable, 1);
    assert_eq!(ctl.stats.flows_routed, 0);
}

#[test]
fn local_port_stats_never_reach_rate_table() {
    let mut ctl = diamond_ctl();
    ctl.on_stats_received(S3, &[PortStat { port: PortNo::LOCAL, tx_bytes: 1_000 }]);
    ctl.on_stats_received(S3, &[PortStat { port: PortNo::LOCAL, tx_bytes: 90_000 }]);

    assert!(!ctl.utilization().has_rate(S3, PortNo::LOCAL));
    assert_eq!(ctl.utilization().counter(S3, PortNo::LOCAL), None);
    assert_eq!(ctl.stats.stats_replies, 2);
}

#[test]
fn stats_tick_requests_every_connection_and_skips_failures() {
    let mut ctl = diamond_ctl();
    let mut sink = RecordingSink {
        closed: vec![conn(S4)],
        ..RecordingSink::default()
    };

    assert_eq!(ctl.on_stats_tick(&mut sink), 3);
    assert!(sink.sent.iter().all(|(_, c)| *c == SwitchCommand::PortStatsRequest));
    let conns: Vec<ConnectionId> = sink.sent.iter().map(|(c, _)| *c).collect();
    assert_eq!(conns, vec![conn(S3), conn(S5), conn(S6)]);
    assert_eq!(ctl.stats.send_failures, 1);

    // 下一个周期照常重试全部连接
    sink.closed.clear();
    assert_eq!(ctl.on_stats_tick(&mut sink), 4);
}

#[test]
fn connection_down_prunes_only_the_current_connection() {
    let mut ctl = diamond_ctl();
    assert!(!ctl.on_connection_down(S4, ConnectionId(999)));
    assert!(ctl.connections().contains_key(&S4));

    assert!(ctl.on_connection_down(S4, conn(S4)));
    assert!(!ctl.connections().contains_key(&S4));

    let mut sink = RecordingSink::default();
    assert_eq!(ctl.on_stats_tick(&mut sink), 3);
}

#[test]
fn missing_switch_connection_is_reported_but_other_hops_are_installed() {
    let mut ctl = diamond_ctl();
    ctl.on_connection_down(S4, conn(S4));

    let mut sink = RecordingSink::default();
    let PacketInOutcome::Routed { install, .. } =
        ctl.on_packet_in(first_packet(H1_MAC, H2_MAC), &mut sink)
    else {
        panic!("expected routed outcome");
    };
    assert_eq!(install.rules_sent, 2);
    assert_eq!(install.failures, vec![ControlError::NoConnection { dpid: S4 }]);
    assert!(install.packet_out_sent);
    assert_eq!(ctl.stats.send_failures, 1);
}

#[test]
fn arp_is_answered_before_path_pipeline() {
    let mut ctl = diamond_ctl();
    let mut sink = RecordingSink::default();
    let frame = Frame {
        src: H1_MAC,
        dst: MacAddr::BROADCAST,
        payload: Payload::Arp(crate::net::ArpPacket {
            op: crate::net::ArpOp::Request,
            sender_mac: H1_MAC,
            sender_ip: Ipv4Addr::new(10, 0, 0, 1),
            target_mac: MacAddr([0; 6]),
            target_ip: Ipv4Addr::new(10, 0, 0, 2),
        }),
    };
    let ev = PacketIn {
        frame: frame.clone(),
        ..first_packet(H1_MAC, H2_MAC)
    };

    assert_eq!(ctl.on_packet_in(ev.clone(), &mut sink), PacketInOutcome::ArpReplied);
    assert_eq!(sink.sent.len(), 1);
    assert_eq!(sink.flow_mods().count(), 0);
    let (c, out) = sink.packet_outs().next().expect("reply sent");
    assert_eq!(c, conn(S3));
    assert_eq!(out.out_port, PortNo::IN_PORT);

    // 未知地址：记录并丢弃
    let mut unknown = ev;
    if let Payload::Arp(arp) = &mut unknown.frame.payload {
        arp.target_ip = Ipv4Addr::new(10, 0, 0, 50);
    }
    let outcome = ctl.on_packet_in(unknown.clone(), &mut sink);
    assert!(matches!(
        outcome,
        PacketInOutcome::Dropped(ControlError::UnknownAddress { .. })
    ));
    assert_eq!(sink.sent.len(), 1);
    assert_eq!(ctl.stats.arp_unknown, 1);

    // 主机跟踪学到地址后即可应答
    ctl.on_host_learned(Ipv4Addr::new(10, 0, 0, 50), MacAddr::from_index(50));
    assert_eq!(ctl.on_packet_in(unknown, &mut sink), PacketInOutcome::ArpReplied);
    assert_eq!(ctl.stats.arp_replies, 2);
}

#[test]
fn unbuffered_first_packet_is_forwarded_as_raw_frame() {
    let mut ctl = diamond_ctl();
    let mut sink = RecordingSink::default();
    let ev = PacketIn {
        buffer_id: None,
        ..first_packet(H1_MAC, H2_MAC)
    };
    let raw = ev.frame.to_bytes();
    ctl.on_packet_in(ev, &mut sink);

    let (_, out) = sink.packet_outs().next().expect("packet-out");
    assert_eq!(out.data, PacketData::Raw(raw));
}

#[test]
fn decision_log_records_each_route() {
    let mut ctl = diamond_ctl();
    ctl.enable_decision_log();
    load_port(&mut ctl, S5, 2, 400);
    let mut sink = RecordingSink::default();
    ctl.on_packet_in(first_packet(H1_MAC, H2_MAC), &mut sink);

    let log = ctl.decisions().expect("enabled");
    assert_eq!(log.records.len(), 1);
    let rec = &log.records[0];
    assert_eq!((rec.src, rec.dst), (NodeId(1), NodeId(2)));
    assert_eq!(rec.mean_rejected, Some(400.0));

    let json: serde_json::Value =
        serde_json::from_str(&log.to_json().expect("serialize")).expect("valid json");
    assert_eq!(json[0]["path"], serde_json::json!([1, 3, 4, 6, 2]));
}

#[test]
fn unknown_source_is_unreachable_without_enumeration() {
    let mut ctl = diamond_ctl();
    assert_eq!(
        ctl.compute_route(NodeId(9), NodeId(2)),
        Err(ControlError::UnreachableDestination {
            src: NodeId(9),
            dst: NodeId(2),
        })
    );
    // 源不在拓扑中，即使源与目的相同也不构成路径
    assert!(ctl.compute_route(NodeId(9), NodeId(9)).is_err());

    let mut sink = RecordingSink::default();
    let outcome = ctl.on_packet_in(first_packet(MacAddr::from_index(9), H2_MAC), &mut sink);
    assert!(matches!(outcome, PacketInOutcome::Dropped(_)));
    assert!(sink.sent.is_empty());
    assert_eq!(ctl.stats.unreachable, 1);
}

#[test]
fn path_without_switches_is_counted_as_local_route() {
    let mut ctl = diamond_ctl();
    let mut sink = RecordingSink::default();

    let PacketInOutcome::Routed { selection, install } =
        ctl.on_packet_in(first_packet(H1_MAC, H1_MAC), &mut sink)
    else {
        panic!("expected routed outcome");
    };
    assert_eq!(selection.path, vec![NodeId(1)]);
    assert_eq!(selection.mean_rejected, None);
    assert_eq!(install.rules_sent, 0);
    assert!(!install.packet_out_sent);
    assert!(sink.sent.is_empty());
    assert_eq!(ctl.stats.local_routes, 1);
    assert_eq!(ctl.stats.flows_routed, 0);
}
