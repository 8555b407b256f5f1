use crate::net::{ArpOp, ArpPacket, Frame, FrameError, MacAddr, NodeId, Payload};
use std::net::Ipv4Addr;

#[test]
fn mac_addr_parses_and_prints_colon_hex() {
    let mac: MacAddr = "00:1b:2C:03:04:ff".parse().expect("valid mac");
    assert_eq!(mac, MacAddr([0x00, 0x1b, 0x2c, 0x03, 0x04, 0xff]));
    assert_eq!(mac.to_string(), "00:1b:2c:03:04:ff");

    for bad in ["", "00:11:22:33:44", "00:11:22:33:44:55:66", "0g:11:22:33:44:55", "000:1:2:3:4:5"] {
        assert!(bad.parse::<MacAddr>().is_err(), "accepted {bad:?}");
    }
}

#[test]
fn node_id_derives_from_last_mac_octet() {
    assert_eq!(NodeId::from_mac(MacAddr::from_index(2)), NodeId(2));
    let mac: MacAddr = "aa:bb:cc:dd:ee:0f".parse().expect("valid mac");
    assert_eq!(NodeId::from_mac(mac), NodeId(15));
}

#[test]
fn arp_frame_has_wire_layout() {
    let frame = Frame {
        src: MacAddr::from_index(1),
        dst: MacAddr::BROADCAST,
        payload: Payload::Arp(ArpPacket {
            op: ArpOp::Request,
            sender_mac: MacAddr::from_index(1),
            sender_ip: Ipv4Addr::new(10, 0, 0, 1),
            target_mac: MacAddr([0; 6]),
            target_ip: Ipv4Addr::new(10, 0, 0, 2),
        }),
    };
    let bytes = frame.to_bytes();
    assert_eq!(bytes.len(), 42);
    assert_eq!(&bytes[0..6], &[0xff; 6]);
    assert_eq!(&bytes[12..14], &[0x08, 0x06]);
    // htype ethernet, ptype ipv4, hlen 6, plen 4
    assert_eq!(&bytes[14..20], &[0x00, 0x01, 0x08, 0x00, 6, 4]);
    assert_eq!(&bytes[20..22], &[0x00, 0x01]); // opcode
    assert_eq!(&bytes[38..42], &[10, 0, 0, 2]);

    assert_eq!(Frame::parse(&bytes), Ok(frame));
}

#[test]
fn ipv4_frame_keeps_addresses() {
    let frame = Frame {
        src: MacAddr::from_index(1),
        dst: MacAddr::from_index(2),
        payload: Payload::Ipv4 {
            src: Ipv4Addr::new(10, 0, 0, 1),
            dst: Ipv4Addr::new(10, 0, 0, 2),
        },
    };
    assert!(!frame.is_arp());
    let bytes = frame.to_bytes();
    assert_eq!(bytes.len(), 34);
    assert_eq!(&bytes[12..14], &[0x08, 0x00]);
    assert_eq!(bytes[14], 0x45);
    assert_eq!(Frame::parse(&bytes), Ok(frame));
}

#[test]
fn truncated_frames_are_rejected() {
    assert!(matches!(
        Frame::parse(&[0u8; 10]),
        Err(FrameError::Malformed { layer: "ethernet", .. })
    ));
    let mut arp_hdr = vec![0u8; 12];
    arp_hdr.extend_from_slice(&[0x08, 0x06, 0, 1]);
    assert!(matches!(
        Frame::parse(&arp_hdr),
        Err(FrameError::Malformed { layer: "arp", .. })
    ));
}

#[test]
fn non_ethernet_arp_is_unsupported() {
    let frame = Frame {
        src: MacAddr::from_index(1),
        dst: MacAddr::BROADCAST,
        payload: Payload::Arp(ArpPacket {
            op: ArpOp::Request,
            sender_mac: MacAddr::from_index(1),
            sender_ip: Ipv4Addr::new(10, 0, 0, 1),
            target_mac: MacAddr([0; 6]),
            target_ip: Ipv4Addr::new(10, 0, 0, 2),
        }),
    };
    let mut bytes = frame.to_bytes();
    // hardware type 6 (IEEE 802)
    bytes[15] = 6;
    assert_eq!(Frame::parse(&bytes), Err(FrameError::UnsupportedArp));
}

#[test]
fn unknown_ethertype_keeps_body() {
    let frame = Frame {
        src: MacAddr::from_index(3),
        dst: MacAddr::from_index(4),
        payload: Payload::Other {
            ethertype: 0x88cc,
            data: vec![1, 2, 3],
        },
    };
    let bytes = frame.to_bytes();
    assert_eq!(bytes.len(), 17);
    assert_eq!(&bytes[12..14], &[0x88, 0xcc]);
    assert_eq!(Frame::parse(&bytes), Ok(frame));
}

#[test]
fn connection_ids_sort_by_handle() {
    use crate::net::ConnectionId;
    use std::collections::BTreeSet;

    let closed: BTreeSet<ConnectionId> = [ConnectionId(7), ConnectionId(2), ConnectionId(7)]
        .into_iter()
        .collect();
    assert_eq!(closed.len(), 2);
    assert!(closed.contains(&ConnectionId(2)));
    assert_eq!(closed.first(), Some(&ConnectionId(2)));
}
