#![allow(dead_code)]
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;

use bytes::Bytes;
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::MutableIpv4Packet;
use pnet_packet::ipv6::MutableIpv6Packet;
use pnet_packet::tcp::MutableTcpPacket;
use pnet_packet::udp::MutableUdpPacket;
use tun_offload::PacketWriter;

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ipv4_header(buf: &mut [u8], protocol: pnet_packet::ip::IpNextHeaderProtocol) {
    let total_len = buf.len() as u16;
    let mut ip = MutableIpv4Packet::new(buf).unwrap();
    ip.set_version(4);
    ip.set_header_length(5);
    ip.set_total_length(total_len);
    ip.set_ttl(64);
    ip.set_next_level_protocol(protocol);
    ip.set_source(Ipv4Addr::new(10, 26, 1, 100));
    ip.set_destination(Ipv4Addr::new(10, 26, 1, 101));
}

/// IPv4/TCP packet whose last payload byte is `tag`.
pub fn tcp_v4(src_port: u16, ack: u32, payload_len: usize, tag: u8) -> Vec<u8> {
    let mut buf = vec![0u8; 40 + payload_len.max(1)];
    ipv4_header(&mut buf[..], IpNextHeaderProtocols::Tcp);
    let mut tcp = MutableTcpPacket::new(&mut buf[20..]).unwrap();
    tcp.set_source(src_port);
    tcp.set_destination(443);
    tcp.set_sequence(1000);
    tcp.set_acknowledgement(ack);
    tcp.set_data_offset(5);
    *buf.last_mut().unwrap() = tag;
    buf
}

/// IPv4/UDP packet whose last payload byte is `tag`.
pub fn udp_v4(src_port: u16, tag: u8) -> Vec<u8> {
    let mut buf = vec![0u8; 28 + 16];
    ipv4_header(&mut buf[..], IpNextHeaderProtocols::Udp);
    let mut udp = MutableUdpPacket::new(&mut buf[20..]).unwrap();
    udp.set_source(src_port);
    udp.set_destination(8080);
    udp.set_length(8 + 16);
    *buf.last_mut().unwrap() = tag;
    buf
}

/// IPv6/UDP packet whose last payload byte is `tag`.
pub fn udp_v6(src_port: u16, tag: u8) -> Vec<u8> {
    let mut buf = vec![0u8; 48 + 16];
    {
        let mut ip = MutableIpv6Packet::new(&mut buf[..]).unwrap();
        ip.set_version(6);
        ip.set_payload_length(8 + 16);
        ip.set_next_header(IpNextHeaderProtocols::Udp);
        ip.set_hop_limit(64);
        ip.set_source("CDCD:910A:2222:5498:8475:1112:1900:2025".parse::<Ipv6Addr>().unwrap());
        ip.set_destination("CDCD:910A:2222:5498:8475:1112:1900:2024".parse::<Ipv6Addr>().unwrap());
    }
    let mut udp = MutableUdpPacket::new(&mut buf[40..]).unwrap();
    udp.set_source(src_port);
    udp.set_destination(8080);
    udp.set_length(8 + 16);
    *buf.last_mut().unwrap() = tag;
    buf
}

/// IPv4/ICMP echo request whose last byte is `tag`.
pub fn icmp_v4(tag: u8) -> Vec<u8> {
    let mut buf = vec![0u8; 28];
    ipv4_header(&mut buf[..], IpNextHeaderProtocols::Icmp);
    buf[20] = 8;
    *buf.last_mut().unwrap() = tag;
    buf
}

pub fn tags(call: &[Vec<u8>]) -> Vec<u8> {
    call.iter().map(|pkt| *pkt.last().unwrap()).collect()
}

/// Records every transport call; packets carrying `fail_tag` are rejected.
#[derive(Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<Vec<Vec<u8>>>>,
    pub fail_tag: Option<u8>,
}

impl Recorder {
    pub fn failing(tag: u8) -> Self {
        Recorder {
            calls: Mutex::new(Vec::new()),
            fail_tag: Some(tag),
        }
    }
    pub fn batches(&self) -> Vec<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| tags(call))
            .collect()
    }
    fn check(&self, buf: &[u8]) -> io::Result<()> {
        if self.fail_tag.is_some() && buf.last().copied() == self.fail_tag {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "rejected"));
        }
        Ok(())
    }
}

impl PacketWriter for Recorder {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.check(buf)?;
        self.calls.lock().unwrap().push(vec![buf.to_vec()]);
        Ok(buf.len())
    }
    fn send_multiple(&self, bufs: &[&[u8]], offset: usize) -> io::Result<usize> {
        let call: Vec<Vec<u8>> = bufs.iter().map(|buf| buf[offset..].to_vec()).collect();
        for pkt in &call {
            self.check(pkt)?;
        }
        self.calls.lock().unwrap().push(call);
        Ok(bufs.len())
    }
}

pub fn bytes(pkt: Vec<u8>) -> Bytes {
    Bytes::from(pkt)
}
