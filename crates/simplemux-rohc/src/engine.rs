//! `LightweightRohcEngine`: a small, dependency-free header-compression
//! engine implementing [`HeaderCompressor`] (§4.6).
//!
//! The real ROHC engine is an external collaborator referenced only through
//! this trait (§1); this engine is a concrete, self-contained stand-in. It
//! understands IPv4 headers with no options, optionally carrying a UDP or
//! UDP-Lite transport header, and caches the fields that stay constant for
//! the life of a flow (version/TOS, protocol, addresses, and — for
//! UDP-like profiles — ports) in a small per-direction context table
//! indexed by a 4-bit context id (§4.6 "small CID space"). Anything it
//! cannot classify (IPv6, IPv4 with options, short packets) is carried
//! uncompressed under [`Profile::Uncompressed`].

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use simplemux_core::{CompressOutcome, DecompressOutcome, HeaderCompressor};

use crate::profile::Profile;

const IPV4_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;
const DYNAMIC_FIELDS_LEN: usize = 5; // identification(2) + flags/fragment(2) + ttl(1)
const CONTEXT_CAPACITY: usize = 16; // 4-bit CID space

/// The header fields a context caches because they are constant for the
/// life of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StaticHeader {
    version_ihl: u8,
    tos: u8,
    protocol: u8,
    src: [u8; 4],
    dst: [u8; 4],
    ports: Option<(u16, u16)>,
}

/// The header fields carried on every non-IR packet.
#[derive(Debug, Clone, Copy)]
struct DynamicFields {
    identification: [u8; 2],
    flags_fragment: [u8; 2],
    ttl: u8,
}

struct ParsedIpv4 {
    static_header: StaticHeader,
    dynamic: DynamicFields,
    profile: Profile,
}

impl ParsedIpv4 {
    /// Parse an IPv4 packet with no options, recognizing a UDP or UDP-Lite
    /// transport header if present. Returns `None` for anything else
    /// (IPv6, options, or a packet shorter than a bare IPv4 header) so the
    /// caller falls back to [`Profile::Uncompressed`].
    fn parse(ip_packet: &[u8]) -> Option<Self> {
        if ip_packet.len() < IPV4_HEADER_LEN {
            return None;
        }
        let version_ihl = ip_packet[0];
        if version_ihl >> 4 != 4 || version_ihl & 0x0F != 5 {
            return None;
        }

        let tos = ip_packet[1];
        let identification = [ip_packet[4], ip_packet[5]];
        let flags_fragment = [ip_packet[6], ip_packet[7]];
        let ttl = ip_packet[8];
        let protocol = ip_packet[9];
        let mut src = [0u8; 4];
        src.copy_from_slice(&ip_packet[12..16]);
        let mut dst = [0u8; 4];
        dst.copy_from_slice(&ip_packet[16..20]);

        let ports = (matches!(protocol, 17 | 136) && ip_packet.len() >= IPV4_HEADER_LEN + 4).then(|| {
            let src_port = u16::from_be_bytes([ip_packet[20], ip_packet[21]]);
            let dst_port = u16::from_be_bytes([ip_packet[22], ip_packet[23]]);
            (src_port, dst_port)
        });

        let profile = Profile::classify(protocol, ports.map(|(_, dst_port)| dst_port));
        let static_header =
            StaticHeader { version_ihl, tos, protocol, src, dst, ports: profile.caches_ports().then_some(ports).flatten() };

        Some(Self { static_header, dynamic: DynamicFields { identification, flags_fragment, ttl }, profile })
    }
}

fn header_skip(profile: Profile) -> usize {
    IPV4_HEADER_LEN + if profile.caches_ports() { UDP_HEADER_LEN } else { 0 }
}

fn header_byte(is_ir: bool, profile: Profile, cid: u8) -> u8 {
    (u8::from(is_ir) << 7) | ((profile as u8) << 4) | (cid & 0x0F)
}

fn parse_header_byte(byte: u8) -> Option<(bool, Profile, u8)> {
    let is_ir = byte & 0x80 != 0;
    let profile = Profile::from_tag((byte >> 4) & 0x07)?;
    let cid = byte & 0x0F;
    Some((is_ir, profile, cid))
}

/// RFC 791 one's-complement checksum, assuming the checksum field itself is
/// zeroed in `header`.
fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for chunk in header.chunks(2) {
        let word = match chunk {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from_be_bytes([*hi, 0]),
            _ => unreachable!("chunks(2) never yields more than 2 bytes"),
        };
        sum += u32::from(word);
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    #[allow(clippy::cast_possible_truncation)]
    let checksum = !(sum as u16);
    checksum
}

fn reconstruct(ctx: StaticHeader, dynamic: DynamicFields, tail: &[u8]) -> Vec<u8> {
    let header_len = IPV4_HEADER_LEN + if ctx.ports.is_some() { UDP_HEADER_LEN } else { 0 };
    let total_len = header_len + tail.len();

    let mut out = Vec::with_capacity(total_len);
    out.push(ctx.version_ihl);
    out.push(ctx.tos);
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(total_len as u16).to_be_bytes());
    out.extend_from_slice(&dynamic.identification);
    out.extend_from_slice(&dynamic.flags_fragment);
    out.push(dynamic.ttl);
    out.push(ctx.protocol);
    out.extend_from_slice(&[0, 0]); // checksum patched below
    out.extend_from_slice(&ctx.src);
    out.extend_from_slice(&ctx.dst);

    let checksum = ipv4_checksum(&out[..IPV4_HEADER_LEN]);
    out[10..12].copy_from_slice(&checksum.to_be_bytes());

    if let Some((src_port, dst_port)) = ctx.ports {
        out.extend_from_slice(&src_port.to_be_bytes());
        out.extend_from_slice(&dst_port.to_be_bytes());
        #[allow(clippy::cast_possible_truncation)]
        let udp_len = (UDP_HEADER_LEN + tail.len()) as u16;
        out.extend_from_slice(&udp_len.to_be_bytes());
        out.extend_from_slice(&[0, 0]); // checksum disabled, valid per RFC 768
    }

    out.extend_from_slice(tail);
    out
}

#[derive(Debug, Default)]
struct SendContexts {
    by_key: HashMap<StaticHeader, u8>,
    slots: [Option<StaticHeader>; CONTEXT_CAPACITY],
    lru: VecDeque<u8>,
}

impl SendContexts {
    /// Return the cid for `header`, assigning one (evicting the
    /// least-recently-used slot if the table is full) if this is a new
    /// flow. The second element is `true` exactly when a new context was
    /// created, i.e. the caller must emit an IR packet.
    fn cid_for(&mut self, header: StaticHeader) -> (u8, bool) {
        if let Some(&cid) = self.by_key.get(&header) {
            self.touch(cid);
            return (cid, false);
        }

        #[allow(clippy::cast_possible_truncation)]
        let cid = if self.lru.len() < CONTEXT_CAPACITY {
            self.lru.len() as u8
        } else {
            let evicted = self.lru.pop_front().expect("capacity is nonzero");
            if let Some(old) = self.slots[evicted as usize].take() {
                self.by_key.remove(&old);
            }
            evicted
        };

        self.slots[cid as usize] = Some(header);
        self.by_key.insert(header, cid);
        self.lru.push_back(cid);
        (cid, true)
    }

    fn touch(&mut self, cid: u8) {
        if let Some(pos) = self.lru.iter().position(|&c| c == cid) {
            self.lru.remove(pos);
        }
        self.lru.push_back(cid);
    }
}

#[derive(Debug, Default)]
struct RecvContexts {
    slots: [Option<StaticHeader>; CONTEXT_CAPACITY],
}

impl RecvContexts {
    fn store(&mut self, cid: u8, header: StaticHeader) {
        self.slots[cid as usize] = Some(header);
    }

    fn get(&self, cid: u8) -> Option<StaticHeader> {
        self.slots[cid as usize]
    }
}

/// A self-contained header-compression engine. One instance handles one
/// direction: construct two (one per direction) per tunnel, as the real
/// engine's contexts are never shared between send and receive (§3).
#[derive(Debug, Default)]
pub struct LightweightRohcEngine {
    send: SendContexts,
    recv: RecvContexts,
}

impl LightweightRohcEngine {
    /// Create an engine with empty compression contexts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeaderCompressor for LightweightRohcEngine {
    fn compress(&mut self, ip_packet: &[u8]) -> CompressOutcome {
        let Some(parsed) = ParsedIpv4::parse(ip_packet) else {
            let mut out = Vec::with_capacity(1 + ip_packet.len());
            out.push(header_byte(false, Profile::Uncompressed, 0));
            out.extend_from_slice(ip_packet);
            return CompressOutcome::Compressed(Bytes::from(out));
        };

        let (cid, is_ir) = self.send.cid_for(parsed.static_header);
        let mut out = Vec::new();
        out.push(header_byte(is_ir, parsed.profile, cid));

        if is_ir {
            out.extend_from_slice(ip_packet);
        } else {
            out.extend_from_slice(&parsed.dynamic.identification);
            out.extend_from_slice(&parsed.dynamic.flags_fragment);
            out.push(parsed.dynamic.ttl);
            out.extend_from_slice(&ip_packet[header_skip(parsed.profile)..]);
        }

        CompressOutcome::Compressed(Bytes::from(out))
    }

    fn decompress(&mut self, rohc_packet: &[u8]) -> DecompressOutcome {
        let Some((&first, rest)) = rohc_packet.split_first() else {
            return DecompressOutcome::Failed { reason: "empty payload".to_owned() };
        };
        let Some((is_ir, profile, cid)) = parse_header_byte(first) else {
            return DecompressOutcome::Failed { reason: format!("unknown profile tag in {first:#04x}") };
        };

        if profile == Profile::Uncompressed {
            return DecompressOutcome::Ip(Bytes::copy_from_slice(rest));
        }

        if is_ir {
            let Some(parsed) = ParsedIpv4::parse(rest) else {
                return DecompressOutcome::Failed { reason: "malformed IR packet".to_owned() };
            };
            self.recv.store(cid, parsed.static_header);
            return DecompressOutcome::Ip(Bytes::copy_from_slice(rest));
        }

        let Some(ctx) = self.recv.get(cid) else {
            return DecompressOutcome::Failed { reason: format!("no context for cid {cid}") };
        };
        if rest.len() < DYNAMIC_FIELDS_LEN {
            return DecompressOutcome::Failed { reason: "truncated dynamic fields".to_owned() };
        }

        let dynamic = DynamicFields {
            identification: [rest[0], rest[1]],
            flags_fragment: [rest[2], rest[3]],
            ttl: rest[4],
        };
        let tail = &rest[DYNAMIC_FIELDS_LEN..];
        DecompressOutcome::Ip(Bytes::from(reconstruct(ctx, dynamic, tail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_udp_packet(identification: u16, ttl: u8, src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let udp_len = UDP_HEADER_LEN + payload.len();
        let total_len = IPV4_HEADER_LEN + udp_len;
        let mut out = Vec::with_capacity(total_len);
        out.push(0x45); // version 4, ihl 5
        out.push(0); // tos
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(total_len as u16).to_be_bytes());
        out.extend_from_slice(&identification.to_be_bytes());
        out.extend_from_slice(&[0x40, 0x00]); // don't-fragment, no offset
        out.push(ttl);
        out.push(17); // UDP
        out.extend_from_slice(&[0, 0]); // checksum, unused by the test
        out.extend_from_slice(&[10, 0, 0, 1]);
        out.extend_from_slice(&[10, 0, 0, 2]);
        out.extend_from_slice(&src_port.to_be_bytes());
        out.extend_from_slice(&dst_port.to_be_bytes());
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(udp_len as u16).to_be_bytes());
        out.extend_from_slice(&[0, 0]); // udp checksum, unused by the test
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn first_packet_in_a_flow_is_sent_as_ir() {
        let mut send = LightweightRohcEngine::new();
        let packet = ipv4_udp_packet(1, 64, 5000, 5001, b"hello");
        let CompressOutcome::Compressed(wire) = send.compress(&packet) else { panic!("expected Compressed") };
        assert!(wire[0] & 0x80 != 0, "first packet in a new context must be IR");
    }

    #[test]
    fn second_packet_in_same_flow_is_compressed_not_ir() {
        let mut send = LightweightRohcEngine::new();
        send.compress(&ipv4_udp_packet(1, 64, 5000, 5001, b"one"));
        let CompressOutcome::Compressed(wire) = send.compress(&ipv4_udp_packet(2, 64, 5000, 5001, b"two")) else {
            panic!("expected Compressed")
        };
        assert_eq!(wire[0] & 0x80, 0, "second packet on a known flow must not repeat IR");
        assert_eq!(wire.len(), 1 + DYNAMIC_FIELDS_LEN + b"two".len());
    }

    #[test]
    fn compress_then_decompress_round_trips_udp_payload() {
        let mut send = LightweightRohcEngine::new();
        let mut recv = LightweightRohcEngine::new();

        for (id, payload) in [(1u16, &b"first"[..]), (2, b"second"), (3, b"third")] {
            let original = ipv4_udp_packet(id, 64, 5000, 5001, payload);
            let CompressOutcome::Compressed(wire) = send.compress(&original) else { panic!("expected Compressed") };
            let DecompressOutcome::Ip(recovered) = recv.decompress(&wire) else { panic!("expected Ip") };
            assert_eq!(recovered.len(), original.len());
            assert_eq!(&recovered[IPV4_HEADER_LEN + UDP_HEADER_LEN..], payload);
            assert_eq!(&recovered[12..16], &original[12..16], "source address must survive compression");
        }
    }

    #[test]
    fn unparseable_packet_falls_back_to_uncompressed() {
        let mut send = LightweightRohcEngine::new();
        let mut recv = LightweightRohcEngine::new();
        let ipv6_like = vec![0x60, 0, 0, 0, 0, 4, 17, 64];

        let CompressOutcome::Compressed(wire) = send.compress(&ipv6_like) else { panic!("expected Compressed") };
        assert_eq!(wire[0], header_byte(false, Profile::Uncompressed, 0));

        let DecompressOutcome::Ip(recovered) = recv.decompress(&wire) else { panic!("expected Ip") };
        assert_eq!(recovered.as_ref(), ipv6_like.as_slice());
    }

    #[test]
    fn unknown_context_id_fails_decompression_without_panicking() {
        let mut recv = LightweightRohcEngine::new();
        let wire = [header_byte(false, Profile::Udp, 9), 0, 1, 0x40, 0, 64, b'x'];
        assert!(matches!(recv.decompress(&wire), DecompressOutcome::Failed { .. }));
    }

    #[test]
    fn context_table_evicts_least_recently_used_flow() {
        let mut send = LightweightRohcEngine::new();
        for port in 0..CONTEXT_CAPACITY as u16 {
            send.compress(&ipv4_udp_packet(1, 64, 5000, 6000 + port, b"x"));
        }
        // One more flow should evict port 6000 (the least-recently used).
        send.compress(&ipv4_udp_packet(1, 64, 5000, 6000 + CONTEXT_CAPACITY as u16, b"x"));
        let CompressOutcome::Compressed(wire) = send.compress(&ipv4_udp_packet(2, 64, 5000, 6000, b"x")) else {
            panic!("expected Compressed")
        };
        assert!(wire[0] & 0x80 != 0, "evicted flow must be re-sent as IR");
    }
}
