//! Header-compression profiles (§4.6, GLOSSARY "Profile").
//!
//! A profile identifies which fields of a packet's headers are treated as
//! static (cached in the compression context) versus dynamic (carried on
//! every packet). `LightweightRohcEngine` groups profiles into two
//! compression mechanisms: [`Profile::Udp`], [`Profile::UdpLite`], and
//! [`Profile::Rtp`] additionally elide the transport-layer port pair;
//! [`Profile::Tcp`] and [`Profile::Esp`] only elide the IP header; and
//! [`Profile::Uncompressed`] applies to anything the engine can't classify
//! (IPv6, IPv4 with options, anything shorter than a bare IPv4 header).

/// A header-compression profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Profile {
    /// No compression: the packet is carried verbatim.
    Uncompressed = 0,
    /// IP header only; transport layer (if any) is opaque.
    Ip = 1,
    /// IP + UDP headers, ports cached in the context.
    Udp = 2,
    /// IP + UDP-Lite headers, ports cached in the context.
    UdpLite = 3,
    /// RTP-over-UDP, identified heuristically by destination port range.
    Rtp = 4,
    /// ESP (IPsec): IP header only, payload (including the SPI) opaque.
    Esp = 5,
    /// TCP: IP header only, transport layer opaque (TCP options make a
    /// fixed-offset port cache unsafe).
    Tcp = 6,
}

impl Profile {
    const IP_PROTO_TCP: u8 = 6;
    const IP_PROTO_UDP: u8 = 17;
    const IP_PROTO_ESP: u8 = 50;
    const IP_PROTO_UDPLITE: u8 = 136;
    const RTP_PORT_RANGE: std::ops::RangeInclusive<u16> = 16384..=32767;

    /// Classify a packet's profile from its IP protocol number and, for UDP
    /// packets, its destination port.
    #[must_use]
    pub fn classify(ip_protocol: u8, udp_dst_port: Option<u16>) -> Self {
        match ip_protocol {
            Self::IP_PROTO_UDP => match udp_dst_port {
                Some(port) if Self::RTP_PORT_RANGE.contains(&port) => Self::Rtp,
                _ => Self::Udp,
            },
            Self::IP_PROTO_UDPLITE => Self::UdpLite,
            Self::IP_PROTO_TCP => Self::Tcp,
            Self::IP_PROTO_ESP => Self::Esp,
            _ => Self::Ip,
        }
    }

    /// Whether this profile's mechanism additionally caches a transport
    /// port pair (and so strips the 4-byte port prefix from the carried
    /// tail on non-IR packets).
    #[must_use]
    pub fn caches_ports(self) -> bool {
        matches!(self, Self::Udp | Self::UdpLite | Self::Rtp)
    }

    pub(crate) const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Uncompressed),
            1 => Some(Self::Ip),
            2 => Some(Self::Udp),
            3 => Some(Self::UdpLite),
            4 => Some(Self::Rtp),
            5 => Some(Self::Esp),
            6 => Some(Self::Tcp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_plain_udp() {
        assert_eq!(Profile::classify(17, Some(5000)), Profile::Udp);
    }

    #[test]
    fn classifies_rtp_by_port_range() {
        assert_eq!(Profile::classify(17, Some(20000)), Profile::Rtp);
    }

    #[test]
    fn classifies_tcp_and_esp_and_fallback() {
        assert_eq!(Profile::classify(6, None), Profile::Tcp);
        assert_eq!(Profile::classify(50, None), Profile::Esp);
        assert_eq!(Profile::classify(1, None), Profile::Ip);
    }

    #[test]
    fn tag_round_trips() {
        for tag in 0u8..=6 {
            let profile = Profile::from_tag(tag).unwrap();
            assert_eq!(profile as u8, tag);
        }
        assert!(Profile::from_tag(7).is_none());
    }
}
