//! Network identity a session is bound to.
//!
//! The address is held as one native unsigned integer per family. Storage
//! splits it into two signed 64-bit columns (`ip_low`, `ip_high`) because
//! neither SQLite nor MySQL have a 128-bit integer type; `ip_high` is `NULL`
//! for IPv4 so the family survives the round trip.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundAddress {
    V4(u32),
    V6(u128),
}

impl BoundAddress {
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) collapse to IPv4 so a
    /// dual-stack listener does not break a session bound over plain IPv4.
    #[must_use]
    pub fn from_ip(ip: IpAddr) -> Self {
        match ip.to_canonical() {
            IpAddr::V4(v4) => Self::V4(u32::from(v4)),
            IpAddr::V6(v6) => Self::V6(u128::from(v6)),
        }
    }

    #[must_use]
    pub fn to_ip(self) -> IpAddr {
        match self {
            Self::V4(bits) => IpAddr::V4(Ipv4Addr::from(bits)),
            Self::V6(bits) => IpAddr::V6(Ipv6Addr::from(bits)),
        }
    }

    #[must_use]
    pub const fn bits(self) -> u128 {
        match self {
            Self::V4(bits) => bits as u128,
            Self::V6(bits) => bits,
        }
    }

    /// Storage halves `(low, high)`. The casts reinterpret the unsigned words
    /// bit for bit; they never truncate.
    #[must_use]
    pub const fn split(self) -> (i64, Option<i64>) {
        match self {
            Self::V4(bits) => (bits as i64, None),
            Self::V6(bits) => ((bits as u64) as i64, Some(((bits >> 64) as u64) as i64)),
        }
    }

    /// Inverse of [`split`](Self::split). Returns `None` when the columns do
    /// not describe an address (no low half, or an IPv4 value wider than 32
    /// bits), which callers treat as "not bound".
    #[must_use]
    pub fn merge(low: Option<i64>, high: Option<i64>) -> Option<Self> {
        let low = low? as u64;
        match high {
            None => u32::try_from(low).ok().map(Self::V4),
            Some(high) => Some(Self::V6((u128::from(high as u64) << 64) | u128::from(low))),
        }
    }
}

impl From<IpAddr> for BoundAddress {
    fn from(ip: IpAddr) -> Self {
        Self::from_ip(ip)
    }
}

impl fmt::Display for BoundAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ip())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(addr: BoundAddress) -> BoundAddress {
        let (low, high) = addr.split();
        BoundAddress::merge(Some(low), high).unwrap()
    }

    #[test]
    fn ipv4_round_trips_without_high_half() {
        let addr = BoundAddress::from_ip("192.168.10.20".parse().unwrap());
        let (low, high) = addr.split();
        assert_eq!(high, None);
        assert_eq!(low, 0xC0A8_0A14);
        assert_eq!(round_trip(addr), addr);
        assert_eq!(addr.to_string(), "192.168.10.20");
    }

    #[test]
    fn ipv6_round_trips_full_width() {
        let ip: IpAddr = "2001:db8:85a3::8a2e:370:7334".parse().unwrap();
        let addr = BoundAddress::from_ip(ip);
        assert_eq!(round_trip(addr), addr);
        assert_eq!(addr.to_ip(), ip);
    }

    #[test]
    fn split_merge_at_the_64_bit_boundary() {
        let below = BoundAddress::V6(u128::from(u64::MAX));
        let at = BoundAddress::V6(1u128 << 64);

        assert_eq!(below.split(), (-1, Some(0)));
        assert_eq!(at.split(), (0, Some(1)));

        assert_eq!(round_trip(below), below);
        assert_eq!(round_trip(at), at);
        assert_ne!(round_trip(below), round_trip(at));
        assert_eq!(round_trip(at).bits() - round_trip(below).bits(), 1);
    }

    #[test]
    fn top_bit_survives_signed_storage() {
        let addr = BoundAddress::V6(u128::MAX);
        assert_eq!(addr.split(), (-1, Some(-1)));
        assert_eq!(round_trip(addr), addr);
    }

    #[test]
    fn families_never_compare_equal() {
        let v4 = BoundAddress::from_ip("1.2.3.4".parse().unwrap());
        let v6_compat = BoundAddress::from_ip("::102:304".parse().unwrap());
        assert_eq!(v4.bits(), v6_compat.bits());
        assert_ne!(v4, v6_compat);
    }

    #[test]
    fn mapped_ipv4_collapses_to_ipv4() {
        let mapped = BoundAddress::from_ip("::ffff:10.0.0.1".parse().unwrap());
        let plain = BoundAddress::from_ip("10.0.0.1".parse().unwrap());
        assert_eq!(mapped, plain);
    }

    #[test]
    fn merge_rejects_unbound_or_corrupt_columns() {
        assert_eq!(BoundAddress::merge(None, None), None);
        assert_eq!(BoundAddress::merge(None, Some(1)), None);
        assert_eq!(BoundAddress::merge(Some(1 << 40), None), None);
    }
}
