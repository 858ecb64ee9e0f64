// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Atomic predicates of the filter grammar.

use addrspace::AddressBlock;
use std::fmt::{Display, Formatter};

/// Protocols that can appear as bare tokens in a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Http,
    Tls,
    Dns,
    Quic,
    Tcp,
    Udp,
}

/// The address field an address predicate tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AddrField {
    /// Either endpoint
    Addr,
    /// The originator of the connection
    SrcAddr,
    /// The responder of the connection
    DstAddr,
}

/// How an address is compared to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrOp {
    /// `field = block`
    Eq,
    /// `field in block`
    In,
}

impl Display for AddrOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AddrOp::Eq => write!(f, "="),
            AddrOp::In => write!(f, "in"),
        }
    }
}

/// An address predicate such as `ipv4.src_addr = 16.0.0.0/24`.
///
/// Single-address blocks compared with `=` render as the bare address, unless the prefix length
/// was asked for explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddrMatch {
    pub field: AddrField,
    pub op: AddrOp,
    pub block: AddressBlock,
    /// Prefix the field with the `ipv4.` layer
    pub qualified: bool,
    /// Render the prefix length even for a single address
    pub show_prefix: bool,
}

impl AddrMatch {
    /// An unqualified equality match, e.g. `addr = 0.0.0.0/1`.
    #[must_use]
    pub fn new(field: AddrField, block: AddressBlock) -> Self {
        Self {
            field,
            op: AddrOp::Eq,
            block,
            qualified: false,
            show_prefix: false,
        }
    }

    /// A layer-qualified equality match, e.g. `ipv4.dst_addr = 48.0.0.1`.
    #[must_use]
    pub fn ipv4(field: AddrField, block: AddressBlock) -> Self {
        Self {
            qualified: true,
            ..Self::new(field, block)
        }
    }

    /// Turn the match into a containment test, e.g. `ipv4.dst_addr in 1.0.0.0/8`.
    #[must_use]
    pub fn within(self) -> Self {
        Self {
            op: AddrOp::In,
            ..self
        }
    }

    /// Always render the block in CIDR notation, e.g. `ipv4.src_addr = 16.0.0.0/32`.
    #[must_use]
    pub fn with_prefix(self) -> Self {
        Self {
            show_prefix: true,
            ..self
        }
    }
}

impl Display for AddrMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.qualified {
            write!(f, "ipv4.")?;
        }
        write!(f, "{} {} ", self.field, self.op)?;
        match (self.op, self.block.as_host()) {
            (AddrOp::Eq, Some(host)) if !self.show_prefix => write!(f, "{host}"),
            _ => write!(f, "{}", self.block),
        }
    }
}

/// One term of a filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Addr(AddrMatch),
    Protocol(Protocol),
    /// A parenthesized disjunction of protocols, e.g. `(http or tls or dns)`
    AnyOf(Vec<Protocol>),
    TcpPort(u16),
    HttpMethod(String),
    HttpVersion(String),
    HttpUserAgent(String),
}

impl Predicate {
    /// `http.request_version = 'HTTP/1.1'`
    #[must_use]
    pub fn http_1_1() -> Self {
        Predicate::HttpVersion("HTTP/1.1".to_string())
    }
}

impl From<Protocol> for Predicate {
    fn from(value: Protocol) -> Self {
        Predicate::Protocol(value)
    }
}

impl From<AddrMatch> for Predicate {
    fn from(value: AddrMatch) -> Self {
        Predicate::Addr(value)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Addr(m) => write!(f, "{m}"),
            Predicate::Protocol(p) => write!(f, "{p}"),
            Predicate::AnyOf(protocols) => {
                write!(f, "(")?;
                for (n, p) in protocols.iter().enumerate() {
                    if n > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
            Predicate::TcpPort(port) => write!(f, "tcp.port = {port}"),
            Predicate::HttpMethod(method) => write!(f, "http.method = '{method}'"),
            Predicate::HttpVersion(version) => write!(f, "http.request_version = '{version}'"),
            Predicate::HttpUserAgent(agent) => write!(f, "http.user_agent = '{agent}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn address_predicates() {
        let block: AddressBlock = "128.0.0.0/1".parse().unwrap();
        assert_eq!(
            AddrMatch::new(AddrField::Addr, block).to_string(),
            "addr = 128.0.0.0/1"
        );
        assert_eq!(
            AddrMatch::ipv4(AddrField::DstAddr, block).to_string(),
            "ipv4.dst_addr = 128.0.0.0/1"
        );
        let host: AddressBlock = "16.0.0.2/32".parse().unwrap();
        assert_eq!(
            AddrMatch::ipv4(AddrField::SrcAddr, host).to_string(),
            "ipv4.src_addr = 16.0.0.2"
        );
        assert_eq!(
            AddrMatch::ipv4(AddrField::SrcAddr, host).with_prefix().to_string(),
            "ipv4.src_addr = 16.0.0.2/32"
        );
        let broad: AddressBlock = "1.0.0.0/8".parse().unwrap();
        assert_eq!(
            AddrMatch::ipv4(AddrField::DstAddr, broad).within().to_string(),
            "ipv4.dst_addr in 1.0.0.0/8"
        );
    }

    #[test]
    fn protocol_predicates() {
        assert_eq!(Predicate::from(Protocol::Tls).to_string(), "tls");
        assert_eq!(
            Predicate::AnyOf(vec![Protocol::Http, Protocol::Tls, Protocol::Dns]).to_string(),
            "(http or tls or dns)"
        );
        assert_eq!(Predicate::TcpPort(80).to_string(), "tcp.port = 80");
        assert_eq!(
            Predicate::HttpMethod("GET".to_string()).to_string(),
            "http.method = 'GET'"
        );
        assert_eq!(
            Predicate::http_1_1().to_string(),
            "http.request_version = 'HTTP/1.1'"
        );
        assert_eq!(
            Predicate::HttpUserAgent("asdfg".to_string()).to_string(),
            "http.user_agent = 'asdfg'"
        );
        assert_eq!(Protocol::from_str("quic").unwrap(), Protocol::Quic);
        assert_eq!(AddrField::from_str("src_addr").unwrap(), AddrField::SrcAddr);
    }
}
