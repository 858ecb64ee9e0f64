// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Asymmetric client/server configurations mixing protocol filters with per-address filters.
//!
//! Indices are handed out in a fixed order, which downstream golden outputs depend on:
//!
//! 1. the protocol filters `http`, `http.method = 'GET'` and `http.request_version = 'HTTP/1.1'`
//!    (broad ranges with HTTP filters only),
//! 2. the narrow client and server matches, then `tls` and the user-agent filter (narrow ranges
//!    only),
//! 3. `tcp.port = 80` (broad ranges only),
//! 4. the enumeration passes over the client and server pools,
//! 5. the widened fallback passes, if the target is still not met.
//!
//! The prelude of steps 1 to 3 is always allocated in full, so very small targets may be
//! exceeded. A target beyond what all the passes can produce is met only partially.

use crate::alloc::Assembly;
use crate::errors::{SynthError, UnderAllocation};
use addrspace::{AddressBlock, AddressPool, PrefixLen, Role};
use config::Configuration;
use filter::{AddrField, AddrMatch, FilterExpr, Predicate, Protocol, build};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Callback invoked by client address filters
pub const IP_SRC_CB: &str = "ip_src";
/// Callback invoked by server address filters
pub const IP_DST_CB: &str = "ip_dst";
/// Callback invoked by the port filter
pub const TCP_PORT_80_CB: &str = "tcp_port_80";
/// Callback invoked by protocol filters
pub const HTTP_CB: &str = "http";

/// Result of a synthesis which may fall short of its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub config: Configuration,
    pub notice: Option<UnderAllocation>,
}

/// The address pools of both roles: the real ones, which carry traffic, and decoys, which don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pools {
    pub client: AddressPool,
    pub server: AddressPool,
    pub client_decoy: AddressPool,
    pub server_decoy: AddressPool,
}

impl Default for Pools {
    fn default() -> Self {
        Self {
            client: AddressPool::hosts(AddressBlock::new_assert([16, 0, 0, 0], 24)),
            server: AddressPool::hosts(AddressBlock::new_assert([48, 0, 0, 0], 24)),
            client_decoy: AddressPool::hosts(AddressBlock::new_assert([15, 0, 0, 0], 24)),
            server_decoy: AddressPool::hosts(AddressBlock::new_assert([40, 0, 0, 0], 24)),
        }
    }
}

impl Pools {
    fn real(&self, role: Role) -> &AddressPool {
        match role {
            Role::Client => &self.client,
            Role::Server => &self.server,
        }
    }

    fn enumerated(&self, role: Role, broad: bool) -> &AddressPool {
        match (role, broad) {
            (_, true) => self.real(role),
            (Role::Client, false) => &self.client_decoy,
            (Role::Server, false) => &self.server_decoy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrowOptions {
    /// Enumerate the real pools instead of the decoys, and add the broad protocol filters
    pub use_broad_ranges: bool,
    pub include_http_filters: bool,
    /// Narrow matches cover `<pool base>/<len>` instead of the single host `<pool base>.2`
    pub ip_prefix_override: Option<PrefixLen>,
    pub pools: Pools,
    /// Largest number of blocks drawn by one enumeration pass
    pub per_pass: usize,
    pub subscribed_type: String,
}

impl Default for NarrowOptions {
    fn default() -> Self {
        Self {
            use_broad_ranges: true,
            include_http_filters: true,
            ip_prefix_override: None,
            pools: Pools::default(),
            per_pass: 50,
            subscribed_type: "SavedFiveTuple".to_owned(),
        }
    }
}

impl NarrowOptions {
    /// The block matched by the narrow filter of `role`.
    pub fn narrow_block(&self, role: Role) -> Result<AddressBlock, SynthError> {
        let base = self.pools.real(role).base().address();
        match self.ip_prefix_override {
            Some(len) => Ok(AddressBlock::new_strict(base, len.as_u8())?),
            None => Ok(AddressBlock::from(Ipv4Addr::from_bits(base.to_bits() + 2))),
        }
    }
}

fn role_field(role: Role) -> AddrField {
    match role {
        Role::Client => AddrField::SrcAddr,
        Role::Server => AddrField::DstAddr,
    }
}

fn role_callback(role: Role) -> &'static str {
    match role {
        Role::Client => IP_SRC_CB,
        Role::Server => IP_DST_CB,
    }
}

/// How the address match of an enumeration pass is completed.
#[derive(Debug, Clone)]
enum Completion {
    Bare,
    And(Predicate),
    Or(Predicate),
}

impl Completion {
    fn apply(&self, addr: AddrMatch) -> FilterExpr {
        match self {
            Completion::Bare => FilterExpr::new(addr),
            Completion::And(p) => FilterExpr::new(addr).and(p.clone()),
            Completion::Or(p) => FilterExpr::new(addr).or(p.clone()),
        }
    }
}

struct Run<'a> {
    asm: Assembly,
    target: usize,
    options: &'a NarrowOptions,
}

impl Run<'_> {
    /// Draw up to `per_pass` blocks from a fresh pass over `pool`, stopping at the target.
    fn enumerate(&mut self, role: Role, pool: &AddressPool, completion: &Completion) {
        let before = self.asm.allocated();
        for block in pool.pass().take(self.options.per_pass) {
            if self.asm.allocated() >= self.target {
                break;
            }
            let filter = completion.apply(AddrMatch::ipv4(role_field(role), block));
            self.asm.allocate(&filter, role_callback(role));
        }
        debug!(
            "{role} pass over {pool} allocated {} indices",
            self.asm.allocated() - before
        );
    }

    fn enumerate_both(&mut self, completion: &Completion, server_always_real: bool) {
        let broad = self.options.use_broad_ranges;
        let pools = self.options.pools;
        self.enumerate(Role::Client, pools.enumerated(Role::Client, broad), completion);
        let server = if server_always_real {
            pools.real(Role::Server)
        } else {
            pools.enumerated(Role::Server, broad)
        };
        self.enumerate(Role::Server, server, completion);
    }
}

/// Assemble a configuration of up to `count` subscriptions.
///
/// # Errors
///
/// Fails with [`SynthError::ZeroCount`] if `count` is zero, or with [`SynthError::NarrowBlock`] if
/// the prefix override leaves host bits in the pool base address.
pub fn assemble(count: usize, options: &NarrowOptions) -> Result<Synthesis, SynthError> {
    if count == 0 {
        return Err(SynthError::ZeroCount);
    }
    let broad = options.use_broad_ranges;
    let http = options.include_http_filters;
    let mut run = Run {
        asm: Assembly::new().with_callbacks([IP_SRC_CB, IP_DST_CB, TCP_PORT_80_CB, HTTP_CB]),
        target: count,
        options,
    };

    if http && broad {
        for predicate in [
            Predicate::from(Protocol::Http),
            Predicate::HttpMethod("GET".to_owned()),
            Predicate::http_1_1(),
        ] {
            run.asm.allocate(&predicate, HTTP_CB);
        }
    }
    if !broad {
        for role in [Role::Client, Role::Server] {
            let mut addr = AddrMatch::ipv4(role_field(role), options.narrow_block(role)?);
            if options.ip_prefix_override.is_some() {
                addr = addr.with_prefix();
            }
            let filter = build(addr, [Predicate::from(Protocol::Http)]);
            run.asm.allocate(&filter, role_callback(role));
        }
        run.asm.allocate(&Protocol::Tls, HTTP_CB);
        if http {
            run.asm.allocate(&Predicate::HttpUserAgent("asdfg".to_owned()), HTTP_CB);
        }
    }
    if broad {
        run.asm.allocate(&Predicate::TcpPort(80), TCP_PORT_80_CB);
    }

    let with_http = Completion::And(Protocol::Http.into());
    let with_version = Completion::And(Predicate::http_1_1());
    run.enumerate_both(&with_http, false);
    run.enumerate_both(&Completion::Bare, false);
    run.enumerate_both(&with_version, true);

    if run.asm.allocated() < count {
        debug!(
            "{} of {count} indices after enumeration: widening",
            run.asm.allocated()
        );
        let broad_dst = AddrMatch::ipv4(
            AddrField::DstAddr,
            AddressBlock::new_assert([1, 0, 0, 0], 8),
        )
        .within();
        run.enumerate_both(&Completion::Or(broad_dst.into()), true);
        run.enumerate_both(&Completion::Or(Protocol::Udp.into()), true);
    }

    let achieved = run.asm.allocated();
    let notice = (achieved < count).then_some(UnderAllocation {
        requested: count,
        achieved,
    });
    match &notice {
        Some(notice) => warn!("Note: {notice}"),
        None => info!("Allocated {achieved} subscriptions"),
    }
    Ok(Synthesis {
        config: run.asm.finish(&options.subscribed_type, None),
        notice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::IndexMode;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn filters(synthesis: &Synthesis) -> Vec<&str> {
        synthesis.config.filters.filters().collect()
    }

    #[test]
    fn broad_prelude() {
        let synthesis = assemble(6, &NarrowOptions::default()).unwrap();
        assert_eq!(
            filters(&synthesis),
            vec![
                "http",
                "http.method = 'GET'",
                "http.request_version = 'HTTP/1.1'",
                "tcp.port = 80",
                "ipv4.src_addr = 16.0.0.0 and http",
                "ipv4.src_addr = 16.0.0.1 and http",
            ]
        );
        let config = &synthesis.config;
        assert_eq!(config.num_subscriptions, 6);
        assert_eq!(config.callbacks.get(HTTP_CB), Some([0, 1, 2].as_slice()));
        assert_eq!(config.callbacks.get(TCP_PORT_80_CB), Some([3].as_slice()));
        assert_eq!(config.callbacks.get(IP_SRC_CB), Some([4, 5].as_slice()));
        assert_eq!(config.callbacks.get(IP_DST_CB), Some([].as_slice()));
        let names: Vec<_> = config.callbacks.iter().map(|(c, _)| c).collect();
        assert_eq!(names, vec![IP_SRC_CB, IP_DST_CB, TCP_PORT_80_CB, HTTP_CB]);
        assert_eq!(config.subscribed["SavedFiveTuple"].idx, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(synthesis.notice, None);
    }

    #[test]
    fn passes_restart_at_the_pool_base() {
        let synthesis = assemble(4 + 50 + 50 + 1, &NarrowOptions::default()).unwrap();
        let filters = filters(&synthesis);
        assert_eq!(filters[4 + 49], "ipv4.src_addr = 16.0.0.49 and http");
        assert_eq!(filters[4 + 50], "ipv4.dst_addr = 48.0.0.0 and http");
        assert_eq!(filters[4 + 100], "ipv4.src_addr = 16.0.0.0");
    }

    #[test]
    fn narrow_prelude() {
        let options = NarrowOptions {
            use_broad_ranges: false,
            include_http_filters: false,
            ..NarrowOptions::default()
        };
        let synthesis = assemble(5, &options).unwrap();
        assert_eq!(
            filters(&synthesis),
            vec![
                "ipv4.src_addr = 16.0.0.2 and http",
                "ipv4.dst_addr = 48.0.0.2 and http",
                "tls",
                "ipv4.src_addr = 15.0.0.0 and http",
                "ipv4.src_addr = 15.0.0.1 and http",
            ]
        );
        let config = &synthesis.config;
        assert_eq!(config.callbacks.get(IP_SRC_CB), Some([0, 3, 4].as_slice()));
        assert_eq!(config.callbacks.get(IP_DST_CB), Some([1].as_slice()));
        assert_eq!(config.callbacks.get(HTTP_CB), Some([2].as_slice()));
        assert_eq!(config.callbacks.get(TCP_PORT_80_CB), Some([].as_slice()));
    }

    #[test]
    fn narrow_with_prefix_and_http() {
        let options = NarrowOptions {
            use_broad_ranges: false,
            include_http_filters: true,
            ip_prefix_override: Some(PrefixLen::new_assert(24)),
            ..NarrowOptions::default()
        };
        let synthesis = assemble(4, &options).unwrap();
        assert_eq!(
            filters(&synthesis),
            vec![
                "ipv4.src_addr = 16.0.0.0/24 and http",
                "ipv4.dst_addr = 48.0.0.0/24 and http",
                "tls",
                "http.user_agent = 'asdfg'",
            ]
        );

        let options = NarrowOptions {
            ip_prefix_override: Some(PrefixLen::MAX),
            ..options
        };
        let synthesis = assemble(3, &options).unwrap();
        assert_eq!(
            filters(&synthesis)[..2],
            [
                "ipv4.src_addr = 16.0.0.0/32 and http",
                "ipv4.dst_addr = 48.0.0.0/32 and http",
            ]
        );

        let options = NarrowOptions {
            ip_prefix_override: Some(PrefixLen::new_assert(2)),
            ..options
        };
        assert!(matches!(
            assemble(4, &options),
            Err(SynthError::NarrowBlock(_))
        ));
    }

    #[test]
    fn version_pass_uses_real_servers() {
        let options = NarrowOptions {
            use_broad_ranges: false,
            include_http_filters: false,
            ..NarrowOptions::default()
        };
        // prelude, four decoy passes, then the client version pass
        let count = 3 + 4 * 50 + 50 + 1;
        let synthesis = assemble(count, &options).unwrap();
        let filters = filters(&synthesis);
        assert_eq!(
            filters[3 + 200],
            "ipv4.src_addr = 15.0.0.0 and http.request_version = 'HTTP/1.1'"
        );
        assert_eq!(
            filters[count - 1],
            "ipv4.dst_addr = 48.0.0.0 and http.request_version = 'HTTP/1.1'"
        );
    }

    #[test]
    fn widened_fallback() {
        let synthesis = assemble(4 + 300 + 51, &NarrowOptions::default()).unwrap();
        let filters = filters(&synthesis);
        assert_eq!(
            filters[304],
            "ipv4.src_addr = 16.0.0.0 or ipv4.dst_addr in 1.0.0.0/8"
        );
        assert_eq!(
            filters[354],
            "ipv4.dst_addr = 48.0.0.0 or ipv4.dst_addr in 1.0.0.0/8"
        );
        assert_eq!(synthesis.notice, None);
    }

    #[test]
    #[traced_test]
    fn unreachable_target() {
        let synthesis = assemble(10_000, &NarrowOptions::default()).unwrap();
        let config = &synthesis.config;
        assert_eq!(config.num_subscriptions, 4 + 6 * 50 + 4 * 50);
        assert_eq!(
            synthesis.notice,
            Some(UnderAllocation {
                requested: 10_000,
                achieved: 504,
            })
        );
        assert_eq!(config.filters.filters().last(), Some("ipv4.dst_addr = 48.0.0.49 or udp"));
        assert_eq!(config.validate(IndexMode::Exclusive), Ok(()));
        assert!(logs_contain("only 504 of 10000 requested subscriptions generated"));
    }

    #[test]
    fn small_targets_keep_the_prelude() {
        let synthesis = assemble(1, &NarrowOptions::default()).unwrap();
        assert_eq!(synthesis.config.num_subscriptions, 4);
        assert_eq!(synthesis.notice, None);
    }

    #[test]
    fn deterministic_output() {
        for options in [
            NarrowOptions::default(),
            NarrowOptions {
                use_broad_ranges: false,
                ..NarrowOptions::default()
            },
        ] {
            let a = assemble(400, &options).unwrap().config.to_yaml().unwrap();
            let b = assemble(400, &options).unwrap().config.to_yaml().unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn zero_count() {
        assert_eq!(
            assemble(0, &NarrowOptions::default()),
            Err(SynthError::ZeroCount)
        );
    }
}
