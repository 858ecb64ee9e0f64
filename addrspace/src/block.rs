// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#[cfg(any(test, feature = "bolero"))]
#[allow(unused_imports)] // re-export
pub use contract::*;
use ipnet::{AddrParseError, Ipv4Net};
use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// A contiguous range of IPv4 addresses in CIDR notation.
///
/// Note that unlike [`Ipv4Net`] from the `ipnet` crate, this type ensures that only network bits
/// are set in the address: two blocks are equal if and only if they cover the same addresses.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AddressBlock(Ipv4Net);

/// A checked type describing the values 0 to 32, which constitute all legal prefix lengths for
/// an [`AddressBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PrefixLen(u8);

/// An error indicating that an invalid prefix length was provided.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPrefixLen {
    /// The provided prefix is too long to form a legal [`PrefixLen`]
    #[error("invalid prefix length {0}, max is {MAX}", MAX = PrefixLen::MAX_LEN)]
    TooLong(u8),
}

/// An error indicating that an invalid block was provided.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBlock {
    /// The provided block description contains set non-network bits
    #[error("address {0}/{1} contains non network bits")]
    AddressContainsNonNetworkBits(Ipv4Addr, PrefixLen),
    /// The provided prefix length is invalid
    #[error(transparent)]
    InvalidPrefix(InvalidPrefixLen),
}

/// An error indicating that a string could not be read as an [`AddressBlock`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockParseError {
    /// failure to interpret string as an ip and a prefix length
    #[error(transparent)]
    AddrParseError(AddrParseError),
    /// invalid ip or prefix length
    #[error(transparent)]
    InvalidBlock(InvalidBlock),
}

impl PrefixLen {
    /// The largest possible prefix length (a single address)
    pub const MAX_LEN: u8 = 32;
    /// The largest possible prefix length (a single address)
    pub const MAX: Self = Self(Self::MAX_LEN);

    /// Constructor which asserts if the provided length is invalid.
    /// Useful in const contexts where you are sure you won't panic.
    ///
    /// # Panics
    ///
    /// Panics if the provided length is greater than [`PrefixLen::MAX_LEN`].
    #[must_use]
    pub const fn new_assert(len: u8) -> Self {
        assert!(len <= Self::MAX_LEN, "invalid prefix length");
        Self(len)
    }

    /// Constructor which checks that the provided length is valid.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPrefixLen::TooLong`] if the provided length is greater than
    /// [`PrefixLen::MAX_LEN`].
    pub const fn try_new(len: u8) -> Result<PrefixLen, InvalidPrefixLen> {
        if len > Self::MAX_LEN {
            return Err(InvalidPrefixLen::TooLong(len));
        }
        Ok(PrefixLen(len))
    }

    /// Interpret the [`PrefixLen`] as a `u8`
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// The number of host bits left by this prefix length.
    #[must_use]
    pub const fn host_bits(&self) -> u32 {
        (Self::MAX_LEN - self.0) as u32
    }
}

impl TryFrom<u8> for PrefixLen {
    type Error = InvalidPrefixLen;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PrefixLen::try_new(value)
    }
}

impl Display for PrefixLen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<PrefixLen> for u8 {
    fn eq(&self, other: &PrefixLen) -> bool {
        *self == other.0
    }
}

impl PartialEq<u8> for PrefixLen {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

const fn network_mask(len: u8) -> u32 {
    // a shift by 32 must clear every bit rather than wrap around
    match u32::MAX.checked_shl((PrefixLen::MAX_LEN - len) as u32) {
        Some(mask) => mask,
        None => 0,
    }
}

impl AddressBlock {
    /// The whole IPv4 address space, aka 0.0.0.0/0
    pub const ROOT: AddressBlock = AddressBlock::new_assert([0, 0, 0, 0], 0);

    /// Validating a constructor which panics if the arguments are invalid.
    /// Useful in const contexts and testing.
    ///
    /// # Panics
    ///
    /// * Panics if the provided prefix is greater than 32
    /// * Panics if the provided address contains non-network bits.
    #[must_use]
    pub const fn new_assert(addr: [u8; 4], prefix: u8) -> Self {
        let addr = Ipv4Addr::new(addr[0], addr[1], addr[2], addr[3]);
        let prefix = PrefixLen::new_assert(prefix);
        assert!(
            addr.to_bits() & network_mask(prefix.0) == addr.to_bits(),
            "address block contains non network bits"
        );
        AddressBlock(Ipv4Net::new_assert(addr, prefix.0))
    }

    /// Constructor which validates the arguments provided.
    ///
    /// # Errors
    ///
    /// * Returns [`InvalidBlock::InvalidPrefix`] if the provided prefix length is greater than
    ///   [`PrefixLen::MAX_LEN`].
    /// * Returns [`InvalidBlock::AddressContainsNonNetworkBits`] if the provided address contains
    ///   non-network bits.
    #[tracing::instrument(level = "trace")]
    pub fn new_strict(
        addr: impl Into<Ipv4Addr> + Debug,
        prefix: impl TryInto<PrefixLen, Error = InvalidPrefixLen> + Debug,
    ) -> Result<AddressBlock, InvalidBlock> {
        let addr = addr.into();
        let prefix = prefix.try_into().map_err(InvalidBlock::InvalidPrefix)?;
        if addr.to_bits() & network_mask(prefix.0) != addr.to_bits() {
            return Err(InvalidBlock::AddressContainsNonNetworkBits(addr, prefix));
        }
        Ok(AddressBlock(Ipv4Net::new_assert(addr, prefix.0)))
    }

    /// Build the block of the given length containing `addr`, clearing any host bits.
    #[must_use]
    pub fn covering(addr: Ipv4Addr, prefix: PrefixLen) -> AddressBlock {
        let addr = Ipv4Addr::from_bits(addr.to_bits() & network_mask(prefix.0));
        AddressBlock(Ipv4Net::new_assert(addr, prefix.0))
    }

    /// Returns the network address of the block.
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        self.0.addr()
    }

    /// Returns the prefix length of the block.
    #[must_use]
    pub const fn prefix_len(&self) -> PrefixLen {
        PrefixLen(self.0.prefix_len()) // checked already
    }

    /// Returns the last address covered by the block.
    #[must_use]
    pub fn last(&self) -> Ipv4Addr {
        self.0.broadcast()
    }

    /// Returns the number of addresses covered by the block.
    #[must_use]
    pub const fn size(&self) -> u64 {
        1u64 << self.prefix_len().host_bits()
    }

    /// Returns the address if the block covers exactly one address.
    #[must_use]
    pub const fn as_host(&self) -> Option<Ipv4Addr> {
        if self.0.prefix_len() == PrefixLen::MAX_LEN {
            Some(self.0.addr())
        } else {
            None
        }
    }

    /// Returns true if `other` is fully covered by this block.
    #[must_use]
    pub fn contains(&self, other: &AddressBlock) -> bool {
        self.0.contains(&other.0)
    }

    /// Returns true if the two blocks share at least one address.
    #[must_use]
    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl Display for AddressBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Ipv4Addr> for AddressBlock {
    fn from(value: Ipv4Addr) -> Self {
        AddressBlock(Ipv4Net::new_assert(value, PrefixLen::MAX_LEN))
    }
}

impl FromStr for AddressBlock {
    type Err = BlockParseError;

    /// Attempt to parse an [`AddressBlock`] from a `str`.
    ///
    /// # Errors
    ///
    /// * Returns [`BlockParseError::AddrParseError`] if the provided string cannot be parsed as an
    ///   address and a prefix length.
    /// * Returns [`BlockParseError::InvalidBlock`] if the provided string can be parsed, but
    ///   non-network bits are set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net = Ipv4Net::from_str(s).map_err(BlockParseError::AddrParseError)?;
        AddressBlock::new_strict(net.addr(), net.prefix_len())
            .map_err(BlockParseError::InvalidBlock)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::block::{AddressBlock, PrefixLen};
    use bolero::{Driver, TypeGenerator, ValueGenerator};
    use std::net::Ipv4Addr;
    use std::ops::Bound;

    impl TypeGenerator for PrefixLen {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(PrefixLen::new_assert(driver.gen_u8(
                Bound::Included(&0),
                Bound::Included(&PrefixLen::MAX_LEN),
            )?))
        }
    }

    impl TypeGenerator for AddressBlock {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let ip: Ipv4Addr = driver.produce()?;
            let prefix: PrefixLen = driver.produce()?;
            Some(AddressBlock::covering(ip, prefix))
        }
    }

    /// Value generator which produces blocks that can still be split at least `depth` times.
    ///
    /// Keeps partitions produced from the generated blocks small enough to enumerate in tests.
    pub struct SplittableBlockGenerator {
        depth: u8,
    }

    impl SplittableBlockGenerator {
        /// Create a new [`SplittableBlockGenerator`]
        #[must_use]
        pub const fn new(depth: u8) -> Self {
            Self { depth }
        }
    }

    impl ValueGenerator for SplittableBlockGenerator {
        type Output = AddressBlock;

        fn generate<D: Driver>(&self, driver: &mut D) -> Option<Self::Output> {
            let ip: Ipv4Addr = driver.produce()?;
            let len = driver.gen_u8(
                Bound::Included(&0),
                Bound::Included(&(PrefixLen::MAX_LEN - self.depth)),
            )?;
            Some(AddressBlock::covering(ip, PrefixLen::new_assert(len)))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::block::{AddressBlock, BlockParseError, InvalidBlock, InvalidPrefixLen, PrefixLen};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    #[test]
    #[should_panic]
    fn non_network_bits_panic_in_asserting_constructor() {
        let _ = AddressBlock::new_assert([192, 168, 0, 1], 24);
    }

    #[test]
    fn prefix_len_soundness() {
        bolero::check!().with_type().cloned().for_each(|val: u8| {
            match PrefixLen::try_new(val) {
                Ok(prefix) => {
                    assert_eq!(prefix.as_u8(), val);
                    assert!(prefix <= PrefixLen::MAX);
                    assert_eq!(format!("{prefix}"), val.to_string());
                    assert_eq!(prefix.host_bits(), u32::from(32 - val));
                }
                Err(InvalidPrefixLen::TooLong(err_val)) => {
                    assert_eq!(err_val, val);
                    assert!(err_val > PrefixLen::MAX_LEN);
                }
            }
        });
    }

    #[test]
    fn non_network_bits_in_checked_constructor_returns_error() {
        let ip = Ipv4Addr::new(192, 168, 0, 1);
        match AddressBlock::new_strict(ip, 24) {
            Ok(_) | Err(InvalidBlock::InvalidPrefix(_)) => unreachable!(),
            Err(InvalidBlock::AddressContainsNonNetworkBits(err_ip, err_prefix)) => {
                assert_eq!(err_ip, ip);
                assert_eq!(err_prefix, 24);
            }
        }
    }

    #[test]
    fn parse_rejects_host_bits() {
        assert!(matches!(
            AddressBlock::from_str("16.0.0.1/24"),
            Err(BlockParseError::InvalidBlock(_))
        ));
        assert!(matches!(
            AddressBlock::from_str("not a block"),
            Err(BlockParseError::AddrParseError(_))
        ));
        let block = AddressBlock::from_str("16.0.0.0/24").unwrap();
        assert_eq!(block, AddressBlock::new_assert([16, 0, 0, 0], 24));
        assert_eq!(block.size(), 256);
        assert_eq!(block.last(), Ipv4Addr::new(16, 0, 0, 255));
    }

    #[test]
    fn host_blocks() {
        let host = AddressBlock::from(Ipv4Addr::new(16, 0, 0, 2));
        assert_eq!(host.as_host(), Some(Ipv4Addr::new(16, 0, 0, 2)));
        assert_eq!(host.size(), 1);
        assert_eq!(AddressBlock::ROOT.as_host(), None);
        assert_eq!(AddressBlock::ROOT.size(), 1 << 32);
    }

    #[test]
    fn covering_clears_host_bits() {
        bolero::check!()
            .with_type()
            .cloned()
            .for_each(|(ip, len): (Ipv4Addr, PrefixLen)| {
                let block = AddressBlock::covering(ip, len);
                assert_eq!(block.prefix_len(), len);
                assert!(block.contains(&AddressBlock::from(ip)));
                assert!(AddressBlock::ROOT.contains(&block));
                let reparsed = AddressBlock::from_str(&block.to_string()).unwrap();
                assert_eq!(reparsed, block);
            });
    }
}
