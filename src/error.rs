use thiserror::Error;

/// Errors surfaced at the boundaries of the stack: malformed wire bytes and
/// misconfigured routing/interface setup. Data-plane conditions (stale acks,
/// TTL exhaustion, capacity overflow, ...) are never represented here — per
/// the stack's error-handling policy they are recovered locally and observed
/// through flags, not exceptions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StackError {
    #[error("frame too short: need at least {expected} bytes, got {got}")]
    TruncatedFrame { expected: usize, got: usize },

    #[error("unsupported ethertype {0:#06x}")]
    UnsupportedEtherType(u16),

    #[error("unsupported arp opcode {0}")]
    UnsupportedArpOpcode(u16),

    #[error("arp message has unsupported hardware/protocol address format")]
    UnsupportedArpAddressFormat,

    #[error("ipv4 header too short: {len} bytes, need at least 20")]
    Ipv4HeaderTooShort { len: usize },

    #[error("ipv4 header declares unsupported version {version}")]
    Ipv4BadVersion { version: u8 },

    #[error("ipv4 header internet header length {ihl} is smaller than the minimum")]
    Ipv4BadIhl { ihl: u8 },

    #[error("ipv4 total length {total_length} exceeds the {available} bytes available")]
    Ipv4TruncatedPayload { total_length: u16, available: usize },

    #[error("ipv4 header checksum mismatch: computed {computed:#06x}, header says {declared:#06x}")]
    Ipv4ChecksumMismatch { computed: u16, declared: u16 },

    #[error("route prefix length {prefix_length} exceeds 32 bits")]
    InvalidPrefixLength { prefix_length: u8 },

    #[error("no interface registered at index {index}")]
    NoSuchInterface { index: usize },
}

pub type Result<T> = std::result::Result<T, StackError>;
