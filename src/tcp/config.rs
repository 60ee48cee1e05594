use crate::wrap32::Wrap32;

/// Largest payload a single outbound segment may carry.
pub const MAX_PAYLOAD: usize = 1452;

/// Window advertisements are never larger than this, regardless of how much
/// capacity the inbound stream actually has.
pub const MAX_WINDOW_SIZE: u16 = 65535;

/// Tunable knobs for a [`super::sender::TCPSender`]. Kept as a config value
/// rather than hardcoded constants so tests can shrink the retransmission
/// timeout instead of waiting out production defaults.
#[derive(Debug, Clone)]
pub struct TCPSenderConfig {
    pub initial_rto_ms: u64,
    /// Fixed initial sequence number; `None` draws a random one.
    pub fixed_isn: Option<Wrap32>,
}

impl Default for TCPSenderConfig {
    fn default() -> Self {
        TCPSenderConfig {
            initial_rto_ms: 1000,
            fixed_isn: None,
        }
    }
}
