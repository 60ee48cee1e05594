//! Bridges IPv4 datagrams to Ethernet frames via ARP, with a timed cache
//! and rate-limited re-requests.

use std::collections::{HashMap, VecDeque};

use crate::wire::arp::{ArpMessage, ArpOpcode};
use crate::wire::ethernet::{EtherType, EthernetAddress, EthernetFrame, EthernetHeader, BROADCAST};
use crate::wire::ipv4::Ipv4Datagram;

/// How long a learned ARP mapping stays valid without being refreshed.
pub const MAPPING_TTL_MS: u64 = 30_000;
/// Minimum spacing between repeated ARP requests for the same unresolved
/// next hop.
pub const ARP_MIN_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy)]
pub struct NetworkInterfaceConfig {
    pub mapping_ttl_ms: u64,
    pub arp_min_interval_ms: u64,
}

impl Default for NetworkInterfaceConfig {
    fn default() -> Self {
        NetworkInterfaceConfig {
            mapping_ttl_ms: MAPPING_TTL_MS,
            arp_min_interval_ms: ARP_MIN_INTERVAL_MS,
        }
    }
}

struct CacheEntry {
    ethernet_address: EthernetAddress,
    age_ms: u64,
}

struct PendingRequest {
    age_ms: u64,
}

#[derive(Debug)]
pub struct NetworkInterface {
    ethernet_address: EthernetAddress,
    ip_address: u32,
    config: NetworkInterfaceConfig,

    arp_cache: HashMap<u32, CacheEntry>,
    pending_requests: HashMap<u32, PendingRequest>,
    waiting_datagrams: HashMap<u32, Vec<Ipv4Datagram>>,
    outbound_frames: VecDeque<EthernetFrame>,
}

// Split out so `CacheEntry`/`PendingRequest` (private fields) don't need to
// leak into the struct's own doc comment above.
impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("ethernet_address", &self.ethernet_address)
            .field("age_ms", &self.age_ms)
            .finish()
    }
}
impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest").field("age_ms", &self.age_ms).finish()
    }
}

impl NetworkInterface {
    pub fn new(ethernet_address: EthernetAddress, ip_address: u32, config: NetworkInterfaceConfig) -> Self {
        NetworkInterface {
            ethernet_address,
            ip_address,
            config,
            arp_cache: HashMap::new(),
            pending_requests: HashMap::new(),
            waiting_datagrams: HashMap::new(),
            outbound_frames: VecDeque::new(),
        }
    }

    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    pub fn ip_address(&self) -> u32 {
        self.ip_address
    }

    /// Queues `dgram` for `next_hop`, resolving its MAC address first if
    /// necessary.
    pub fn send_datagram(&mut self, dgram: Ipv4Datagram, next_hop: u32) {
        if let Some(entry) = self.arp_cache.get(&next_hop) {
            self.emit_ipv4(dgram, entry.ethernet_address);
            return;
        }

        self.waiting_datagrams.entry(next_hop).or_default().push(dgram);

        if !self.pending_requests.contains_key(&next_hop) {
            self.emit_arp_request(next_hop);
            self.pending_requests.insert(next_hop, PendingRequest { age_ms: 0 });
        }
    }

    /// Processes an inbound Ethernet frame. Returns `Some(datagram)` for
    /// deliverable IPv4 traffic; ARP frames never produce a datagram.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        if frame.header.dst != self.ethernet_address && !frame.header.dst.is_broadcast() {
            return None;
        }

        match frame.header.ethertype {
            EtherType::Ipv4 => match Ipv4Datagram::parse(&frame.payload) {
                Ok(dgram) => Some(dgram),
                Err(error) => {
                    tracing::debug!(%error, "dropping malformed ipv4 datagram");
                    None
                }
            },
            EtherType::Arp => {
                self.handle_arp(&frame.payload);
                None
            }
        }
    }

    fn handle_arp(&mut self, payload: &[u8]) {
        let msg = match ArpMessage::parse(payload) {
            Ok(msg) => msg,
            Err(error) => {
                tracing::debug!(%error, "dropping malformed arp message");
                return;
            }
        };

        self.arp_cache.entry(msg.sender_ip_address).or_insert(CacheEntry {
            ethernet_address: msg.sender_ethernet_address,
            age_ms: 0,
        });

        match msg.opcode {
            ArpOpcode::Request if msg.target_ip_address == self.ip_address => {
                let reply = ArpMessage {
                    opcode: ArpOpcode::Reply,
                    sender_ethernet_address: self.ethernet_address,
                    sender_ip_address: self.ip_address,
                    target_ethernet_address: msg.sender_ethernet_address,
                    target_ip_address: msg.sender_ip_address,
                };
                self.outbound_frames.push_back(EthernetFrame {
                    header: EthernetHeader {
                        dst: msg.sender_ethernet_address,
                        src: self.ethernet_address,
                        ethertype: EtherType::Arp,
                    },
                    payload: reply.to_bytes(),
                });
            }
            ArpOpcode::Reply => {
                self.pending_requests.remove(&msg.sender_ip_address);
                if let Some(waiting) = self.waiting_datagrams.remove(&msg.sender_ip_address) {
                    for dgram in waiting {
                        self.emit_ipv4(dgram, msg.sender_ethernet_address);
                    }
                }
            }
            ArpOpcode::Request => {}
        }
    }

    /// Ages cache and pending-request entries; evicts stale cache entries
    /// and re-emits ARP requests whose interval has elapsed.
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        let ttl = self.config.mapping_ttl_ms;
        self.arp_cache.retain(|ip, entry| {
            entry.age_ms += ms_since_last_tick;
            let keep = entry.age_ms <= ttl;
            if !keep {
                tracing::debug!(ip, "evicting expired arp cache entry");
            }
            keep
        });

        let interval = self.config.arp_min_interval_ms;
        let mut to_rerequest = Vec::new();
        for (&ip, pending) in self.pending_requests.iter_mut() {
            pending.age_ms += ms_since_last_tick;
            if pending.age_ms > interval {
                to_rerequest.push(ip);
            }
        }
        for ip in to_rerequest {
            self.emit_arp_request(ip);
            if let Some(pending) = self.pending_requests.get_mut(&ip) {
                pending.age_ms = 0;
            }
        }
    }

    /// Dequeues the next outbound Ethernet frame, if any.
    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.outbound_frames.pop_front()
    }

    fn emit_ipv4(&mut self, dgram: Ipv4Datagram, dst: EthernetAddress) {
        self.outbound_frames.push_back(EthernetFrame {
            header: EthernetHeader {
                dst,
                src: self.ethernet_address,
                ethertype: EtherType::Ipv4,
            },
            payload: dgram.to_bytes(),
        });
    }

    fn emit_arp_request(&mut self, target_ip: u32) {
        let request = ArpMessage {
            opcode: ArpOpcode::Request,
            sender_ethernet_address: self.ethernet_address,
            sender_ip_address: self.ip_address,
            target_ethernet_address: EthernetAddress([0; 6]),
            target_ip_address: target_ip,
        };
        self.outbound_frames.push_back(EthernetFrame {
            header: EthernetHeader {
                dst: BROADCAST,
                src: self.ethernet_address,
                ethertype: EtherType::Arp,
            },
            payload: request.to_bytes(),
        });
    }
}
