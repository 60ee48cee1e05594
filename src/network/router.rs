//! Longest-prefix-match IPv4 forwarding across a set of interfaces.

use crate::error::StackError;
use crate::network::interface::NetworkInterface;
use crate::wire::ipv4::Ipv4Datagram;

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub prefix: u32,
    pub prefix_length: u8,
    pub next_hop: Option<u32>,
    pub interface_index: usize,
}

impl Route {
    fn matches(&self, dst: u32) -> bool {
        if self.prefix_length == 0 {
            return true;
        }
        let mask = !0u32 << (32 - self.prefix_length);
        (dst & mask) == (self.prefix & mask)
    }
}

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    interfaces: Vec<NetworkInterface>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Registers an interface, returning its index for use in
    /// [`Router::add_route`].
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&mut self, index: usize) -> Result<&mut NetworkInterface, StackError> {
        self.interfaces
            .get_mut(index)
            .ok_or(StackError::NoSuchInterface { index })
    }

    /// Appends a route. No deduplication: duplicate or shadowed routes are
    /// allowed and ties on prefix length resolve to insertion order.
    pub fn add_route(
        &mut self,
        prefix: u32,
        prefix_length: u8,
        next_hop: Option<u32>,
        interface_index: usize,
    ) -> Result<(), StackError> {
        if prefix_length > 32 {
            return Err(StackError::InvalidPrefixLength { prefix_length });
        }
        if interface_index >= self.interfaces.len() {
            return Err(StackError::NoSuchInterface { index: interface_index });
        }
        self.routes.push(Route {
            prefix,
            prefix_length,
            next_hop,
            interface_index,
        });
        Ok(())
    }

    /// Among all matching routes, picks the one with the greatest prefix
    /// length; on a tie the first-added route wins. `Iterator::max_by_key`
    /// keeps the *last* max on ties, which is the wrong direction here, so
    /// this folds by hand with a strict `>`.
    fn best_route(&self, dst: u32) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|route| route.matches(dst))
            .fold(None, |best: Option<&Route>, route| {
                if best.map_or(true, |b| route.prefix_length > b.prefix_length) {
                    Some(route)
                } else {
                    best
                }
            })
    }

    /// Drains every interface's queue of parsed inbound datagrams (surfaced
    /// via `recv_frame` upstream and fed in through a caller-held buffer in
    /// this simplified core) and forwards each.
    pub fn route_datagram(&mut self, dgram: Ipv4Datagram) {
        let Some(route) = self.best_route(dgram.header.dst) else {
            tracing::debug!(dst = dgram.header.dst, "no matching route, dropping");
            return;
        };
        let interface_index = route.interface_index;
        let next_hop = route.next_hop.unwrap_or(dgram.header.dst);

        let mut dgram = dgram;
        if !dgram.decrement_ttl_and_reckon() {
            tracing::debug!("ttl exhausted, dropping");
            return;
        }

        if let Ok(interface) = self.interface(interface_index) {
            interface.send_datagram(dgram, next_hop);
        }
    }
}
