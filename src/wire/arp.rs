//! Fixed 28-byte ARP message layout for Ethernet/IPv4.

use crate::error::StackError;
use crate::wire::ethernet::EthernetAddress;

pub const MESSAGE_LEN: usize = 28;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request,
    Reply,
}

impl ArpOpcode {
    fn as_u16(self) -> u16 {
        match self {
            ArpOpcode::Request => 1,
            ArpOpcode::Reply => 2,
        }
    }

    fn from_u16(raw: u16) -> Result<Self, StackError> {
        match raw {
            1 => Ok(ArpOpcode::Request),
            2 => Ok(ArpOpcode::Reply),
            other => Err(StackError::UnsupportedArpOpcode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: ArpOpcode,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: u32,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: u32,
}

impl ArpMessage {
    pub fn parse(bytes: &[u8]) -> Result<Self, StackError> {
        if bytes.len() < MESSAGE_LEN {
            return Err(StackError::TruncatedFrame {
                expected: MESSAGE_LEN,
                got: bytes.len(),
            });
        }

        let htype = u16::from_be_bytes([bytes[0], bytes[1]]);
        let ptype = u16::from_be_bytes([bytes[2], bytes[3]]);
        let hlen = bytes[4];
        let plen = bytes[5];
        if htype != HTYPE_ETHERNET || ptype != PTYPE_IPV4 || hlen != HLEN_ETHERNET || plen != PLEN_IPV4 {
            return Err(StackError::UnsupportedArpAddressFormat);
        }

        let opcode = ArpOpcode::from_u16(u16::from_be_bytes([bytes[6], bytes[7]]))?;

        let mut sender_eth = [0u8; 6];
        sender_eth.copy_from_slice(&bytes[8..14]);
        let sender_ip = u32::from_be_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);

        let mut target_eth = [0u8; 6];
        target_eth.copy_from_slice(&bytes[18..24]);
        let target_ip = u32::from_be_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);

        Ok(ArpMessage {
            opcode,
            sender_ethernet_address: EthernetAddress(sender_eth),
            sender_ip_address: sender_ip,
            target_ethernet_address: EthernetAddress(target_eth),
            target_ip_address: target_ip,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MESSAGE_LEN);
        out.extend_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        out.extend_from_slice(&PTYPE_IPV4.to_be_bytes());
        out.push(HLEN_ETHERNET);
        out.push(PLEN_IPV4);
        out.extend_from_slice(&self.opcode.as_u16().to_be_bytes());
        out.extend_from_slice(&self.sender_ethernet_address.0);
        out.extend_from_slice(&self.sender_ip_address.to_be_bytes());
        out.extend_from_slice(&self.target_ethernet_address.0);
        out.extend_from_slice(&self.target_ip_address.to_be_bytes());
        out
    }
}
