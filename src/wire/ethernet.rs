//! 14-byte Ethernet header: 6-byte destination, 6-byte source, 2-byte
//! ethertype.

use std::fmt;

use crate::error::StackError;

pub const HEADER_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetAddress(pub [u8; 6]);

pub const BROADCAST: EthernetAddress = EthernetAddress([0xff; 6]);

impl EthernetAddress {
    pub fn is_broadcast(&self) -> bool {
        *self == BROADCAST
    }
}

impl fmt::Display for EthernetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Arp,
}

impl EtherType {
    fn as_u16(self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
        }
    }

    fn from_u16(raw: u16) -> Result<Self, StackError> {
        match raw {
            0x0800 => Ok(EtherType::Ipv4),
            0x0806 => Ok(EtherType::Arp),
            other => Err(StackError::UnsupportedEtherType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ethertype: EtherType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn parse(bytes: &[u8]) -> Result<Self, StackError> {
        if bytes.len() < HEADER_LEN {
            return Err(StackError::TruncatedFrame {
                expected: HEADER_LEN,
                got: bytes.len(),
            });
        }
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&bytes[0..6]);
        src.copy_from_slice(&bytes[6..12]);
        let ethertype = EtherType::from_u16(u16::from_be_bytes([bytes[12], bytes[13]]))?;

        Ok(EthernetFrame {
            header: EthernetHeader {
                dst: EthernetAddress(dst),
                src: EthernetAddress(src),
                ethertype,
            },
            payload: bytes[HEADER_LEN..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.header.dst.0);
        out.extend_from_slice(&self.header.src.0);
        out.extend_from_slice(&self.header.ethertype.as_u16().to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}
