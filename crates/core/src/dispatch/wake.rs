//! Wake-on-LAN.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::info;

use crate::transcode::TranscodeError;

/// Length of a magic packet: 6 sync bytes plus 16 copies of the address.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Something that can power on the remote transcode host.
#[async_trait]
pub trait WakeSignal: Send + Sync {
    async fn wake(&self) -> Result<(), TranscodeError>;
}

/// Sends a wake-on-LAN magic packet as a UDP broadcast.
#[derive(Debug, Clone)]
pub struct MagicPacketSender {
    mac: [u8; 6],
    broadcast_addr: SocketAddr,
}

impl MagicPacketSender {
    pub fn new(mac_address: &str, broadcast_addr: SocketAddr) -> Result<Self, TranscodeError> {
        Ok(Self {
            mac: parse_mac(mac_address)?,
            broadcast_addr,
        })
    }
}

#[async_trait]
impl WakeSignal for MagicPacketSender {
    async fn wake(&self) -> Result<(), TranscodeError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.set_broadcast(true)?;
        socket
            .send_to(&magic_packet(&self.mac), self.broadcast_addr)
            .await?;
        info!(mac = %format_mac(&self.mac), target = %self.broadcast_addr, "Sent wake-on-LAN packet");
        Ok(())
    }
}

/// Builds the magic packet for a hardware address.
pub fn magic_packet(mac: &[u8; 6]) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(mac);
    }
    packet
}

/// Parses `aa:bb:cc:dd:ee:ff` (also `-` or `.` separated).
pub fn parse_mac(value: &str) -> Result<[u8; 6], TranscodeError> {
    let invalid = || TranscodeError::invalid_option(format!("invalid MAC address: {:?}", value));

    let mut mac = [0u8; 6];
    let mut parts = value.split([':', '-', '.']);
    for byte in mac.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        if part.len() != 2 {
            return Err(invalid());
        }
        *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(mac)
}

fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: [u8; 6] = [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xCC];

    #[test]
    fn test_parse_mac() {
        assert_eq!(parse_mac("00:11:22:aa:bb:cc").unwrap(), MAC);
        assert_eq!(parse_mac("00-11-22-AA-BB-CC").unwrap(), MAC);
        assert!(parse_mac("00:11:22:aa:bb").is_err());
        assert!(parse_mac("00:11:22:aa:bb:cc:dd").is_err());
        assert!(parse_mac("00:11:22:aa:bb:zz").is_err());
        assert!(parse_mac("0:11:22:aa:bb:cc").is_err());
    }

    #[test]
    fn test_magic_packet_layout() {
        let packet = magic_packet(&MAC);
        assert_eq!(packet.len(), 102);
        assert_eq!(&packet[..6], &[0xFF; 6]);
        for i in 0..16 {
            let start = 6 + i * 6;
            assert_eq!(&packet[start..start + 6], &MAC);
        }
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&MAC), "00:11:22:aa:bb:cc");
    }

    #[tokio::test]
    async fn test_wake_sends_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = MagicPacketSender::new("00:11:22:aa:bb:cc", target).unwrap();

        sender.wake().await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &magic_packet(&MAC)[..]);
    }
}
