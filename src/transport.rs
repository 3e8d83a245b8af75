//! 데이터그램 전송 계층
//!
//! 수신측 주소는 세션 동안 고정. 테스트에서는 스크립트 기반 구현으로 교체한다.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::info;

use crate::ACK_SIZE;

/// 단일 피어와의 비신뢰 데이터그램 채널
#[async_trait]
pub trait Transport: Send {
    /// 데이터그램 하나 전송
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()>;

    /// 데이터그램 하나 수신, 수신 바이트 수 반환
    ///
    /// 타임아웃은 호출측이 건다.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// 이미 도착해 대기 중인 데이터그램을 기다리지 않고 모두 버림, 버린 개수 반환
    fn drain(&mut self) -> io::Result<usize> {
        Ok(0)
    }
}

/// UDP 소켓 구현
///
/// 소켓을 피어에 connect 해두므로 다른 주소에서 온 데이터그램은 OS가 걸러낸다.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    pub async fn connect(bind_addr: SocketAddr, peer: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(peer).await?;

        info!("UDP transport bound to {}, peer: {}", socket.local_addr()?, peer);

        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(datagram).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("partial datagram: {} of {} bytes", sent, datagram.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }

    fn drain(&mut self) -> io::Result<usize> {
        let mut buf = [0u8; ACK_SIZE];
        let mut dropped = 0;
        loop {
            match self.socket.try_recv(&mut buf) {
                Ok(_) => dropped += 1,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(dropped),
                // 이전 송신에 대한 ICMP 거부 통지
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_transport_roundtrip() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let mut transport = UdpTransport::connect("127.0.0.1:0".parse().unwrap(), peer_addr)
            .await
            .unwrap();
        assert_eq!(transport.peer(), peer_addr);

        transport.send(b"hello").await.unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"hello");

        peer.send_to(b"OK", from).await.unwrap();
        let len = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"OK");
    }

    #[tokio::test]
    async fn test_drain_discards_queued_datagrams() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport = UdpTransport::connect("127.0.0.1:0".parse().unwrap(), peer.local_addr().unwrap())
            .await
            .unwrap();
        let local = transport.local_addr().unwrap();

        assert_eq!(transport.drain().unwrap(), 0);

        peer.send_to(b"OK", local).await.unwrap();
        peer.send_to(b"OKSS", local).await.unwrap();
        peer.send_to(b"FRESH", local).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(transport.drain().unwrap(), 3);

        peer.send_to(b"NEXT", local).await.unwrap();
        let mut buf = [0u8; 16];
        let len = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"NEXT");
    }
}
