use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use super::stats::NetworkStats;

pub const MAX_DATAGRAM_SIZE: usize = 1200;
/// Datagrams kept while the peer's inbound endpoint is not bound yet.
pub const OUTBOUND_HIGH_WATER_MARK: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("failed to bind inbound endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },
    #[error("failed to open outbound endpoint toward {peer}: {source}")]
    Outbound {
        peer: SocketAddrV4,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("no open session")]
    NotConnected,
    #[error("outbound queue full")]
    Backpressure,
    #[error("datagram of {0} bytes exceeds the size limit")]
    Oversized(usize),
    #[error("send failed: {0}")]
    Io(#[from] io::Error),
}

/// One outbound and one inbound channel toward a single peer.
///
/// Nothing here retries: a failed `connect` leaves the session closed and
/// the caller decides when to try again. Loss is flagged, never acted on;
/// `is_connected` stays true until the caller calls `disconnect`.
pub trait Transport {
    /// Tears down any open channels, then opens fresh ones.
    fn connect(&mut self, peer: SocketAddrV4, local_port: u16) -> bool;

    /// Releases both channels. Safe to call repeatedly.
    fn disconnect(&mut self);

    /// Best effort, never blocks.
    fn send(&mut self, payload: &[u8]) -> Result<(), SendError>;

    /// One datagram if one is waiting, never blocks.
    fn try_receive(&mut self) -> Option<Vec<u8>>;

    fn is_connected(&self) -> bool;

    fn is_connection_lost(&self) -> bool;

    fn mark_connection_lost(&mut self);

    fn reset_connection_status(&mut self);

    fn stats(&self) -> &NetworkStats;
}

/// Peer-to-peer UDP session: a socket bound on the local port receives,
/// a second socket connected to the peer sends.
pub struct UdpSession {
    bind_address: Ipv4Addr,
    channels: Option<Channels>,
    connected: bool,
    connection_lost: bool,
    local_port: u16,
    peer_address: Option<SocketAddrV4>,
    stats: NetworkStats,
    // One spare byte so an over-limit datagram shows up as a full read.
    recv_buffer: [u8; MAX_DATAGRAM_SIZE + 1],
}

// Fields drop in declaration order: outbound first, then inbound.
struct Channels {
    outbound: UdpSocket,
    inbound: UdpSocket,
    backlog: VecDeque<Vec<u8>>,
}

impl Channels {
    /// Sends parked datagrams in order, stopping at the first one the peer
    /// is still not ready for.
    fn flush(&mut self, stats: &mut NetworkStats) -> io::Result<()> {
        while let Some(front) = self.backlog.front() {
            match self.outbound.send(front) {
                Ok(bytes) => {
                    stats.record_sent(bytes);
                    self.backlog.pop_front();
                }
                Err(e) if peer_not_ready(&e) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn park(&mut self, payload: &[u8], stats: &mut NetworkStats) -> Result<(), SendError> {
        if self.backlog.len() >= OUTBOUND_HIGH_WATER_MARK {
            stats.packets_dropped += 1;
            return Err(SendError::Backpressure);
        }
        self.backlog.push_back(payload.to_vec());
        stats.packets_queued += 1;
        Ok(())
    }
}

/// The peer has not bound its inbound port yet, or the kernel buffer is
/// full. Expected during the handshake and not a sign of a dead link.
fn peer_not_ready(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::ConnectionRefused
    )
}

impl UdpSession {
    pub fn new(bind_address: Ipv4Addr) -> Self {
        Self {
            bind_address,
            channels: None,
            connected: false,
            connection_lost: false,
            local_port: 0,
            peer_address: None,
            stats: NetworkStats::default(),
            recv_buffer: [0u8; MAX_DATAGRAM_SIZE + 1],
        }
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn peer_address(&self) -> Option<SocketAddrV4> {
        self.peer_address
    }

    /// Address of the inbound endpoint, when open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.channels
            .as_ref()
            .and_then(|channels| channels.inbound.local_addr().ok())
    }

    /// Datagrams waiting for the peer to come up.
    pub fn backlog_len(&self) -> usize {
        self.channels
            .as_ref()
            .map_or(0, |channels| channels.backlog.len())
    }

    // Inbound is acquired first so a taken port fails before anything is
    // sent toward the peer.
    fn open(&self, peer: SocketAddrV4, local_port: u16) -> Result<Channels, ConnectError> {
        let inbound_addr = SocketAddrV4::new(self.bind_address, local_port);
        let inbound = UdpSocket::bind(inbound_addr)
            .and_then(|socket| {
                socket.set_nonblocking(true)?;
                Ok(socket)
            })
            .map_err(|source| ConnectError::Bind {
                addr: inbound_addr,
                source,
            })?;

        let outbound = UdpSocket::bind(SocketAddrV4::new(self.bind_address, 0))
            .and_then(|socket| {
                socket.connect(peer)?;
                socket.set_nonblocking(true)?;
                Ok(socket)
            })
            .map_err(|source| ConnectError::Outbound { peer, source })?;

        Ok(Channels {
            outbound,
            inbound,
            backlog: VecDeque::new(),
        })
    }
}

impl Transport for UdpSession {
    fn connect(&mut self, peer: SocketAddrV4, local_port: u16) -> bool {
        self.disconnect();

        match self.open(peer, local_port) {
            Ok(channels) => {
                log::info!(
                    "Session open: receiving on {}:{}, sending to {}",
                    self.bind_address,
                    local_port,
                    peer
                );
                self.channels = Some(channels);
                self.connected = true;
                self.connection_lost = false;
                self.local_port = local_port;
                self.peer_address = Some(peer);
                self.stats = NetworkStats::default();
                true
            }
            Err(e) => {
                log::error!("Failed to connect: {}", e);
                self.connected = false;
                false
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(channels) = self.channels.take() {
            if !channels.backlog.is_empty() {
                log::debug!("Discarding {} unsent datagrams", channels.backlog.len());
            }
            drop(channels);
            log::info!("Session closed");
        }
        self.connected = false;
        self.peer_address = None;
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        let Some(channels) = self.channels.as_mut() else {
            return Err(SendError::NotConnected);
        };
        if payload.len() > MAX_DATAGRAM_SIZE {
            return Err(SendError::Oversized(payload.len()));
        }

        let result = match channels.flush(&mut self.stats) {
            Ok(()) if !channels.backlog.is_empty() => channels.park(payload, &mut self.stats),
            Ok(()) => match channels.outbound.send(payload) {
                Ok(bytes) => {
                    self.stats.record_sent(bytes);
                    Ok(())
                }
                Err(e) if peer_not_ready(&e) => channels.park(payload, &mut self.stats),
                Err(e) => Err(SendError::Io(e)),
            },
            Err(e) => Err(SendError::Io(e)),
        };

        if let Err(SendError::Io(e)) = &result {
            log::warn!("Send failed, marking connection lost: {}", e);
            self.connection_lost = true;
        }
        result
    }

    fn try_receive(&mut self) -> Option<Vec<u8>> {
        let channels = self.channels.as_ref()?;

        match channels.inbound.recv(&mut self.recv_buffer) {
            Ok(size) if size > MAX_DATAGRAM_SIZE => {
                log::warn!("Discarding datagram over {} bytes", MAX_DATAGRAM_SIZE);
                self.stats.packets_dropped += 1;
                None
            }
            Ok(size) => {
                self.stats.record_received(size);
                Some(self.recv_buffer[..size].to_vec())
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                log::warn!("Receive failed, marking connection lost: {}", e);
                self.connection_lost = true;
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_connection_lost(&self) -> bool {
        self.connection_lost
    }

    fn mark_connection_lost(&mut self) {
        self.connection_lost = true;
    }

    fn reset_connection_status(&mut self) {
        self.connection_lost = false;
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}
