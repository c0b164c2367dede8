//! In-process datagram network. Endpoints bind ports on a shared medium and
//! exchange payloads without touching the OS, which keeps two peers in one
//! process deterministic.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddrV4;
use std::rc::Rc;

use crate::rng::Rng;

use super::stats::{NetworkStats, PacketLossSimulation};
use super::transport::{OUTBOUND_HIGH_WATER_MARK, SendError, Transport};

struct Medium {
    mailboxes: HashMap<u16, VecDeque<Vec<u8>>>,
    broken: HashSet<u16>,
    loss: PacketLossSimulation,
    rng: Rng,
}

impl Medium {
    /// False when nothing is bound on `port`. A datagram eaten by the loss
    /// simulation still counts as delivered.
    fn deliver(&mut self, port: u16, payload: &[u8]) -> bool {
        let Some(mailbox) = self.mailboxes.get_mut(&port) else {
            return false;
        };
        if !self.loss.should_drop(&mut self.rng) {
            mailbox.push_back(payload.to_vec());
        }
        true
    }
}

#[derive(Clone)]
pub struct LoopbackNetwork {
    medium: Rc<RefCell<Medium>>,
}

impl Default for LoopbackNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::with_loss(PacketLossSimulation::default(), 0)
    }

    pub fn with_loss(loss: PacketLossSimulation, seed: u32) -> Self {
        Self {
            medium: Rc::new(RefCell::new(Medium {
                mailboxes: HashMap::new(),
                broken: HashSet::new(),
                loss,
                rng: Rng::new(seed),
            })),
        }
    }

    pub fn endpoint(&self) -> LoopbackTransport {
        LoopbackTransport {
            network: self.clone(),
            local_port: None,
            peer_port: None,
            backlog: VecDeque::new(),
            connected: false,
            connection_lost: false,
            stats: NetworkStats::default(),
        }
    }

    pub fn is_bound(&self, port: u16) -> bool {
        self.medium.borrow().mailboxes.contains_key(&port)
    }

    /// Datagrams waiting on `port`.
    pub fn pending(&self, port: u16) -> usize {
        self.medium
            .borrow()
            .mailboxes
            .get(&port)
            .map_or(0, VecDeque::len)
    }

    /// Drops a raw datagram into a bound port's mailbox.
    pub fn inject(&self, port: u16, payload: &[u8]) -> bool {
        match self.medium.borrow_mut().mailboxes.get_mut(&port) {
            Some(mailbox) => {
                mailbox.push_back(payload.to_vec());
                true
            }
            None => false,
        }
    }

    /// The next receive on `port` fails the way a dead socket would.
    pub fn break_port(&self, port: u16) {
        self.medium.borrow_mut().broken.insert(port);
    }

    fn bind(&self, port: u16) -> bool {
        let mut medium = self.medium.borrow_mut();
        if medium.mailboxes.contains_key(&port) {
            return false;
        }
        medium.mailboxes.insert(port, VecDeque::new());
        true
    }

    fn unbind(&self, port: u16) {
        let mut medium = self.medium.borrow_mut();
        medium.mailboxes.remove(&port);
        medium.broken.remove(&port);
    }
}

/// A [`Transport`] over a [`LoopbackNetwork`]. Only ports matter; the
/// peer's IP is ignored.
pub struct LoopbackTransport {
    network: LoopbackNetwork,
    local_port: Option<u16>,
    peer_port: Option<u16>,
    backlog: VecDeque<Vec<u8>>,
    connected: bool,
    connection_lost: bool,
    stats: NetworkStats,
}

impl LoopbackTransport {
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    fn flush(&mut self, peer: u16) {
        let mut medium = self.network.medium.borrow_mut();
        while let Some(front) = self.backlog.front() {
            if !medium.deliver(peer, front) {
                break;
            }
            self.stats.record_sent(front.len());
            self.backlog.pop_front();
        }
    }

    fn park(&mut self, payload: &[u8]) -> Result<(), SendError> {
        if self.backlog.len() >= OUTBOUND_HIGH_WATER_MARK {
            self.stats.packets_dropped += 1;
            return Err(SendError::Backpressure);
        }
        self.backlog.push_back(payload.to_vec());
        self.stats.packets_queued += 1;
        Ok(())
    }
}

impl Transport for LoopbackTransport {
    fn connect(&mut self, peer: SocketAddrV4, local_port: u16) -> bool {
        self.disconnect();

        if !self.network.bind(local_port) {
            log::error!("Failed to connect: loopback port {} already bound", local_port);
            return false;
        }

        self.local_port = Some(local_port);
        self.peer_port = Some(peer.port());
        self.connected = true;
        self.connection_lost = false;
        self.stats = NetworkStats::default();
        true
    }

    fn disconnect(&mut self) {
        if let Some(port) = self.local_port.take() {
            self.network.unbind(port);
        }
        self.backlog.clear();
        self.peer_port = None;
        self.connected = false;
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        let Some(peer) = self.peer_port.filter(|_| self.connected) else {
            return Err(SendError::NotConnected);
        };

        self.flush(peer);
        if !self.backlog.is_empty() {
            return self.park(payload);
        }

        let delivered = self.network.medium.borrow_mut().deliver(peer, payload);
        if delivered {
            self.stats.record_sent(payload.len());
            Ok(())
        } else {
            self.park(payload)
        }
    }

    fn try_receive(&mut self) -> Option<Vec<u8>> {
        let port = self.local_port?;
        let mut medium = self.network.medium.borrow_mut();

        if medium.broken.remove(&port) {
            log::warn!("Receive failed on loopback port {}", port);
            self.connection_lost = true;
            return None;
        }

        let payload = medium.mailboxes.get_mut(&port)?.pop_front()?;
        self.stats.record_received(payload.len());
        Some(payload)
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

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn peer(port: u16) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
    }

    #[test]
    fn exchange_between_endpoints() {
        let network = LoopbackNetwork::new();
        let mut a = network.endpoint();
        let mut b = network.endpoint();
        assert!(a.connect(peer(2), 1));
        assert!(b.connect(peer(1), 2));

        a.send(b"hello").unwrap();
        assert_eq!(b.try_receive().as_deref(), Some(&b"hello"[..]));
        assert!(b.try_receive().is_none());
        assert_eq!(a.stats().packets_sent, 1);
        assert_eq!(b.stats().packets_received, 1);
    }

    #[test]
    fn sends_park_until_peer_binds() {
        let network = LoopbackNetwork::new();
        let mut a = network.endpoint();
        assert!(a.connect(peer(2), 1));

        a.send(b"first").unwrap();
        a.send(b"second").unwrap();
        assert_eq!(a.backlog_len(), 2);
        assert!(!a.is_connection_lost());

        let mut b = network.endpoint();
        assert!(b.connect(peer(1), 2));
        a.send(b"third").unwrap();

        assert_eq!(b.try_receive().as_deref(), Some(&b"first"[..]));
        assert_eq!(b.try_receive().as_deref(), Some(&b"second"[..]));
        assert_eq!(b.try_receive().as_deref(), Some(&b"third"[..]));
    }

    #[test]
    fn full_backlog_reports_backpressure() {
        let network = LoopbackNetwork::new();
        let mut a = network.endpoint();
        assert!(a.connect(peer(2), 1));

        for _ in 0..OUTBOUND_HIGH_WATER_MARK {
            a.send(b"x").unwrap();
        }
        assert!(matches!(a.send(b"x"), Err(SendError::Backpressure)));
        assert!(!a.is_connection_lost());
    }

    #[test]
    fn taken_port_fails_to_connect() {
        let network = LoopbackNetwork::new();
        let mut a = network.endpoint();
        let mut b = network.endpoint();
        assert!(a.connect(peer(9), 5));
        assert!(!b.connect(peer(9), 5));
        assert!(!b.is_connected());

        drop(a);
        assert!(b.connect(peer(9), 5));
    }

    #[test]
    fn broken_port_flags_loss_but_stays_connected() {
        let network = LoopbackNetwork::new();
        let mut a = network.endpoint();
        assert!(a.connect(peer(2), 1));

        network.break_port(1);
        assert!(a.try_receive().is_none());
        assert!(a.is_connection_lost());
        assert!(a.is_connected());
    }

    #[test]
    fn disconnect_releases_port() {
        let network = LoopbackNetwork::new();
        let mut a = network.endpoint();
        assert!(a.connect(peer(2), 1));
        assert!(network.is_bound(1));

        a.disconnect();
        a.disconnect();
        assert!(!network.is_bound(1));
        assert!(!a.is_connected());
    }
}
