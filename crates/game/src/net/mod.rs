pub mod codec;
mod controller;
mod loopback;
mod reconciler;
mod stats;
mod transport;

pub use codec::{DecodeError, SnapshotDelta, WireSnapshot};
pub use controller::{ConnectionStatus, SessionController, SessionPhase, SessionSettings};
pub use loopback::{LoopbackNetwork, LoopbackTransport};
pub use reconciler::{Reconciler, SyncOutcome};
pub use stats::{NetworkStats, PacketLossSimulation};
pub use transport::{
    ConnectError, MAX_DATAGRAM_SIZE, OUTBOUND_HIGH_WATER_MARK, SendError, Transport, UdpSession,
};
