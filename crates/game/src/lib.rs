pub mod config;
pub mod constants;
pub mod net;
pub mod physics;
pub mod rng;
pub mod simulation;
pub mod state;

pub use config::{ConfigError, ConnectionConfig};
pub use net::{
    ConnectionStatus, LoopbackNetwork, LoopbackTransport, NetworkStats, PacketLossSimulation,
    Reconciler, SessionController, SessionPhase, SessionSettings, SyncOutcome, Transport,
    UdpSession,
};
pub use physics::{Craft, Projectile};
pub use rng::Rng;
pub use simulation::{FixedTimestep, HitEvent, InputFlags, Simulation, apply_input};
pub use state::{GameState, PlayerId, Snapshot};
