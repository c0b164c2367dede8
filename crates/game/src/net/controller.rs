use std::fmt;

use crate::config::ConnectionConfig;
use crate::constants::{RECONNECT_INTERVAL_SECS, SYNC_RATE};
use crate::simulation::FixedTimestep;
use crate::state::{GameState, PlayerId};

use super::reconciler::{Reconciler, SyncOutcome};
use super::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    WaitingForPeer,
    BothPlayers,
    ReconnectPending,
}

/// What the player is shown about the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    NotConnected,
    WaitingForPlayer(PlayerId),
    Connected,
    ConnectionLost,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => f.write_str("Not Connected"),
            Self::WaitingForPlayer(player) => write!(f, "Waiting for Player {} to join...", player),
            Self::Connected => f.write_str("Connected"),
            Self::ConnectionLost => f.write_str("Connection Lost - reconnecting..."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Snapshot exchanges per second.
    pub sync_rate: u32,
    /// Seconds between reconnect attempts.
    pub reconnect_interval: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sync_rate: SYNC_RATE,
            reconnect_interval: RECONNECT_INTERVAL_SECS,
        }
    }
}

/// Drives a [`Transport`] through connect, handshake, sync and reconnect.
///
/// Owned by the frame loop and advanced with [`update`](Self::update); it
/// never blocks and never spawns. Every (re)connect uses the config it was
/// built with.
pub struct SessionController<T: Transport> {
    transport: T,
    config: ConnectionConfig,
    settings: SessionSettings,
    reconciler: Reconciler,
    phase: SessionPhase,
    sync_timer: FixedTimestep,
    reconnect_timer: FixedTimestep,
    connect_attempts: u32,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: T, config: ConnectionConfig, settings: SessionSettings) -> Self {
        Self {
            transport,
            config,
            settings,
            reconciler: Reconciler::new(config.player),
            phase: SessionPhase::Disconnected,
            sync_timer: FixedTimestep::with_interval(1.0 / settings.sync_rate.max(1) as f32),
            reconnect_timer: FixedTimestep::with_interval(settings.reconnect_interval.max(0.0)),
            connect_attempts: 0,
        }
    }

    /// First connect attempt. A failure only arms the reconnect timer.
    pub fn start(&mut self) {
        log::info!(
            "Starting session as Player {} ({} -> {})",
            self.config.player,
            self.config.local_address(),
            self.config.peer_address
        );
        self.phase = SessionPhase::Connecting;
        self.attempt_connect();
    }

    /// Advances the session by `dt` seconds of wall time.
    pub fn update(&mut self, dt: f32, state: &mut GameState) {
        match self.phase {
            SessionPhase::WaitingForPeer | SessionPhase::BothPlayers => {
                if self.transport.is_connection_lost() {
                    self.handle_connection_lost();
                    return;
                }

                self.sync_timer.accumulate(dt);
                while self.sync_timer.consume_tick() {
                    let outcome = self.reconciler.sync_tick(&mut self.transport, state);
                    if let SyncOutcome::Merged { joined: true } = outcome {
                        self.phase = SessionPhase::BothPlayers;
                    }
                    if self.transport.is_connection_lost() {
                        self.handle_connection_lost();
                        return;
                    }
                }
            }
            SessionPhase::ReconnectPending => {
                self.reconnect_timer.accumulate(dt);
                if self.reconnect_timer.consume_tick() {
                    log::info!("Attempting to reconnect...");
                    self.attempt_connect();
                }
            }
            SessionPhase::Disconnected | SessionPhase::Connecting => {}
        }
    }

    /// Local play advances only while both players are present.
    pub fn simulation_enabled(&self) -> bool {
        self.phase == SessionPhase::BothPlayers
    }

    pub fn status(&self) -> ConnectionStatus {
        match self.phase {
            SessionPhase::Disconnected | SessionPhase::Connecting => ConnectionStatus::NotConnected,
            SessionPhase::WaitingForPeer => {
                ConnectionStatus::WaitingForPlayer(self.reconciler.remote_player())
            }
            SessionPhase::BothPlayers => ConnectionStatus::Connected,
            SessionPhase::ReconnectPending => ConnectionStatus::ConnectionLost,
        }
    }

    pub fn shutdown(&mut self) {
        if self.phase != SessionPhase::Disconnected {
            log::info!("Shutting down session");
        }
        self.transport.disconnect();
        self.reconciler.reset_handshake();
        self.phase = SessionPhase::Disconnected;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn local_player(&self) -> PlayerId {
        self.config.player
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Connect attempts made so far, the first one included.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    fn attempt_connect(&mut self) {
        self.connect_attempts += 1;
        if self
            .transport
            .connect(self.config.peer_address, self.config.local_port)
        {
            self.transport.reset_connection_status();
            self.reconciler.reset_handshake();
            self.sync_timer.reset();
            self.phase = SessionPhase::WaitingForPeer;
            log::info!(
                "Connected, waiting for Player {}",
                self.reconciler.remote_player()
            );
        } else {
            self.reconnect_timer.reset();
            self.phase = SessionPhase::ReconnectPending;
            log::warn!(
                "Connect attempt {} failed, retrying in {}s",
                self.connect_attempts,
                self.settings.reconnect_interval
            );
        }
    }

    fn handle_connection_lost(&mut self) {
        log::warn!("Connection lost, will reconnect");
        self.transport.disconnect();
        self.reconciler.reset_handshake();
        self.reconnect_timer.reset();
        self.phase = SessionPhase::ReconnectPending;
    }
}
