use crate::state::{GameState, PlayerId};

use super::codec::{self, SnapshotDelta};
use super::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sent our snapshot, nothing was waiting.
    Idle,
    /// A remote snapshot was merged. `joined` is set on the first one after
    /// a (re)connect.
    Merged { joined: bool },
    /// A datagram arrived but did not decode; state was left alone and the
    /// connection flagged as lost.
    Rejected,
}

/// Exchanges snapshots with the peer and folds theirs into local state.
///
/// Each side owns its craft, the projectiles it fired and its score. A
/// merge only ever writes the remote player's share, replacing it whole
/// with whatever the last received snapshot said. There is no ordering
/// check, so a late datagram can roll the remote share back; it can never
/// roll back the local one.
#[derive(Debug)]
pub struct Reconciler {
    local: PlayerId,
    both_players_connected: bool,
    snapshots_merged: u64,
    decode_failures: u64,
}

impl Reconciler {
    pub fn new(local: PlayerId) -> Self {
        Self {
            local,
            both_players_connected: false,
            snapshots_merged: 0,
            decode_failures: 0,
        }
    }

    pub fn local_player(&self) -> PlayerId {
        self.local
    }

    pub fn remote_player(&self) -> PlayerId {
        self.local.other()
    }

    pub fn both_players_connected(&self) -> bool {
        self.both_players_connected
    }

    /// The peer must announce itself again before play resumes.
    pub fn reset_handshake(&mut self) {
        self.both_players_connected = false;
    }

    pub fn snapshots_merged(&self) -> u64 {
        self.snapshots_merged
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }

    pub fn sync_tick<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        state: &mut GameState,
    ) -> SyncOutcome {
        let line = codec::encode(&state.snapshot());
        if let Err(e) = transport.send(line.as_bytes()) {
            log::debug!("Snapshot not sent: {}", e);
        }

        let Some(payload) = transport.try_receive() else {
            return SyncOutcome::Idle;
        };

        let delta = match codec::decode_bytes(&payload) {
            Ok(delta) => delta,
            Err(e) => {
                log::warn!("Discarding snapshot from Player {}: {}", self.remote_player(), e);
                self.decode_failures += 1;
                transport.mark_connection_lost();
                return SyncOutcome::Rejected;
            }
        };

        self.merge(&delta, state);
        self.snapshots_merged += 1;

        let joined = !self.both_players_connected;
        if joined {
            self.both_players_connected = true;
            log::info!("Player {} joined", self.remote_player());
        }
        SyncOutcome::Merged { joined }
    }

    /// Applies the remote-owned parts of `delta`. Infallible, so a decoded
    /// snapshot is always applied whole.
    pub fn merge(&self, delta: &SnapshotDelta, state: &mut GameState) {
        let remote = self.remote_player();
        if let Some(craft) = delta.craft(remote) {
            *state.craft_mut(remote) = *craft;
        }

        if let Some(projectiles) = &delta.projectiles {
            state.replace_projectiles_of(remote, projectiles.iter().copied());
        }

        if let Some(scores) = delta.scores {
            state.set_score(remote, scores[remote.index()]);
        }
    }
}
