use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use glam::Vec2;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use spacewars::constants::CRAFT_RADIUS;
use spacewars::{
    ConnectionConfig, ConnectionStatus, GameState, InputFlags, PlayerId, Rng, SessionController,
    SessionSettings, Simulation, Transport,
};

use crate::input::Input;
use crate::tui::{self, View};

const FRAME_TIME: Duration = Duration::from_millis(16);
const EXPLOSION_SECS: f32 = 0.5;

/// Short-lived hit marker drawn where a craft was struck.
#[derive(Debug, Clone, Copy)]
pub struct Explosion {
    pub position: Vec2,
    age: f32,
}

impl Explosion {
    fn new(position: Vec2) -> Self {
        Self { position, age: 0.0 }
    }

    pub fn radius(&self) -> f32 {
        CRAFT_RADIUS * 1.5 * (self.age / EXPLOSION_SECS).min(1.0)
    }

    fn is_done(&self) -> bool {
        self.age >= EXPLOSION_SECS
    }
}

/// One player's view of the duel: session, local state and rules.
pub struct Seat<T: Transport> {
    session: SessionController<T>,
    state: GameState,
    simulation: Simulation,
    explosions: Vec<Explosion>,
    last_status: ConnectionStatus,
}

impl<T: Transport> Seat<T> {
    pub fn new(transport: T, config: ConnectionConfig, settings: SessionSettings, rng: Rng) -> Self {
        let session = SessionController::new(transport, config, settings);
        let last_status = session.status();
        Self {
            session,
            state: GameState::new(),
            simulation: Simulation::new(config.player, rng),
            explosions: Vec::new(),
            last_status,
        }
    }

    pub fn start(&mut self) {
        self.session.start();
        self.note_status();
    }

    /// Network first, then gameplay, so a merged snapshot is simulated from
    /// in the same frame.
    pub fn frame(&mut self, input: InputFlags, dt: f32) {
        self.session.update(dt, &mut self.state);
        self.note_status();

        if self.session.simulation_enabled() {
            for hit in self.simulation.update(&mut self.state, input, dt) {
                self.explosions.push(Explosion::new(hit.position));
            }
        }

        for explosion in &mut self.explosions {
            explosion.age += dt;
        }
        self.explosions.retain(|e| !e.is_done());
    }

    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    pub fn view(&self) -> View<'_> {
        View {
            state: &self.state,
            status: self.session.status(),
            local: self.session.local_player(),
            stats: self.session.transport().stats(),
            explosions: &self.explosions,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    fn note_status(&mut self) {
        let status = self.session.status();
        if status != self.last_status {
            log::info!("Player {}: {}", self.session.local_player(), status);
            self.last_status = status;
        }
    }
}

/// Frame loop without a screen. Runs until `duration` elapses, or forever.
pub fn run_headless<T: Transport>(
    seat: &mut Seat<T>,
    mut companion: Option<&mut Seat<T>>,
    duration: Option<Duration>,
) -> Result<()> {
    seat.start();
    if let Some(companion) = companion.as_deref_mut() {
        companion.start();
    }

    let started = Instant::now();
    let mut last_frame = started;
    while duration.is_none_or(|limit| started.elapsed() < limit) {
        std::thread::sleep(FRAME_TIME);
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        seat.frame(InputFlags::empty(), dt);
        if let Some(companion) = companion.as_deref_mut() {
            companion.frame(InputFlags::empty(), dt);
        }
    }

    seat.shutdown();
    if let Some(companion) = companion {
        companion.shutdown();
    }
    log::info!(
        "Final score {} - {}",
        seat.state().score(PlayerId::One),
        seat.state().score(PlayerId::Two)
    );
    Ok(())
}

/// Interactive frame loop on the alternate screen. The companion seat, if
/// any, plays with no input.
pub fn run_terminal<T: Transport>(
    seat: &mut Seat<T>,
    companion: Option<&mut Seat<T>>,
) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = frame_loop(&mut terminal, seat, companion);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    result
}

fn frame_loop<T: Transport>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    seat: &mut Seat<T>,
    mut companion: Option<&mut Seat<T>>,
) -> Result<()> {
    seat.start();
    if let Some(companion) = companion.as_deref_mut() {
        companion.start();
    }

    let mut input = Input::default();
    let mut last_frame = Instant::now();

    while !input.quit_requested() {
        let mut timeout = FRAME_TIME;
        while event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                input.handle_key(key, Instant::now());
            }
            timeout = Duration::ZERO;
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        seat.frame(input.take_flags(now), dt);
        if let Some(companion) = companion.as_deref_mut() {
            companion.frame(InputFlags::empty(), dt);
        }

        terminal.draw(|frame| tui::render(frame, &seat.view()))?;
    }

    log::info!("Shutting down...");
    seat.shutdown();
    if let Some(companion) = companion {
        companion.shutdown();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddrV4};

    use spacewars::LoopbackNetwork;

    use super::*;

    fn config(player: PlayerId, local_port: u16, peer_port: u16) -> ConnectionConfig {
        ConnectionConfig {
            local_bind_address: Ipv4Addr::LOCALHOST,
            local_port,
            peer_address: SocketAddrV4::new(Ipv4Addr::LOCALHOST, peer_port),
            player,
        }
    }

    #[test]
    fn loopback_seats_connect() {
        let network = LoopbackNetwork::new();
        let settings = SessionSettings::default();
        let mut one = Seat::new(network.endpoint(), config(PlayerId::One, 1, 2), settings, Rng::new(1));
        let mut two = Seat::new(network.endpoint(), config(PlayerId::Two, 2, 1), settings, Rng::new(2));
        one.start();
        two.start();
        assert_eq!(one.view().status, ConnectionStatus::WaitingForPlayer(PlayerId::Two));

        for _ in 0..4 {
            one.frame(InputFlags::empty(), 1.0 / 30.0);
            two.frame(InputFlags::empty(), 1.0 / 30.0);
        }

        assert_eq!(one.view().status, ConnectionStatus::Connected);
        assert_eq!(two.view().status, ConnectionStatus::Connected);
    }

    #[test]
    fn explosion_grows_then_expires() {
        let mut explosion = Explosion::new(Vec2::ZERO);
        assert_eq!(explosion.radius(), 0.0);
        explosion.age = EXPLOSION_SECS / 2.0;
        assert!(explosion.radius() > 0.0);
        explosion.age = EXPLOSION_SECS;
        assert!(explosion.is_done());
    }
}
