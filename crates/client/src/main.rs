mod app;
mod input;
mod tui;

use std::fs::File;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};

use spacewars::constants::RECONNECT_INTERVAL_SECS;
use spacewars::{
    ConnectionConfig, LoopbackNetwork, PacketLossSimulation, PlayerId, Rng, SessionSettings,
    UdpSession,
};

use app::Seat;

#[derive(Parser)]
#[command(name = "spacewars")]
#[command(about = "Two-player peer-to-peer space duel")]
struct Args {
    #[arg(short, long, default_value = "spacewars.cfg")]
    config: PathBuf,

    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u8).range(1..=2),
        help = "Seat to play (overrides player_id in the config file)"
    )]
    player: Option<u8>,

    #[arg(long, help = "Run without the terminal UI, logging to stderr")]
    headless: bool,

    #[arg(long, help = "Play both seats in-process, no config file needed")]
    loopback: bool,

    #[arg(long, default_value_t = 0.0, help = "Loopback packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, help = "Write logs here while the terminal UI is up")]
    log_file: Option<PathBuf>,

    #[arg(long, default_value_t = RECONNECT_INTERVAL_SECS)]
    reconnect_secs: f32,

    #[arg(long, help = "Stop a headless run after this many seconds")]
    duration_secs: Option<f32>,
}

impl Args {
    fn player(&self) -> Option<PlayerId> {
        self.player
            .and_then(|number| PlayerId::from_number(number.into()))
    }

    fn duration(&self) -> Result<Option<Duration>> {
        self.duration_secs
            .map(|secs| {
                Duration::try_from_secs_f32(secs)
                    .with_context(|| format!("invalid --duration-secs {}", secs))
            })
            .transpose()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let settings = SessionSettings {
        reconnect_interval: args.reconnect_secs.max(0.0),
        ..Default::default()
    };
    let duration = args.duration()?;

    if args.loopback {
        return run_loopback(&args, settings, duration);
    }

    let mut config = ConnectionConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(player) = args.player() {
        config = config.with_player(player);
    }

    let transport = UdpSession::new(config.local_bind_address);
    let mut seat = Seat::new(transport, config, settings, Rng::from_entropy());

    if args.headless {
        app::run_headless(&mut seat, None, duration)
    } else {
        app::run_terminal(&mut seat, None)
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    if !args.headless {
        match &args.log_file {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating log file {}", path.display()))?;
                builder.target(Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
    Ok(())
}

fn run_loopback(args: &Args, settings: SessionSettings, duration: Option<Duration>) -> Result<()> {
    let loss = if args.loss_percent > 0.0 {
        PacketLossSimulation::with_loss(args.loss_percent.clamp(0.0, 100.0))
    } else {
        PacketLossSimulation::default()
    };
    let mut rng = Rng::from_entropy();
    let network = LoopbackNetwork::with_loss(loss, rng.next_u32());

    let local = args.player().unwrap_or(PlayerId::One);
    let seat_config = |player: PlayerId| {
        let port = |p: PlayerId| 1000 + p.number() as u16;
        ConnectionConfig {
            local_bind_address: Ipv4Addr::LOCALHOST,
            local_port: port(player),
            peer_address: SocketAddrV4::new(Ipv4Addr::LOCALHOST, port(player.other())),
            player,
        }
    };

    let mut seat = Seat::new(
        network.endpoint(),
        seat_config(local),
        settings,
        Rng::new(rng.next_u32()),
    );
    let mut companion = Seat::new(
        network.endpoint(),
        seat_config(local.other()),
        settings,
        Rng::new(rng.next_u32()),
    );

    log::info!("Loopback duel, local seat is Player {}", local);
    if args.headless {
        app::run_headless(&mut seat, Some(&mut companion), duration)
    } else {
        app::run_terminal(&mut seat, Some(&mut companion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("spacewars").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn duration_accepts_positive_seconds() {
        let args = parse(&["--headless", "--duration-secs", "1.5"]);
        assert_eq!(args.duration().unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(parse(&[]).duration().unwrap(), None);
    }

    #[test]
    fn duration_rejects_negative_and_nan() {
        assert!(parse(&["--duration-secs=-1"]).duration().is_err());
        assert!(parse(&["--duration-secs", "NaN"]).duration().is_err());
    }

    #[test]
    fn player_flag_is_range_checked() {
        assert_eq!(parse(&["-p", "2"]).player(), Some(PlayerId::Two));
        assert!(Args::try_parse_from(["spacewars", "--player", "3"]).is_err());
    }
}
