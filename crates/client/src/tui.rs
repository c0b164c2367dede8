use glam::Vec2;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use spacewars::constants::{ARENA_CENTER, ARENA_HEIGHT, ARENA_WIDTH, CRAFT_RADIUS};
use spacewars::{ConnectionStatus, Craft, GameState, NetworkStats, PlayerId};

use crate::app::Explosion;

/// Everything one frame of the screen needs.
pub struct View<'a> {
    pub state: &'a GameState,
    pub status: ConnectionStatus,
    pub local: PlayerId,
    pub stats: &'a NetworkStats,
    pub explosions: &'a [Explosion],
}

pub fn render(frame: &mut Frame, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], view);
    render_arena(frame, chunks[1], view);
    render_status(frame, chunks[2], view);

    if view.state.is_game_over() {
        render_game_over(frame, chunks[1], view.state.winner());
    }
}

fn player_color(player: PlayerId) -> Color {
    match player {
        PlayerId::One => Color::White,
        PlayerId::Two => Color::Cyan,
    }
}

fn status_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::ConnectionLost => Color::Red,
        ConnectionStatus::NotConnected | ConnectionStatus::WaitingForPlayer(_) => Color::Yellow,
    }
}

fn render_header(frame: &mut Frame, area: Rect, view: &View) {
    let title = format!(" Space Wars - You are Player {} ", view.local);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut spans = Vec::new();
    for player in PlayerId::ALL {
        let mut style = Style::default().fg(player_color(player));
        if player == view.local {
            style = style.add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(
            format!("Player {}: {}", player, view.state.score(player)),
            style,
        ));
        spans.push(Span::raw("    "));
    }
    spans.push(Span::styled(
        format!(
            "{} sent / {} recv",
            view.stats.packets_sent, view.stats.packets_received
        ),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_arena(frame: &mut Frame, area: Rect, view: &View) {
    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, ARENA_WIDTH as f64])
        .y_bounds([0.0, ARENA_HEIGHT as f64])
        .paint(|ctx| {
            let (x, y) = to_canvas(ARENA_CENTER);
            ctx.draw(&Circle {
                x,
                y,
                radius: 8.0,
                color: Color::Magenta,
            });

            for player in PlayerId::ALL {
                draw_craft(ctx, view.state.craft(player), player_color(player));
            }

            let shots: Vec<(f64, f64)> = view
                .state
                .projectiles()
                .iter()
                .filter(|p| p.active)
                .map(|p| to_canvas(p.position))
                .collect();
            ctx.draw(&Points {
                coords: &shots,
                color: Color::White,
            });

            for explosion in view.explosions {
                draw_explosion(ctx, explosion);
            }
        });

    frame.render_widget(canvas, area);
}

/// Arena y grows downward, canvas y grows upward.
fn to_canvas(point: Vec2) -> (f64, f64) {
    (point.x as f64, (ARENA_HEIGHT - point.y) as f64)
}

fn segment(ctx: &mut Context, from: Vec2, to: Vec2, color: Color) {
    let (x1, y1) = to_canvas(from);
    let (x2, y2) = to_canvas(to);
    ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
}

fn draw_craft(ctx: &mut Context, craft: &Craft, color: Color) {
    let forward = craft.forward();
    let size = CRAFT_RADIUS * 0.75;
    let nose = craft.position + forward * size;
    let left = craft.position + Vec2::from_angle(140f32.to_radians()).rotate(forward) * size;
    let right = craft.position + Vec2::from_angle(-140f32.to_radians()).rotate(forward) * size;

    segment(ctx, nose, left, color);
    segment(ctx, left, right, color);
    segment(ctx, right, nose, color);

    if craft.thrusting {
        let rear = craft.position - forward * size * 0.7;
        for spread in [-20f32, 0.0, 20.0] {
            let direction = Vec2::from_angle(spread.to_radians()).rotate(-forward);
            segment(ctx, rear, rear + direction * 8.0, Color::Yellow);
        }
    }
}

fn draw_explosion(ctx: &mut Context, explosion: &Explosion) {
    let radius = explosion.radius();
    let (x, y) = to_canvas(explosion.position);
    for ring in 0..3 {
        let ring_radius = radius * (1.0 - ring as f32 * 0.3);
        if ring_radius > 0.0 {
            ctx.draw(&Circle {
                x,
                y,
                radius: ring_radius as f64,
                color: Color::Red,
            });
        }
    }
    for spoke in 0..8 {
        let direction = Vec2::from_angle((spoke as f32 * 45.0).to_radians());
        segment(
            ctx,
            explosion.position,
            explosion.position + direction * radius,
            Color::Rgb(255, 165, 0),
        );
    }
}

fn render_status(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let line = Line::from(vec![
        Span::styled(
            view.status.to_string(),
            Style::default().fg(status_color(view.status)),
        ),
        Span::styled(
            "   <-/-> rotate  ^ thrust  space fire  q quit",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_game_over(frame: &mut Frame, arena: Rect, winner: Option<PlayerId>) {
    let message = match winner {
        Some(player) => format!("Player {} Wins!", player),
        None => "Game Over".to_string(),
    };

    let width = (message.len() as u16 + 6).min(arena.width);
    let height = 3.min(arena.height);
    let area = Rect {
        x: arena.x + arena.width.saturating_sub(width) / 2,
        y: arena.y + arena.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let banner = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(banner, area);
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn rendered_text(view: &View) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, view)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn shows_scores_and_status() {
        let mut state = GameState::new();
        state.set_score(PlayerId::Two, 3);
        let stats = NetworkStats::default();
        let view = View {
            state: &state,
            status: ConnectionStatus::WaitingForPlayer(PlayerId::Two),
            local: PlayerId::One,
            stats: &stats,
            explosions: &[],
        };

        let text = rendered_text(&view);
        assert!(text.contains("Player 1: 0"));
        assert!(text.contains("Player 2: 3"));
        assert!(text.contains("Waiting for Player 2 to join..."));
    }

    #[test]
    fn game_over_banner_names_winner() {
        let mut state = GameState::new();
        state.set_score(PlayerId::One, spacewars::constants::WIN_SCORE);
        let stats = NetworkStats::default();
        let view = View {
            state: &state,
            status: ConnectionStatus::Connected,
            local: PlayerId::Two,
            stats: &stats,
            explosions: &[],
        };

        assert!(rendered_text(&view).contains("Player 1 Wins!"));
    }

    #[test]
    fn canvas_flips_y() {
        assert_eq!(to_canvas(Vec2::new(10.0, 0.0)), (10.0, ARENA_HEIGHT as f64));
        assert_eq!(to_canvas(Vec2::new(0.0, ARENA_HEIGHT)), (0.0, 0.0));
    }
}
