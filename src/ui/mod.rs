use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event as CrosstermEvent, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect as Area},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::info;

use crate::{
    config::{self, GameConfig},
    core::{Game, GameState, GameView},
    drag::element_from_point,
    render::{self, ColorId, FrameBuffer, SceneLayout},
    types::Vec2,
};

const HOW_TO_PLAY: &str = "It is late and your thoughts won't settle.\n\n\
Drag the highlighted words between thoughts to rephrase them.\n\
A calming thought lets you sink deeper into sleep; a worrying one pulls you back up.\n\
Deeper sleep makes the night pass faster and earns more rest.\n\
Leave a worry alone for too long and a new one crowds in.\n\n\
Get as much rest as you can before 6 AM.";

pub fn run(config: GameConfig) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut game = Game::new(config);
    let mut ui_state = UiState::new();
    let started = Instant::now();
    let mut last_render: Option<Instant> = None;
    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    info!("terminal session started");

    loop {
        game.advance(started.elapsed().as_millis() as u64);

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                    if handle_key(&mut game, key.code) {
                        game.shutdown();
                        shutdown_terminal(&mut terminal)?;
                        info!("terminal session ended");
                        return Ok(());
                    }
                }
                CrosstermEvent::Mouse(mouse) => ui_state.handle_mouse(&mut game, mouse),
                CrosstermEvent::FocusLost => game.pointer_cancel(),
                CrosstermEvent::Resize(..) => ui_state.dirty = true,
                _ => {}
            }
        }

        let due = last_render.is_none_or(|at| at.elapsed() >= render_interval);
        if due && (game.take_render_request() || std::mem::take(&mut ui_state.dirty)) {
            let view = game.view();
            terminal.draw(|frame| ui_state.draw_frame(frame, &view))?;
            last_render = Some(Instant::now());
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Routes a key press to the matching command. Returns true on quit.
fn handle_key(game: &mut Game, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Enter => match game.state() {
            GameState::Start => game.start_game(),
            GameState::GameOver => game.try_again(),
            _ => {}
        },
        KeyCode::Char('h') => game.show_how_to_play(),
        KeyCode::Esc => game.back_to_start(),
        KeyCode::Char('p') | KeyCode::Char(' ') => game.toggle_pause(),
        _ => {}
    }
    false
}

/// Terminal cell to board coordinates, measured from the board's inner
/// corner and landing on the cell center.
fn board_point(inner: Area, column: u16, row: u16) -> Vec2 {
    Vec2::new(
        column as f32 - inner.x as f32 + 0.5,
        row as f32 - inner.y as f32 + 0.5,
    )
}

struct UiState {
    framebuf: FrameBuffer,
    layout: Option<SceneLayout>,
    board: Area,
    dirty: bool,
}

impl UiState {
    fn new() -> Self {
        Self {
            framebuf: FrameBuffer::new(0, 0),
            layout: None,
            board: Area::default(),
            dirty: true,
        }
    }

    fn handle_mouse(&mut self, game: &mut Game, mouse: MouseEvent) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        let point = board_point(self.board, mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = element_from_point(layout, point, None);
                game.pointer_down(point, target);
            }
            MouseEventKind::Drag(MouseButton::Left) => game.pointer_move(point, layout),
            MouseEventKind::Up(MouseButton::Left) => game.pointer_up(),
            _ => {}
        }
    }

    fn draw_frame(&mut self, frame: &mut ratatui::Frame, view: &GameView) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(size);

        frame.render_widget(header(view), chunks[0]);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(board_title(view))
            .border_style(Style::default().fg(scene_color(view)));
        let inner = block.inner(chunks[1]);
        self.board = inner;

        if view.state == GameState::Playing {
            let layout = SceneLayout::new(
                view,
                render::Viewport {
                    width: inner.width,
                    height: inner.height,
                },
            );
            render::draw(view, &layout, &mut self.framebuf);
            self.layout = Some(layout);
            let lines = framebuffer_lines(&self.framebuf);
            frame.render_widget(Paragraph::new(lines).block(block), chunks[1]);
        } else {
            self.layout = None;
            let text = scene_text(view);
            let body = Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(scene_color(view)))
                .block(block);
            frame.render_widget(body, chunks[1]);
        }

        let footer = Paragraph::new(controls(view))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
        frame.render_widget(footer, chunks[2]);
    }
}

fn header(view: &GameView) -> Paragraph<'static> {
    let sleep_color = color_for(render::sleep_color(view.sleep_level));
    let meter: String = (config::MIN_SLEEP_LEVEL..config::MAX_SLEEP_LEVEL)
        .map(|level| if level < view.sleep_level { '▮' } else { '▯' })
        .collect();
    let line = Line::from(vec![
        Span::raw("sleep "),
        Span::styled(meter, Style::default().fg(sleep_color)),
        Span::raw(format!(
            " | rest: {} | {} | next thought: {}",
            view.rest,
            render::clock_label(view.elapsed_ticks),
            view.time_to_next_thought.max(0)
        )),
    ]);
    Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("lullwords"))
}

fn board_title(view: &GameView) -> &'static str {
    match view.state {
        GameState::Playing if view.paused => "Thoughts (paused)",
        GameState::Playing => "Thoughts",
        GameState::Start => "Bedtime",
        GameState::HowToPlay => "How to play",
        GameState::BeforePlaying => "Lights out",
        GameState::GameOver => "Morning",
    }
}

fn scene_text(view: &GameView) -> String {
    match view.state {
        GameState::Start => "\n\nlullwords\n\na word game for restless nights".to_string(),
        GameState::HowToPlay => format!("\n{HOW_TO_PLAY}"),
        GameState::BeforePlaying => "\n\nYou turn off the light and close your eyes...".to_string(),
        GameState::GameOver => {
            let label = view.outcome.map_or("a night", |outcome| outcome.label());
            format!(
                "\n\nIt is {}. You had {label}.\n\nrest: {}",
                render::clock_label(view.elapsed_ticks),
                view.rest
            )
        }
        GameState::Playing => String::new(),
    }
}

/// Scenes on their way out are drawn dimmed.
fn scene_color(view: &GameView) -> Color {
    if view.pending_scene.is_some() {
        Color::DarkGray
    } else {
        Color::White
    }
}

fn controls(view: &GameView) -> &'static str {
    match view.state {
        GameState::Start => "Enter: start | h: how to play | q: quit",
        GameState::HowToPlay => "Esc: back | q: quit",
        GameState::BeforePlaying => "q: quit",
        GameState::Playing => "drag: move word | p/Space: pause | q: quit",
        GameState::GameOver => "Enter: try again | q: quit",
    }
}

fn framebuffer_lines(framebuf: &FrameBuffer) -> Vec<Line<'static>> {
    (0..framebuf.height())
        .map(|y| {
            let mut spans: Vec<Span> = Vec::new();
            let mut run = String::new();
            let mut run_color = ColorId::White;
            for x in 0..framebuf.width() {
                let cell = framebuf.get(x, y);
                if cell.color != run_color && !run.is_empty() {
                    spans.push(styled(std::mem::take(&mut run), run_color));
                }
                run_color = cell.color;
                run.push(cell.ch);
            }
            if !run.is_empty() {
                spans.push(styled(run, run_color));
            }
            Line::from(spans)
        })
        .collect()
}

fn styled(text: String, color: ColorId) -> Span<'static> {
    let style = Style::default().fg(color_for(color));
    let style = match color {
        ColorId::Magenta => style.add_modifier(Modifier::BOLD),
        _ => style,
    };
    Span::styled(text, style)
}

fn color_for(color: ColorId) -> Color {
    match color {
        ColorId::White => Color::White,
        ColorId::Gray => Color::DarkGray,
        ColorId::Blue => Color::Blue,
        ColorId::Cyan => Color::Cyan,
        ColorId::Green => Color::Green,
        ColorId::Yellow => Color::Yellow,
        ColorId::Magenta => Color::Magenta,
        ColorId::Red => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_game() -> Game {
        Game::new(GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        })
    }

    mod handle_key_fn {
        use super::*;

        #[test]
        fn q_quits() {
            let mut game = test_game();
            assert!(handle_key(&mut game, KeyCode::Char('q')));
        }

        #[test]
        fn enter_starts_from_start_screen() {
            let mut game = test_game();
            assert!(!handle_key(&mut game, KeyCode::Enter));
            assert_eq!(game.view().pending_scene, Some(GameState::BeforePlaying));
        }

        #[test]
        fn h_opens_how_to_play() {
            let mut game = test_game();
            handle_key(&mut game, KeyCode::Char('h'));
            assert_eq!(game.view().pending_scene, Some(GameState::HowToPlay));
        }

        #[test]
        fn unbound_keys_do_nothing() {
            let mut game = test_game();
            assert!(!handle_key(&mut game, KeyCode::Char('x')));
            assert_eq!(game.view().pending_scene, None);
        }
    }

    mod board_point_fn {
        use super::*;

        #[test]
        fn lands_on_cell_center_relative_to_board() {
            let inner = Area::new(1, 4, 40, 10);
            assert_eq!(board_point(inner, 1, 4), Vec2::new(0.5, 0.5));
            assert_eq!(board_point(inner, 5, 6), Vec2::new(4.5, 2.5));
        }

        #[test]
        fn left_of_board_is_negative() {
            let inner = Area::new(1, 4, 40, 10);
            assert!(board_point(inner, 0, 4).x < 0.0);
        }
    }

    mod framebuffer_lines_fn {
        use super::*;

        #[test]
        fn one_line_per_row_with_full_width() {
            let framebuf = FrameBuffer::new(12, 3);
            let lines = framebuffer_lines(&framebuf);
            assert_eq!(lines.len(), 3);
            assert_eq!(lines[0].width(), 12);
        }
    }

    mod scene_text_fn {
        use super::*;

        #[test]
        fn game_over_names_the_outcome() {
            let mut view = test_game().view();
            view.state = GameState::GameOver;
            view.elapsed_ticks = config::MAX_TICKS;
            view.outcome = Some(crate::core::Outcome::Okay);
            let text = scene_text(&view);
            assert!(text.contains("06:00 AM"));
            assert!(text.contains("an okay night"));
        }
    }
}
