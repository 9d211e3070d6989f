use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use maze_chase::{
    Dir, EffectKind, GameConfig, GameEvent, GhostState, InputIntent, LifeState, Pos, Session,
    SessionStatus, Snapshot,
};
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const INPUT_HOLD_MS: u64 = 160;
const MAX_FRAME_DT: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Wall,
    Empty,
    Pellet,
    Power,
    Player,
    PlayerDown,
    Ghost,
    Frightened,
    Eyes,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

const BLANK: Cell = Cell {
    glyph: Glyph::Empty,
    color: Color::Reset,
};

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    last_banner: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new() -> Self {
        Self {
            last: Vec::new(),
            last_hud: String::new(),
            last_banner: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

#[derive(Default)]
struct Keys {
    last_seen: [Option<Instant>; 4],
    last_pressed: Option<Dir>,
    actions: InputIntent,
}

impl Keys {
    fn press(&mut self, dir: Dir) {
        self.last_seen[dir.index()] = Some(Instant::now());
        self.last_pressed = Some(dir);
    }

    fn take_intent(&mut self) -> InputIntent {
        let mut intent = std::mem::take(&mut self.actions);
        if let Some(dir) = active_dir_recent(&self.last_seen, self.last_pressed) {
            let held = InputIntent::moving(dir);
            intent.move_up = held.move_up;
            intent.move_down = held.move_down;
            intent.move_left = held.move_left;
            intent.move_right = held.move_right;
        }
        intent
    }
}

fn main() {
    env_logger::init();
    let config = GameConfig::from_env();
    log::info!("config: {config:?}");
    if let Err(err) = play(&config) {
        log::error!("terminal error: {err}");
        eprintln!("maze-chase: {err}");
        std::process::exit(1);
    }
}

fn play(config: &GameConfig) -> io::Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, config);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut Stdout, config: &GameConfig) -> io::Result<()> {
    let mut session = Session::new(config);
    let mut keys = Keys::default();
    let mut renderer = Renderer::new();
    let frame_time = Duration::from_micros(1_000_000 / config.render_fps.max(1));
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Enter if !session.is_playing() => {
                    session.start(config.maze_size, session.maze_type());
                    renderer.needs_full = true;
                }
                KeyCode::Char('n') => {
                    session.reset();
                    renderer.needs_full = true;
                }
                KeyCode::Char('g') => {
                    session.regenerate(session.maze_type());
                    renderer.needs_full = true;
                }
                KeyCode::Char('t') if !session.is_playing() => {
                    session.regenerate(session.maze_type().next());
                    renderer.needs_full = true;
                }
                KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => keys.press(Dir::Up),
                KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => keys.press(Dir::Down),
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => keys.press(Dir::Left),
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => keys.press(Dir::Right),
                KeyCode::Char(' ') => keys.actions.primary_action = true,
                KeyCode::Char('v') => keys.actions.secondary_action = true,
                KeyCode::Char('r') => keys.actions.reset_view = true,
                KeyCode::Char('q') => keys.actions.manual_respawn = true,
                _ => {}
            }
        }

        let dt = last_frame.elapsed().min(MAX_FRAME_DT);
        last_frame = Instant::now();
        session.tick(dt, &keys.take_intent());
        for event in session.drain_events() {
            log_event(&event);
        }
        render(stdout, &session.snapshot(), &mut renderer)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Effect {
            kind: EffectKind::PelletCollect,
            ..
        } => log::trace!("{event:?}"),
        GameEvent::Won | GameEvent::Lost => log::info!("{event:?}"),
        _ => log::debug!("{event:?}"),
    }
}

fn canvas_side(size: usize) -> usize {
    size * 2 + 1
}

fn render(stdout: &mut Stdout, snap: &Snapshot, renderer: &mut Renderer) -> io::Result<()> {
    let side = canvas_side(snap.size);
    let needed_h = (side + 3) as u16;
    let needed_w = ((side * CELL_W).max(60)) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - (side * CELL_W) as u16) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.last.len() != side * side {
        renderer.last = vec![BLANK; side * side];
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let hud = hud_line(snap);
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(0, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for y in 0..side {
        for x in 0..side {
            let cell = tile_for(snap, y, x);
            let idx = y * side + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }

    let banner = banner_line(snap);
    if renderer.needs_full || banner != renderer.last_banner {
        stdout.queue(MoveTo(0, renderer.origin_y + side as u16))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(SetForegroundColor(Color::Yellow))?;
        stdout.queue(Print(&banner))?;
        stdout.queue(ResetColor)?;
        renderer.last_banner = banner;
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn hud_line(snap: &Snapshot) -> String {
    let mut hud = format!(
        "Score: {}  Lives: {}  Pellets: {}/{}  Power: {}/{}",
        snap.score,
        snap.lives,
        snap.pellets_collected,
        snap.total_pellets,
        snap.power_pellets_collected,
        snap.total_power_pellets
    );
    if !snap.power_time_left.is_zero() {
        hud.push_str(&format!("  POWER {:.1}s", snap.power_time_left.as_secs_f32()));
    }
    if snap.dash.is_active() {
        hud.push_str("  DASH");
    } else if !snap.dash.is_ready() {
        hud.push_str(&format!("  dash {:.0}s", snap.dash.cooldown_left.as_secs_f32()));
    }
    if !snap.grace_left.is_zero() {
        hud.push_str("  grace");
    }
    hud
}

fn banner_line(snap: &Snapshot) -> String {
    match snap.status {
        SessionStatus::Ready => "Enter: start  t: maze type  g: new maze  Esc: quit".to_string(),
        SessionStatus::Won => {
            format!("YOU WIN - Final Score: {} (Enter to play again)", snap.score)
        }
        SessionStatus::Lost => {
            format!("GAME OVER - Final Score: {} (Enter to play again)", snap.score)
        }
        SessionStatus::Playing => {
            if !snap.protection_left.is_zero() {
                format!("Protected for {:.1}s", snap.protection_left.as_secs_f32())
            } else if snap.player.life == LifeState::AwaitingManualRespawn {
                "Caught! Press q to respawn".to_string()
            } else if !snap.respawn_left.is_zero() {
                format!("Ghost back in {:.0}s", snap.respawn_left.as_secs_f32().ceil())
            } else {
                String::new()
            }
        }
    }
}

fn edge_is_wall(snap: &Snapshot, y: usize, x: usize) -> bool {
    let (row, col) = (y / 2, x / 2);
    if y % 2 == 1 {
        // Vertical slot left of cell (row, col).
        let row = (y - 1) / 2;
        if col == 0 {
            snap.has_wall(Pos::new(row, 0), Dir::Left)
        } else {
            snap.has_wall(Pos::new(row, col - 1), Dir::Right)
        }
    } else {
        let col = (x - 1) / 2;
        if row == 0 {
            snap.has_wall(Pos::new(0, col), Dir::Up)
        } else {
            snap.has_wall(Pos::new(row - 1, col), Dir::Down)
        }
    }
}

fn tile_for(snap: &Snapshot, y: usize, x: usize) -> Cell {
    let wall = Cell {
        glyph: Glyph::Wall,
        color: Color::Blue,
    };
    match (y % 2, x % 2) {
        (1, 1) => cell_for(snap, Pos::new(y / 2, x / 2)),
        (0, 0) => {
            let side = canvas_side(snap.size);
            let touching = [
                (y > 0).then(|| (y - 1, x)),
                (y + 1 < side).then(|| (y + 1, x)),
                (x > 0).then(|| (y, x - 1)),
                (x + 1 < side).then(|| (y, x + 1)),
            ];
            if touching
                .into_iter()
                .flatten()
                .any(|(ey, ex)| edge_is_wall(snap, ey, ex))
            {
                wall
            } else {
                BLANK
            }
        }
        _ if edge_is_wall(snap, y, x) => wall,
        _ => BLANK,
    }
}

fn cell_for(snap: &Snapshot, pos: Pos) -> Cell {
    if snap.player.cell == pos {
        return if snap.player.life == LifeState::Active {
            Cell {
                glyph: Glyph::Player,
                color: Color::Yellow,
            }
        } else {
            Cell {
                glyph: Glyph::PlayerDown,
                color: Color::DarkYellow,
            }
        };
    }
    if let Some(ghost) = snap.ghosts.iter().find(|g| g.cell == pos) {
        let color = Color::Rgb {
            r: (ghost.tint.r * 255.0) as u8,
            g: (ghost.tint.g * 255.0) as u8,
            b: (ghost.tint.b * 255.0) as u8,
        };
        let glyph = match ghost.state {
            GhostState::Normal => Glyph::Ghost,
            GhostState::Frightened => Glyph::Frightened,
            GhostState::Eaten | GhostState::Returning | GhostState::Respawning => Glyph::Eyes,
        };
        return Cell { glyph, color };
    }
    if snap.is_block(pos) {
        return Cell {
            glyph: Glyph::Wall,
            color: Color::DarkBlue,
        };
    }
    let dim = snap.light_level < 1.0;
    if snap.has_power_pellet(pos) {
        return Cell {
            glyph: Glyph::Power,
            color: if dim { Color::DarkMagenta } else { Color::Magenta },
        };
    }
    if snap.has_pellet(pos) {
        return Cell {
            glyph: Glyph::Pellet,
            color: if dim { Color::DarkGrey } else { Color::White },
        };
    }
    BLANK
}

fn draw_cell(
    stdout: &mut Stdout,
    renderer: &Renderer,
    x: usize,
    y: usize,
    cell: Cell,
) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "😃",
        Glyph::PlayerDown => "😵",
        Glyph::Ghost => "👻",
        Glyph::Frightened => "😱",
        Glyph::Eyes => "👀",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
        Glyph::Pellet => "· ",
        Glyph::Power => "● ",
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn active_dir_recent(last_seen: &[Option<Instant>; 4], last_pressed: Option<Dir>) -> Option<Dir> {
    let now = Instant::now();
    let hold = Duration::from_millis(INPUT_HOLD_MS);
    if let Some(dir) = last_pressed {
        if let Some(t) = last_seen[dir.index()] {
            if now.duration_since(t) <= hold {
                return Some(dir);
            }
        }
    }
    let mut best: Option<(Dir, Instant)> = None;
    for dir in Dir::ALL {
        if let Some(t) = last_seen[dir.index()] {
            if now.duration_since(t) <= hold {
                match best {
                    None => best = Some((dir, t)),
                    Some((_, bt)) if t > bt => best = Some((dir, t)),
                    _ => {}
                }
            }
        }
    }
    best.map(|(dir, _)| dir)
}
