/// Interactive terminal viewer built on the meshview CPU renderer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use log::{info, warn};
use meshview_core::{
    FrameStats, FrameScheduler, Mesh, RenderConfig, RenderMode, RenderOutcome, Renderer,
    RotationState, SkipReason, Texture, ViewState,
};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

pub mod renderer;

pub use renderer::HalfBlockPresenter;

/// Degrees per arrow key press
const ROTATE_STEP: f32 = 5.0;
/// Initial orientation of the model
const INITIAL_ROTATION: RotationState = RotationState { x: 20.0, y: 45.0 };
const INITIAL_ZOOM: f32 = 100.0;
const KEY_HELP: &str = "arrows/drag rotate +/- zoom t m r q";

/// Decode a texture on a worker thread; the result arrives on the returned channel
pub fn spawn_texture_loader(path: PathBuf) -> Receiver<meshview_core::Result<Texture>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = Texture::open(&path);
        // The viewer may already have quit
        let _ = tx.send(result);
    });
    rx
}

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    mesh: Mesh,
    view: ViewState,
    renderer: Renderer,
    presenter: HalfBlockPresenter,
    scheduler: FrameScheduler,
    texture: Option<Texture>,
    texture_rx: Option<Receiver<meshview_core::Result<Texture>>>,
    use_texture: bool,
    drag_origin: Option<(u16, u16)>,
    last_stats: Option<FrameStats>,
    status: String,
    running: bool,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, config: RenderConfig) -> Self {
        let mut scheduler = FrameScheduler::new();
        scheduler.request();

        Self {
            mesh,
            view: ViewState::new(INITIAL_ROTATION, INITIAL_ZOOM),
            renderer: Renderer::new(config),
            presenter: HalfBlockPresenter::default(),
            scheduler,
            texture: None,
            texture_rx: None,
            use_texture: true,
            drag_origin: None,
            last_stats: None,
            status: String::new(),
            running: true,
        }
    }

    /// Receive a texture from a loader thread once it is decoded
    pub fn with_texture_loader(mut self, rx: Receiver<meshview_core::Result<Texture>>) -> Self {
        self.texture_rx = Some(rx);
        self
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Size the render target to a terminal of `cols` x `rows` cells.
    /// The last row is kept for the status line.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let height = 2 * rows.saturating_sub(1) as u32;
        self.renderer.attach_sized(cols as u32, height);
        self.scheduler.request();
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        self.shutdown();
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        self.resize(cols, rows);

        while self.running {
            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(event);
            }
            self.poll_texture();

            if self.scheduler.take() {
                self.render()?;
            }
        }

        Ok(())
    }

    /// Pick up a finished texture decode, if any
    pub fn poll_texture(&mut self) {
        let Some(rx) = &self.texture_rx else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(texture)) => {
                info!("Texture ready: {}x{}", texture.width(), texture.height());
                self.texture = Some(texture);
                self.texture_rx = None;
                self.scheduler.request();
            }
            Ok(Err(e)) => {
                warn!("Texture failed to load: {}", e);
                self.status = format!("texture failed: {}", e);
                self.texture_rx = None;
                self.scheduler.request();
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                warn!("Texture loader exited without a result");
                self.texture_rx = None;
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(cols, rows) => self.resize(cols, rows),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }

        let zoom = self.renderer.config().zoom;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.shutdown();
                return;
            }
            KeyCode::Char('w') | KeyCode::Up => self.view.rotation.rotate(-ROTATE_STEP, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.view.rotation.rotate(ROTATE_STEP, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.view.rotation.rotate(0.0, -ROTATE_STEP),
            KeyCode::Char('d') | KeyCode::Right => self.view.rotation.rotate(0.0, ROTATE_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.view.zoom_by(zoom.step, zoom.min, zoom.max)
            }
            KeyCode::Char('-') => self.view.zoom_by(-zoom.step, zoom.min, zoom.max),
            KeyCode::Char('t') => self.use_texture = !self.use_texture,
            KeyCode::Char('m') => {
                let mode = match self.renderer.config().mode {
                    RenderMode::FlatImmediate => RenderMode::WaitForTexture,
                    RenderMode::WaitForTexture => RenderMode::FlatImmediate,
                };
                self.renderer.set_mode(mode);
            }
            KeyCode::Char('r') => self.view = ViewState::new(INITIAL_ROTATION, INITIAL_ZOOM),
            _ => return,
        }
        self.scheduler.request();
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        match kind {
            MouseEventKind::Down(MouseButton::Left) => self.drag_origin = Some((column, row)),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((x0, y0)) = self.drag_origin {
                    let dx = column as f32 - x0 as f32;
                    // Cells are twice as tall as they are wide
                    let dy = 2.0 * (row as f32 - y0 as f32);
                    self.view.rotation.rotate(dy, dx);
                    self.scheduler.request();
                }
                self.drag_origin = Some((column, row));
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag_origin = None,
            MouseEventKind::ScrollUp => {
                let zoom = self.renderer.config().zoom;
                self.view.zoom_by(zoom.step, zoom.min, zoom.max);
                self.scheduler.request();
            }
            MouseEventKind::ScrollDown => {
                let zoom = self.renderer.config().zoom;
                self.view.zoom_by(-zoom.step, zoom.min, zoom.max);
                self.scheduler.request();
            }
            _ => {}
        }
    }

    /// Cancel pending renders and release the target
    pub fn shutdown(&mut self) {
        self.running = false;
        self.scheduler.cancel();
        self.renderer.detach();
    }

    /// Run one render cycle and present the result
    pub fn render_frame(&mut self) -> meshview_core::Result<RenderOutcome> {
        let texture = self.texture.as_ref().filter(|_| self.use_texture);
        let outcome = self.renderer.render(&self.mesh, &self.view, texture)?;
        if let RenderOutcome::Drawn(stats) = outcome {
            self.last_stats = Some(stats);
        }
        Ok(outcome)
    }

    fn render(&mut self) -> io::Result<()> {
        let outcome = match self.render_frame() {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.status = e.to_string();
                None
            }
        };

        let mut stdout = stdout();
        if let Some(RenderOutcome::Drawn(_)) = outcome {
            if let Some(surface) = self.renderer.surface() {
                self.presenter.draw(surface, &mut stdout)?;
            }
        }
        self.draw_status(&mut stdout, outcome)?;
        stdout.flush()
    }

    fn draw_status<W: Write>(&self, out: &mut W, outcome: Option<RenderOutcome>) -> io::Result<()> {
        let (_, rows) = terminal::size()?;
        let state = match outcome {
            Some(RenderOutcome::Skipped(SkipReason::TexturePending)) => "waiting for texture",
            Some(RenderOutcome::Skipped(SkipReason::NoTarget)) => "no target",
            Some(RenderOutcome::Drawn(_)) => "",
            None => "error",
        };
        let faces = self
            .last_stats
            .map(|s| format!("{}/{} faces", s.drawn, s.faces))
            .unwrap_or_default();
        let texture = match (&self.texture, self.use_texture) {
            (Some(_), true) => "on",
            (Some(_), false) => "off",
            (None, _) if self.texture_rx.is_some() => "loading",
            (None, _) => "none",
        };
        let mode = match self.renderer.config().mode {
            RenderMode::FlatImmediate => "flat",
            RenderMode::WaitForTexture => "wait",
        };

        queue!(
            out,
            cursor::MoveTo(0, rows.saturating_sub(1)),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(TermColor::Yellow),
            Print(format!(
                "meshview | rot {:.0},{:.0} zoom {:.0}% | {} | tex {} | mode {} {} {} | {}",
                self.view.rotation.x,
                self.view.rotation.y,
                self.view.zoom,
                faces,
                texture,
                mode,
                state,
                self.status,
                KEY_HELP
            )),
            ResetColor
        )
    }
}
