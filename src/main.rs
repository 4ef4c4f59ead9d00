mod easing;
mod engine;
mod style;

use std::fs;
use std::io::ErrorKind;
use std::time::{Duration, Instant};

use anyhow::Context;
use iced::canvas::path::arc::Elliptical;
use iced::canvas::{Cache, Canvas, Cursor, Frame, Geometry, Path, Stroke};
use iced::time;
use iced::{
    Application, Clipboard, Color, Command, Container, Element, HorizontalAlignment, Length, Point,
    Rectangle, Settings, Subscription, Vector, VerticalAlignment,
};

use crate::engine::{Engine, Parameters};

const PARAMETERS_PATH: &str = "parameters.json";
const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const TWO_PI: f32 = 2.0 * std::f32::consts::PI;
const STROKE_WIDTH: f32 = 2.0;

// Rings and radial lines share the same grey; the lines sit at 0.6 alpha so
// the rings read as the front layer.
const DISC_COLOR: Color = Color {
    r: 0.266,
    g: 0.266,
    b: 0.266,
    a: 1.0,
};
const LINE_COLOR: Color = Color {
    r: 0.266,
    g: 0.266,
    b: 0.266,
    a: 0.6,
};
const BACKGROUND: Color = Color {
    r: 0.05,
    g: 0.05,
    b: 0.07,
    a: 1.0,
};

#[derive(Clone, Debug)]
enum Message {
    Tick(Instant),
    EventOccurred(iced_native::Event),
}

struct Tunnel {
    state: State,
}

impl Application for Tunnel {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Flags = Parameters;

    fn new(flags: Parameters) -> (Self, Command<Message>) {
        (
            Tunnel {
                state: State::new(flags),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        String::from("Tunnel")
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch(vec![
            time::every(FRAME_INTERVAL).map(Message::Tick),
            iced_native::subscription::events().map(Message::EventOccurred),
        ])
    }

    fn update(&mut self, message: Self::Message, _clipboard: &mut Clipboard) -> Command<Message> {
        match message {
            Message::Tick(now) => {
                let start = Instant::now();

                self.state.elapsed_ms =
                    now.saturating_duration_since(self.state.epoch).as_secs_f32() * 1000.0;
                self.state.engine.step(self.state.elapsed_ms);

                self.state.frames += 1;
                self.state.last_step_duration = start.elapsed();
                self.state.cache.clear();
            }
            Message::EventOccurred(iced_native::Event::Window(
                iced_native::window::Event::Resized { width, height },
            )) => {
                log::debug!("surface resized to {}x{}", width, height);

                // Full rebuild, so particle line bindings stay valid against
                // the regenerated line list.
                self.state
                    .engine
                    .resize(width as f32, height as f32, self.state.elapsed_ms);
                self.state.cache.clear();
            }
            Message::EventOccurred(_) => {}
        }
        Command::none()
    }

    fn view(&mut self) -> Element<Message> {
        let canvas = Canvas::new(&mut self.state)
            .width(Length::Fill)
            .height(Length::Fill);

        Container::new(canvas)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(style::Container)
            .into()
    }
}

struct State {
    engine: Engine,
    epoch: Instant,
    elapsed_ms: f32,
    frames: u64,
    last_step_duration: Duration,
    cache: Cache,
}

impl State {
    fn new(parameters: Parameters) -> Self {
        State {
            engine: Engine::new(parameters, WINDOW_WIDTH as f32, WINDOW_HEIGHT as f32),
            epoch: Instant::now(),
            elapsed_ms: 0.0,
            frames: 0,
            last_step_duration: Duration::default(),
            cache: Cache::default(),
        }
    }
}

impl<'a> iced::canvas::Program<Message> for State {
    fn draw(&self, bounds: Rectangle, _cursor: Cursor) -> Vec<Geometry> {
        // Zero-size geometry skips the frame instead of propagating NaNs.
        if !self.engine.is_ready() {
            return Vec::new();
        }

        let tunnel = self.cache.draw(bounds.size(), |frame| {
            let background = Path::rectangle(Point::ORIGIN, frame.size());
            frame.fill(&background, BACKGROUND);

            draw_discs(frame, &self.engine);
            draw_lines(frame, &self.engine);
            draw_particles(frame, &self.engine);
        });

        let overlay = {
            let mut frame = Frame::new(bounds.size());

            let text = iced::canvas::Text {
                color: Color::WHITE,
                size: 14.0,
                position: Point::new(frame.width(), frame.height()),
                horizontal_alignment: HorizontalAlignment::Right,
                vertical_alignment: VerticalAlignment::Bottom,
                ..Default::default()
            };

            frame.fill_text(iced::canvas::Text {
                content: format! {
                    "frame = {}\nlast_step = {:?}\ndiscs = {}, lines = {}, particles = {}",
                    self.frames,
                    self.last_step_duration,
                    self.engine.discs.len(),
                    self.engine.lines.len(),
                    self.engine.particles.len(),
                },
                ..text
            });

            frame.into_geometry()
        };

        vec![tunnel, overlay]
    }
}

/// Outer boundary first, then the rings in index order so later discs
/// overlap earlier ones.
fn draw_discs(frame: &mut Frame, engine: &Engine) {
    let stroke = Stroke {
        color: DISC_COLOR,
        width: STROKE_WIDTH,
        ..Stroke::default()
    };

    let outer = engine.start_disc;
    frame.stroke(&ellipse_path(outer.x, outer.y, outer.w, outer.h), stroke);

    for disc in engine.discs.iter() {
        frame.stroke(&ellipse_path(disc.x, disc.y, disc.w, disc.h), stroke);
    }
}

/// All radial lines go into one path and get stroked in a single call.
fn draw_lines(frame: &mut Frame, engine: &Engine) {
    let path = Path::new(|builder| {
        for line in engine.lines.iter() {
            builder.move_to(Point::new(line.p0.x, line.p0.y));
            builder.line_to(Point::new(line.p1.x, line.p1.y));
        }
    });

    frame.stroke(
        &path,
        Stroke {
            color: LINE_COLOR,
            width: STROKE_WIDTH,
            ..Stroke::default()
        },
    );
}

fn draw_particles(frame: &mut Frame, engine: &Engine) {
    for particle in engine.particles.iter() {
        let line = &engine.lines[particle.line_index];

        let start = Point::new(
            line.p0.x + line.l.x * particle.p,
            line.p0.y + line.l.y * particle.p,
        );
        // The trail may extrapolate past the line end when p is near 1;
        // that overshoot is part of the look and stays unclamped.
        let end = Point::new(
            start.x + line.l.x * particle.l,
            start.y + line.l.y * particle.l,
        );

        frame.stroke(
            &Path::line(start, end),
            Stroke {
                color: Color {
                    a: particle.a,
                    ..Color::WHITE
                },
                width: STROKE_WIDTH,
                ..Stroke::default()
            },
        );
    }
}

fn ellipse_path(x: f32, y: f32, w: f32, h: f32) -> Path {
    Path::new(|builder| {
        builder.ellipse(Elliptical {
            center: Point::new(x, y),
            radii: Vector::new(w, h),
            rotation: 0.0,
            start_angle: 0.0,
            end_angle: TWO_PI,
        })
    })
}

fn load_parameters() -> anyhow::Result<Parameters> {
    match fs::read_to_string(PARAMETERS_PATH) {
        Ok(contents) => {
            let parameters = serde_json::from_str(&contents)
                .with_context(|| format!("invalid {}", PARAMETERS_PATH))?;
            log::info!("loaded {}", PARAMETERS_PATH);
            Ok(parameters)
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(Parameters::default()),
        Err(error) => Err(error).with_context(|| format!("reading {}", PARAMETERS_PATH)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let parameters = load_parameters()?;
    log::info!(
        "starting with {} discs, {} lines, {} particles",
        parameters.disc_count,
        parameters.line_count,
        parameters.particle_count,
    );

    Tunnel::run(Settings {
        antialiasing: true,
        window: iced::window::Settings {
            size: (WINDOW_WIDTH, WINDOW_HEIGHT),
            ..iced::window::Settings::default()
        },
        ..Settings::with_flags(parameters)
    })
    .map_err(|error| anyhow::anyhow!("event loop failed: {}", error))
}
