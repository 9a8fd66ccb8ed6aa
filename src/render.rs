use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::history::HistoryWindow;
use crate::queue::SampleQueue;
use crate::session::SessionShared;
use crate::types::{Axis, DISPLAY_WINDOW_SECONDS, MAX_ACCELERATION, MAX_G};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing surface unavailable: {0}")]
    Surface(String),
    #[error("draw call failed: {0}")]
    Draw(String),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for RenderError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(format!("{value:?}"))
    }
}

impl From<image::ImageError> for RenderError {
    fn from(value: image::ImageError) -> Self {
        RenderError::Draw(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Gray used for both scales.
    pub const SCALE: Color = Color::rgb(137, 137, 137);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LineStyle {
    pub color: Color,
    pub stroke_width: f32,
    pub anti_alias: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct TextStyle {
    pub color: Color,
    pub size: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Primitive drawing surface the trace is rendered onto.
///
/// Implementations hand out a frame buffer of known pixel dimensions;
/// `present` makes the finished frame visible. Every call can fail
/// transiently, and the render loop treats any failure as "skip this
/// frame", never as fatal.
pub trait Renderer {
    fn clear(&mut self, color: Color) -> Result<(), RenderError>;
    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, style: LineStyle)
        -> Result<(), RenderError>;
    fn draw_polyline(&mut self, points: &[(f32, f32)], style: LineStyle)
        -> Result<(), RenderError>;
    fn draw_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, style: TextStyle)
        -> Result<(), RenderError>;
    fn present(&mut self) -> Result<(), RenderError>;
}

/// Draws one frame of the scrolling trace.
///
/// Layout: the g scale runs across the canvas width with 0g centered;
/// time runs down the canvas, newest sample at the bottom of the
/// display window. Geometry mirrors the classic seismograph strip:
/// `x = w/2 * (1 + value/max)` and `y = h * (t - start)/window`.
pub fn draw_frame<R: Renderer + ?Sized>(
    history: &HistoryWindow,
    renderer: &mut R,
    axis: Axis,
    width: u32,
    height: u32,
) -> Result<(), RenderError> {
    let width = width as f32;
    let height = height as f32;
    let stroke_width = width / 300.0;
    let text_size = width / 35.0;
    let scale_line = LineStyle {
        color: Color::SCALE,
        stroke_width,
        anti_alias: true,
    };
    let scale_text = TextStyle {
        color: Color::SCALE,
        size: text_size,
    };

    renderer.clear(Color::WHITE)?;

    let max_g = MAX_G as i32;
    for g in (1 - max_g)..=(max_g - 1) {
        let x = width / 2.0 * (1.0 + g as f32 / MAX_G);
        renderer.draw_line(x, 0.0, x, height / 20.0, scale_line)?;
        renderer.draw_text(
            &format!("{g}g"),
            x,
            height / 20.0 + 1.2 * text_size,
            TextAlign::Center,
            scale_text,
        )?;
    }

    // No time scale (and nothing to trace) until a sample exists.
    if let Some(newest) = history.newest() {
        let end_time = newest.timestamp_ms as f32 / 1000.0;
        let start_time = end_time - DISPLAY_WINDOW_SECONDS;

        let first_mark = start_time.floor().max(0.0) as i32;
        let mut mark = end_time.floor() as i32;
        while mark >= first_mark {
            let y = height * (mark as f32 - start_time) / DISPLAY_WINDOW_SECONDS;
            renderer.draw_line(0.0, y, width / 20.0, y, scale_line)?;
            renderer.draw_text(
                &format!("{mark}s"),
                width / 20.0 + 0.2 * text_size,
                y + 0.5 * text_size,
                TextAlign::Left,
                scale_text,
            )?;
            mark -= 1;
        }

        let points: Vec<(f32, f32)> = history
            .display_samples()
            .map(|sample| {
                (
                    width / 2.0 * (1.0 + sample.value(axis) / MAX_ACCELERATION),
                    height * (sample.timestamp_ms as f32 / 1000.0 - start_time)
                        / DISPLAY_WINDOW_SECONDS,
                )
            })
            .collect();
        // A single point has no segment to draw.
        if points.len() >= 2 {
            renderer.draw_polyline(
                &points,
                LineStyle {
                    color: Color::BLACK,
                    stroke_width,
                    anti_alias: false,
                },
            )?;
        }
    }

    renderer.present()
}

/// Periodic consumer: drains the queue into the history, then draws the
/// display window. Fixed-delay scheduling; drift under load is fine.
pub struct RenderLoop<R: Renderer> {
    queue: SampleQueue,
    history: Arc<Mutex<HistoryWindow>>,
    surface: Arc<Mutex<R>>,
    session: Arc<SessionShared>,
    period: Duration,
}

impl<R: Renderer> RenderLoop<R> {
    pub(crate) fn new(
        queue: SampleQueue,
        history: Arc<Mutex<HistoryWindow>>,
        surface: Arc<Mutex<R>>,
        session: Arc<SessionShared>,
        period_ms: u64,
    ) -> Self {
        Self {
            queue,
            history,
            surface,
            session,
            period: Duration::from_millis(period_ms),
        }
    }

    /// Runs until the session's running flag goes false. The flag is
    /// observed once per period; pausing does not stop the loop, it
    /// only freezes the epoch bookkeeping upstream.
    pub fn run(mut self) {
        while self.session.is_running() {
            self.tick();
            thread::sleep(self.period);
        }
        debug!("render loop exited");
    }

    pub fn spawn(self) -> JoinHandle<()>
    where
        R: Send + 'static,
    {
        thread::spawn(move || self.run())
    }

    /// One drain-append-draw pass.
    ///
    /// Lock order is history first, surface second; both guards drop at
    /// scope exit on every path. A surface failure skips only the draw:
    /// the drained samples are already appended by then.
    pub(crate) fn tick(&mut self) {
        let drained = self.queue.drain_all();
        let (axis, width, height) = self.session.view_params();

        let mut history = match self.history.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("history lock poisoned; skipping tick");
                return;
            }
        };
        for sample in drained {
            history.append(sample);
        }

        let mut surface = match self.surface.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("drawing surface unavailable; skipping frame");
                return;
            }
        };
        if let Err(err) = draw_frame(&history, &mut *surface, axis, width, height) {
            debug!("frame skipped: {err}");
        }
    }
}
