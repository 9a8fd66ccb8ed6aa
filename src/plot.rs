use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::element::{PathElement, Text};
use plotters::prelude::{BitMapBackend, IntoDrawingArea};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color as _, IntoFont, RGBColor};

use crate::render::{Color, LineStyle, RenderError, Renderer, TextAlign, TextStyle};

/// Offscreen drawing surface: draws into an RGB buffer via plotters'
/// bitmap backend and encodes a PNG on every `present`.
pub struct PngRenderer {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
    frame: Option<Vec<u8>>,
}

impl PngRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![255u8; (width * height * 3) as usize],
            frame: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG bytes of the most recently presented frame.
    pub fn last_png(&self) -> Option<&[u8]> {
        self.frame.as_deref()
    }
}

fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn px(value: f32) -> i32 {
    value.round() as i32
}

impl Renderer for PngRenderer {
    fn clear(&mut self, color: Color) -> Result<(), RenderError> {
        let (width, height) = (self.width, self.height);
        let root = BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        root.fill(&rgb(color))?;
        Ok(())
    }

    fn draw_line(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        style: LineStyle,
    ) -> Result<(), RenderError> {
        self.draw_polyline(&[(x0, y0), (x1, y1)], style)
    }

    fn draw_polyline(&mut self, points: &[(f32, f32)], style: LineStyle) -> Result<(), RenderError> {
        if points.len() < 2 {
            return Ok(());
        }
        let (width, height) = (self.width, self.height);
        let root = BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        let path: Vec<(i32, i32)> = points.iter().map(|(x, y)| (px(*x), px(*y))).collect();
        let stroke = (style.stroke_width.max(1.0)) as u32;
        root.draw(&PathElement::new(path, rgb(style.color).stroke_width(stroke)))?;
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        align: TextAlign,
        style: TextStyle,
    ) -> Result<(), RenderError> {
        let (width, height) = (self.width, self.height);
        let root = BitMapBackend::with_buffer(&mut self.buffer, (width, height)).into_drawing_area();
        let h_pos = match align {
            TextAlign::Left => HPos::Left,
            TextAlign::Center => HPos::Center,
            TextAlign::Right => HPos::Right,
        };
        // The y coordinate is the text baseline.
        let font = ("sans-serif", f64::from(style.size))
            .into_font()
            .color(&rgb(style.color))
            .pos(Pos::new(h_pos, VPos::Bottom));
        root.draw(&Text::new(text.to_string(), (px(x), px(y)), font))?;
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let image =
            ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, self.buffer.clone())
                .ok_or_else(|| RenderError::Draw("failed to wrap frame buffer".into()))?;
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
        self.frame = Some(encoded);
        Ok(())
    }
}
