//! Learning-curve plots rendered to PNG
//!
//! The image carries a title, labeled axes with horizontal grid lines, one
//! colored polyline per curve and a legend pairing each color with its label.
//! Text is drawn with the fixed 8x8 bitmap glyphs of `font8x8`, so rendering
//! needs no font files.

use anyhow::{Context, Result};
use font8x8::{BASIC_FONTS, GREEK_FONTS, UnicodeFonts};
use image::{ColorType, ImageEncoder, Rgb, RgbImage, codecs::png::PngEncoder};
use serde::{Deserialize, Serialize};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const MARGIN_LEFT: u32 = 70;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 44;
const MARGIN_BOTTOM: u32 = 44;
const GRID_LINES: u32 = 5;
const SWATCH: u32 = 12;
const GLYPH: u32 = 8;
const LEGEND_ROW: u32 = SWATCH + 6;
const LEGEND_PAD: u32 = 8;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const LEGEND_BORDER: Rgb<u8> = Rgb([180, 180, 180]);

/// Matplotlib's default cycle, so plots look familiar
const PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

/// One labeled curve of a plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    /// Legend label
    pub label: String,
    /// Y values, one per time step
    pub values: Vec<f64>,
}

/// Reward-versus-time plot with one series per configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurvePlot {
    title: String,
    series: Vec<PlotSeries>,
}

impl LearningCurvePlot {
    /// Empty plot with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), series: Vec::new() }
    }

    /// Append a labeled curve
    pub fn add_curve(&mut self, values: &[f64], label: impl Into<String>) {
        self.series.push(PlotSeries { label: label.into(), values: values.to_vec() });
    }

    /// Plot title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Curves in insertion order
    pub fn series(&self) -> &[PlotSeries] {
        &self.series
    }

    /// Legend labels in insertion order
    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.label.as_str()).collect()
    }

    /// Rasterize the plot
    pub fn render(&self) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        let frame = Frame::fit(&self.series);
        let bottom = HEIGHT - MARGIN_BOTTOM;

        // Title: double size when it fits
        let scale = if text_width(&self.title, 2) <= WIDTH - 2 * MARGIN_RIGHT { 2 } else { 1 };
        let title_x = WIDTH.saturating_sub(text_width(&self.title, scale)) / 2;
        draw_text(&mut canvas, &self.title, title_x, (MARGIN_TOP - GLYPH * scale) / 2, scale, AXIS);

        for i in 0..=GRID_LINES {
            let y = MARGIN_TOP + i * (bottom - MARGIN_TOP) / GRID_LINES;
            draw_line(&mut canvas, (MARGIN_LEFT as i64, y as i64), ((WIDTH - MARGIN_RIGHT) as i64, y as i64), GRID);

            let tick = tick_label(frame.y_max - (frame.y_max - frame.y_min) * i as f64 / GRID_LINES as f64);
            let tick_x = (MARGIN_LEFT - 6).saturating_sub(text_width(&tick, 1));
            draw_text(&mut canvas, &tick, tick_x, y.saturating_sub(GLYPH / 2), 1, AXIS);
        }

        let origin = (MARGIN_LEFT as i64, bottom as i64);
        draw_line(&mut canvas, origin, (MARGIN_LEFT as i64, MARGIN_TOP as i64), AXIS);
        draw_line(&mut canvas, origin, ((WIDTH - MARGIN_RIGHT) as i64, origin.1), AXIS);

        draw_text(&mut canvas, "0", MARGIN_LEFT, bottom + 6, 1, AXIS);
        let last_step = format!("{}", frame.x_max as u64);
        let last_x = (WIDTH - MARGIN_RIGHT).saturating_sub(text_width(&last_step, 1));
        draw_text(&mut canvas, &last_step, last_x, bottom + 6, 1, AXIS);
        let caption = "Time step";
        draw_text(&mut canvas, caption, (WIDTH - text_width(caption, 1)) / 2, bottom + 24, 1, AXIS);
        draw_text(&mut canvas, "Reward", 8, MARGIN_TOP - GLYPH - 6, 1, AXIS);

        for (index, series) in self.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            let mut previous: Option<(i64, i64)> = None;
            for (step, &value) in series.values.iter().enumerate() {
                // Non-finite values break the line
                if !value.is_finite() {
                    previous = None;
                    continue;
                }
                let point = frame.project(step, value);
                if let Some(from) = previous {
                    draw_line(&mut canvas, from, point, color);
                } else {
                    set_pixel(&mut canvas, point.0, point.1, color);
                }
                previous = Some(point);
            }
        }

        self.draw_legend(&mut canvas);
        canvas
    }

    /// Boxed legend in the lower right corner of the plot area
    fn draw_legend(&self, canvas: &mut RgbImage) {
        if self.series.is_empty() {
            return;
        }
        let widest = self.series.iter().map(|s| text_width(&s.label, 1)).max().unwrap_or(0);
        let width = 3 * LEGEND_PAD + SWATCH + widest;
        let height = 2 * LEGEND_PAD + self.series.len() as u32 * LEGEND_ROW - (LEGEND_ROW - SWATCH);
        let left = (WIDTH - MARGIN_RIGHT - LEGEND_PAD).saturating_sub(width);
        let top = (HEIGHT - MARGIN_BOTTOM - LEGEND_PAD).saturating_sub(height);

        fill_rect(canvas, left, top, width, height, BACKGROUND);
        let (right, lower) = ((left + width) as i64, (top + height) as i64);
        let (left_edge, top_edge) = (left as i64, top as i64);
        draw_line(canvas, (left_edge, top_edge), (right, top_edge), LEGEND_BORDER);
        draw_line(canvas, (right, top_edge), (right, lower), LEGEND_BORDER);
        draw_line(canvas, (right, lower), (left_edge, lower), LEGEND_BORDER);
        draw_line(canvas, (left_edge, lower), (left_edge, top_edge), LEGEND_BORDER);

        for (index, series) in self.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            let row = top + LEGEND_PAD + index as u32 * LEGEND_ROW;
            fill_rect(canvas, left + LEGEND_PAD, row, SWATCH, SWATCH, color);
            let text_y = row + (SWATCH - GLYPH) / 2;
            draw_text(canvas, &series.label, left + 2 * LEGEND_PAD + SWATCH, text_y, 1, AXIS);
        }
    }

    /// Rasterize and encode as PNG bytes
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let canvas = self.render();
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(canvas.as_raw(), WIDTH, HEIGHT, ColorType::Rgb8)
            .context("failed to encode plot PNG")?;
        Ok(buffer)
    }
}

/// Mapping from data coordinates to pixels
struct Frame {
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn fit(series: &[PlotSeries]) -> Self {
        let x_max = series.iter().map(|s| s.values.len()).max().unwrap_or(1).saturating_sub(1).max(1) as f64;

        let finite = series.iter().flat_map(|s| s.values.iter().copied()).filter(|v| v.is_finite());
        let (mut y_min, mut y_max) =
            finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if !y_min.is_finite() {
            (y_min, y_max) = (0.0, 1.0);
        } else if y_max - y_min < f64::EPSILON {
            let pad = (y_min.abs() * 0.1).max(0.5);
            (y_min, y_max) = (y_min - pad, y_max + pad);
        } else {
            let pad = (y_max - y_min) * 0.05;
            (y_min, y_max) = (y_min - pad, y_max + pad);
        }

        Self { x_max, y_min, y_max }
    }

    fn project(&self, step: usize, value: f64) -> (i64, i64) {
        let plot_width = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) as f64;
        let plot_height = (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) as f64;
        let x = MARGIN_LEFT as f64 + step as f64 / self.x_max * plot_width;
        let y = (HEIGHT - MARGIN_BOTTOM) as f64 - (value - self.y_min) / (self.y_max - self.y_min) * plot_height;
        (x.round() as i64, y.round() as i64)
    }
}

fn set_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line
fn draw_line(canvas: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut error = dx + dy;

    loop {
        set_pixel(canvas, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += sx;
        }
        if doubled <= dx {
            error += dx;
            y += sy;
        }
    }
}

fn fill_rect(canvas: &mut RgbImage, left: u32, top: u32, width: u32, height: u32, color: Rgb<u8>) {
    for dy in 0..height {
        for dx in 0..width {
            set_pixel(canvas, (left + dx) as i64, (top + dy) as i64, color);
        }
    }
}

/// Bitmap of one character; unknown characters render as '?'
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH * scale
}

/// Draw `text` with its top-left corner at (`x`, `y`), each glyph pixel a `scale`-sized square
fn draw_text(canvas: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    for (index, c) in text.chars().enumerate() {
        let left = x + index as u32 * GLYPH * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for column in 0..GLYPH {
                // Least significant bit is the leftmost pixel
                if bits & (1 << column) != 0 {
                    fill_rect(canvas, left + column * scale, y + row as u32 * scale, scale, scale, color);
                }
            }
        }
    }
}

fn tick_label(value: f64) -> String {
    if value.abs() >= 1000.0 { format!("{:.0}", value) } else { format!("{:.1}", value) }
}
