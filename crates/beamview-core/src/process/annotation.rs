//! Overlay scripts: a tiny line-oriented language that draws crosshairs,
//! lines and circles onto display frames.
//!
//! ```text
//! # beam reference
//! color cyan
//! crosshair 320 256
//! color 255 0 0
//! circle 320 256 100
//! line 0 0 639 511
//! ```
//!
//! Coordinates are `x` (column) then `y` (row). Unknown or malformed lines
//! are skipped.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{CROSSHAIR_SIZE_FRACTION, DEFAULT_ANNOTATION_COLOR, MIN_CROSSHAIR_SIZE};
use crate::frame::DisplayFrame;

pub type Rgb = [u8; 3];

/// Pixels to paint and the color to paint them.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// (row, col) pairs.
    pub indices: Vec<(usize, usize)>,
    pub color: Rgb,
}

/// How `#` comments are cut from a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentStyle {
    /// Everything from `#` to the end of the line is ignored.
    #[default]
    Standard,
    /// Older scripts were cut one character before the `#`, eating the
    /// last character of the command. Kept for scripts written against it.
    Legacy,
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationEngine {
    comment_style: CommentStyle,
}

impl AnnotationEngine {
    pub fn new(comment_style: CommentStyle) -> Self {
        Self { comment_style }
    }

    pub fn comment_style(&self) -> CommentStyle {
        self.comment_style
    }

    /// Turn a script into pixel sets for an image of `shape` (height, width).
    pub fn parse(&self, script: &str, shape: (usize, usize)) -> Vec<Annotation> {
        let mut color = DEFAULT_ANNOTATION_COLOR;
        let mut annotations = Vec::new();

        for (lineno, line) in script.lines().enumerate() {
            let line = strip_comment(line, self.comment_style);
            let mut tokens = line.split_whitespace();
            let Some(command) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();

            let shape_indices = match command.to_ascii_lowercase().as_str() {
                "color" => {
                    match parse_color(&args) {
                        Some(c) => color = c,
                        None => debug!(line = lineno + 1, "Ignoring bad color"),
                    }
                    continue;
                }
                "crosshair" => parse_numbers(&args, 2, 3).map(|n| {
                    let size = n
                        .get(2)
                        .copied()
                        .unwrap_or_else(|| default_crosshair_size(shape));
                    crosshair_indices(n[0], n[1], size, shape)
                }),
                "line" => parse_numbers(&args, 4, 4)
                    .map(|n| line_indices(n[0], n[1], n[2], n[3], shape)),
                "circle" => {
                    parse_numbers(&args, 3, 3).map(|n| circle_indices(n[0], n[1], n[2], shape))
                }
                _ => None,
            };

            match shape_indices {
                Some(indices) => annotations.push(Annotation { indices, color }),
                None => debug!(line = lineno + 1, command, "Ignoring annotation line"),
            }
        }
        annotations
    }

    /// Paint annotations into `image`. An annotation with any pixel outside
    /// the image (e.g. parsed for a larger frame) is skipped whole.
    /// Returns how many were drawn.
    pub fn apply(image: &mut DisplayFrame, annotations: &[Annotation]) -> usize {
        let (h, w) = (image.height(), image.width());
        let mut drawn = 0;
        for annotation in annotations {
            if annotation.indices.iter().any(|&(r, c)| r >= h || c >= w) {
                debug!("Annotation out of bounds for current image, skipped");
                continue;
            }
            for &(r, c) in &annotation.indices {
                for (ch, &v) in annotation.color.iter().enumerate() {
                    image.data[[r, c, ch]] = v;
                }
            }
            drawn += 1;
        }
        drawn
    }
}

fn strip_comment(line: &str, style: CommentStyle) -> &str {
    let Some(pos) = line.find('#') else {
        return line;
    };
    match style {
        CommentStyle::Standard => &line[..pos],
        CommentStyle::Legacy => {
            let cut = line[..pos]
                .char_indices()
                .next_back()
                .map_or(0, |(i, _)| i);
            &line[..cut]
        }
    }
}

fn parse_numbers(args: &[&str], min: usize, max: usize) -> Option<Vec<f64>> {
    if args.len() < min || args.len() > max {
        return None;
    }
    args.iter()
        .map(|a| a.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn parse_color(args: &[&str]) -> Option<Rgb> {
    match args {
        [name] => named_color(name),
        [_, _, _] => {
            let n = parse_numbers(args, 3, 3)?;
            Some([channel(n[0]), channel(n[1]), channel(n[2])])
        }
        _ => None,
    }
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Look up a color by name.
pub fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "red" => [255, 0, 0],
        "green" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "orange" => [255, 165, 0],
        "gray" | "grey" => [128, 128, 128],
        _ => return None,
    };
    Some(rgb)
}

/// `max(10, 2%` of the smaller dimension`)`.
pub fn default_crosshair_size(shape: (usize, usize)) -> f64 {
    let smaller = shape.0.min(shape.1) as f64;
    MIN_CROSSHAIR_SIZE.max(CROSSHAIR_SIZE_FRACTION * smaller)
}

/// Two segments of length `size` crossing at (x, y).
pub fn crosshair_indices(x: f64, y: f64, size: f64, shape: (usize, usize)) -> Vec<(usize, usize)> {
    let half = size / 2.0;
    let mut indices = line_indices(x - half, y, x + half, y, shape);
    indices.extend(line_indices(x, y - half, x, y + half, shape));
    indices
}

/// Pixels along the segment (x1, y1)-(x2, y2), sampled at twice its length.
/// Segments far larger than the image are clipped to it first.
pub fn line_indices(x1: f64, y1: f64, x2: f64, y2: f64, shape: (usize, usize)) -> Vec<(usize, usize)> {
    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return Vec::new();
    }
    let ((x1, y1), (x2, y2)) = if segment_samples(x1, y1, x2, y2) > sample_limit(shape) {
        match clip_segment((x1, y1), (x2, y2), shape) {
            Some(clipped) => clipped,
            None => return Vec::new(),
        }
    } else {
        ((x1, y1), (x2, y2))
    };

    let n = segment_samples(x1, y1, x2, y2);
    let points = (0..n).map(|i| {
        let t = i as f64 / (n - 1) as f64;
        (x1 + t * (x2 - x1), y1 + t * (y2 - y1))
    });
    in_bounds(points, shape)
}

/// Pixels along the circle of `diameter` centered on (x, y). Circles far
/// larger than the image are only sampled along the arc that can reach it.
pub fn circle_indices(x: f64, y: f64, diameter: f64, shape: (usize, usize)) -> Vec<(usize, usize)> {
    if ![x, y, diameter].iter().all(|v| v.is_finite()) {
        return Vec::new();
    }
    let radius = diameter / 2.0;
    let full = 2.0 * PI * diameter.abs();
    if full.ceil() <= sample_limit(shape) as f64 {
        let n = (full.ceil() as usize).max(8);
        let points = (0..n).map(|i| {
            let theta = 2.0 * PI * i as f64 / n as f64;
            (x + radius * theta.cos(), y + radius * theta.sin())
        });
        return in_bounds(points, shape);
    }

    let Some((start, span)) = visible_arc(x, y, radius.abs(), shape) else {
        return Vec::new();
    };
    let n = ((2.0 * radius.abs() * span).ceil() as usize).max(2);
    let points = (0..n).map(|i| {
        let theta = start + span * i as f64 / (n - 1) as f64;
        (x + radius.abs() * theta.cos(), y + radius.abs() * theta.sin())
    });
    in_bounds(points, shape)
}

/// Upper bound on samples for a shape that stays inside the image.
fn sample_limit(shape: (usize, usize)) -> usize {
    4 * (shape.0 + shape.1) + 16
}

fn segment_samples(x1: f64, y1: f64, x2: f64, y2: f64) -> usize {
    let length = (x2 - x1).hypot(y2 - y1);
    ((2.0 * length).ceil() as usize).max(2)
}

/// Liang-Barsky clip against the image grown by one pixel on every side.
fn clip_segment(
    p1: (f64, f64),
    p2: (f64, f64),
    shape: (usize, usize),
) -> Option<((f64, f64), (f64, f64))> {
    let (h, w) = (shape.0 as f64, shape.1 as f64);
    let (dx, dy) = (p2.0 - p1.0, p2.1 - p1.1);
    let edges = [
        (-dx, p1.0 + 1.0),
        (dx, w - p1.0),
        (-dy, p1.1 + 1.0),
        (dy, h - p1.1),
    ];

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (p1.0 + t0 * dx, p1.1 + t0 * dy),
        (p1.0 + t1 * dx, p1.1 + t1 * dy),
    ))
}

/// Angular range `(start, span)` of the circle lying within the disk that
/// encloses the image, or `None` if the circle misses it.
fn visible_arc(x: f64, y: f64, radius: f64, shape: (usize, usize)) -> Option<(f64, f64)> {
    let (h, w) = (shape.0 as f64, shape.1 as f64);
    let (cx, cy) = ((w - 1.0) / 2.0, (h - 1.0) / 2.0);
    let reach = w.hypot(h) / 2.0 + 1.0;
    let distance = (cx - x).hypot(cy - y);

    if (distance - radius).abs() > reach {
        return None;
    }
    if distance + radius <= reach || distance == 0.0 {
        return Some((0.0, 2.0 * PI));
    }
    // Half-angle form of the law of cosines; stays accurate when the
    // circle is huge next to the image.
    let gap = radius - distance;
    let s = ((reach * reach - gap * gap) / (4.0 * radius * distance)).max(0.0);
    let half = 2.0 * s.sqrt().min(1.0).asin();
    let toward = (cy - y).atan2(cx - x);
    Some((toward - half, 2.0 * half))
}

fn in_bounds(points: impl Iterator<Item = (f64, f64)>, shape: (usize, usize)) -> Vec<(usize, usize)> {
    let (h, w) = shape;
    let mut indices: Vec<(usize, usize)> = points
        .map(|(x, y)| (y.round(), x.round()))
        .filter(|&(r, c)| r >= 0.0 && c >= 0.0 && r < h as f64 && c < w as f64)
        .map(|(r, c)| (r as usize, c as usize))
        .collect();
    indices.dedup();
    indices
}
