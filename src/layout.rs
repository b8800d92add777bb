//! Word placement.
//!
//! Occupied canvas area is tracked in a bit-packed grid (one bit per
//! pixel, 32 per `u32` block). Each word is rasterized into a sprite of
//! the same packing, and candidate positions are scanned along an
//! Archimedean spiral from the canvas center. Collision tests and sprite
//! writes run a block at a time with a shift-and-carry over the `u32`s.

use crate::color::{ColorFunc, Region};
use crate::config::Config;
use crate::mask::MaskImage;
use crate::Error;
use fontdue::Font;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Dilation around each glyph pixel, in canvas pixels.
const MARGIN: u32 = 2;
/// Font-size decrement when a word cannot be placed.
const FONT_STEP: f32 = 1.0;
/// Spiral positions tried per word before giving up.
const MAX_SPIRAL_STEPS: usize = 10_000;

/// A word with its final position, size, orientation and color.
#[derive(Debug, Clone)]
pub struct PlacedWord {
    pub text: String,
    pub font_size: f32,
    /// Baseline start, canvas coordinates.
    pub x: f32,
    pub y: f32,
    pub vertical: bool,
    pub color: String,
}

// =============================================================================
// Occupancy grid
// =============================================================================

pub(crate) struct Occupancy {
    width: u32,
    height: u32,
    stride: usize,
    bits: Vec<u32>,
}

impl Occupancy {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let stride = ((width + 31) >> 5) as usize;
        let mut bits = vec![0u32; stride * height as usize];
        // When the width is not block-aligned, the last block of each row
        // has columns past the canvas edge. Mark them occupied so the
        // block-level collision walk cannot place words overhanging the
        // right edge.
        if width & 31 != 0 {
            let tail = (1u32 << (32 - (width & 31))) - 1;
            for y in 0..height as usize {
                bits[y * stride + stride - 1] |= tail;
            }
        }
        Self {
            width,
            height,
            stride,
            bits,
        }
    }

    /// Mark one pixel occupied. Used to seed the grid from a mask.
    pub(crate) fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.stride + (x as usize >> 5);
            self.bits[idx] |= 1 << (31 - (x & 31));
        }
    }

    /// Test a sprite against the grid at `(start_x, start_y)` (sprite
    /// top-left). Anything outside the canvas counts as a collision.
    pub(crate) fn collides(&self, sprite: &WordSprite, start_x: i32, start_y: i32) -> bool {
        let shift = (start_x & 31).unsigned_abs();
        let r_shift = 32 - shift;
        let block_start = (start_x >> 5) as isize;

        for sy in 0..sprite.height {
            let gy = start_y + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                return true;
            }
            let row = gy as usize * self.stride;
            let mut carry = 0u32;

            for sx in 0..=sprite.stride {
                let s_val = if sx < sprite.stride {
                    sprite.bits[sy as usize * sprite.stride + sx]
                } else {
                    0
                };
                // Align the sprite block with the grid: the tail of the
                // previous block joined with the head of this one. A plain
                // `>>` zero-fills; shift == 0 must bypass the carry or the
                // `<< 32` would overflow.
                let aligned = if shift == 0 {
                    s_val
                } else {
                    (carry << r_shift) | (s_val >> shift)
                };
                if aligned != 0 {
                    let gx = block_start + sx as isize;
                    if gx < 0 || gx >= self.stride as isize {
                        return true;
                    }
                    if self.bits[row + gx as usize] & aligned != 0 {
                        return true;
                    }
                }
                carry = s_val;
            }
        }
        false
    }

    /// Stamp a sprite into the grid. Same alignment walk as `collides`,
    /// with out-of-range blocks silently dropped.
    pub(crate) fn stamp(&mut self, sprite: &WordSprite, start_x: i32, start_y: i32) {
        let shift = (start_x & 31).unsigned_abs();
        let r_shift = 32 - shift;
        let block_start = (start_x >> 5) as isize;

        for sy in 0..sprite.height {
            let gy = start_y + sy as i32;
            if gy < 0 || gy >= self.height as i32 {
                continue;
            }
            let row = gy as usize * self.stride;
            let mut carry = 0u32;

            for sx in 0..=sprite.stride {
                let s_val = if sx < sprite.stride {
                    sprite.bits[sy as usize * sprite.stride + sx]
                } else {
                    0
                };
                let aligned = if shift == 0 {
                    s_val
                } else {
                    (carry << r_shift) | (s_val >> shift)
                };
                let gx = block_start + sx as isize;
                if aligned != 0 && gx >= 0 && gx < self.stride as isize {
                    self.bits[row + gx as usize] |= aligned;
                }
                carry = s_val;
            }
        }
    }
}

// =============================================================================
// Word sprites
// =============================================================================

pub(crate) struct WordSprite {
    bits: Vec<u32>,
    /// Blocks per row.
    stride: usize,
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Baseline start relative to the sprite's top-left, for the SVG
    /// `<text>` anchor.
    pub(crate) anchor_x: f32,
    pub(crate) anchor_y: f32,
}

/// Rasterize a word at `size` px into a collision sprite, dilated by
/// `margin` on every side. Vertical sprites are the horizontal bitmap
/// rotated a quarter turn clockwise, matching an SVG `rotate(90 x y)`
/// around the baseline anchor.
pub(crate) fn rasterize(
    text: &str,
    font: &Font,
    size: f32,
    margin: u32,
    vertical: bool,
) -> WordSprite {
    let metrics = font
        .horizontal_line_metrics(size)
        .unwrap_or(fontdue::LineMetrics {
            ascent: size * 0.8,
            descent: size * -0.2,
            line_gap: 0.0,
            new_line_size: size,
        });

    let mut glyphs = Vec::new();
    let mut pen = 0.0f32;
    for ch in text.chars() {
        let (gm, bitmap) = font.rasterize(ch, size);
        glyphs.push((pen, gm, bitmap));
        pen += gm.advance_width;
    }

    let margin_f = margin as f32;
    let width = (pen.ceil() + margin_f * 2.0).max(1.0) as u32;
    let height = (metrics.new_line_size.ceil() + margin_f * 2.0).max(1.0) as u32;
    let baseline_x = margin_f;
    let baseline_y = margin_f + metrics.ascent;

    // Horizontal coverage grid first; packing and orientation come after.
    let mut grid = vec![false; (width * height) as usize];
    for (offset, gm, bitmap) in &glyphs {
        let left = baseline_x + offset + gm.xmin as f32;
        let top = baseline_y - gm.height as f32 - gm.ymin as f32;
        for y in 0..gm.height {
            for x in 0..gm.width {
                if bitmap[y * gm.width + x] <= 10 {
                    continue;
                }
                let px = (left + x as f32).round() as i32;
                let py = (top + y as f32).round() as i32;
                let m = margin as i32;
                for dy in -m..=m {
                    for dx in -m..=m {
                        let gx = px + dx;
                        let gy = py + dy;
                        if gx >= 0 && gy >= 0 && (gx as u32) < width && (gy as u32) < height {
                            grid[(gy as u32 * width + gx as u32) as usize] = true;
                        }
                    }
                }
            }
        }
    }

    pack_grid(&grid, width, height, vertical, baseline_x, baseline_y)
}

/// Pack a boolean coverage grid into sprite blocks, rotating a quarter
/// turn clockwise for vertical sprites: `(x, y) -> (h - 1 - y, x)`.
pub(crate) fn pack_grid(
    grid: &[bool],
    width: u32,
    height: u32,
    vertical: bool,
    baseline_x: f32,
    baseline_y: f32,
) -> WordSprite {
    let (out_w, out_h) = if vertical {
        (height, width)
    } else {
        (width, height)
    };
    let stride = ((out_w + 31) >> 5) as usize;
    let mut bits = vec![0u32; stride * out_h as usize];

    for y in 0..height {
        for x in 0..width {
            if !grid[(y * width + x) as usize] {
                continue;
            }
            let (tx, ty) = if vertical { (height - 1 - y, x) } else { (x, y) };
            let idx = ty as usize * stride + (tx as usize >> 5);
            bits[idx] |= 1 << (31 - (tx & 31));
        }
    }

    let (anchor_x, anchor_y) = if vertical {
        (height as f32 - baseline_y, baseline_x)
    } else {
        (baseline_x, baseline_y)
    };
    WordSprite {
        bits,
        stride,
        width: out_w,
        height: out_h,
        anchor_x,
        anchor_y,
    }
}

// =============================================================================
// Spiral scan
// =============================================================================

struct SpiralScan {
    t: i32,
    dt: i32,
    dx: f64,
    dy: f64,
    step_x: f64,
    step_y: f64,
}

impl SpiralScan {
    /// Rectangular Archimedean spiral whose x step is stretched by the
    /// canvas aspect ratio. `dt` flips the winding direction.
    fn new(width: i32, height: i32, dt: i32) -> Self {
        let step_y = 4.0;
        Self {
            t: 0,
            dt,
            dx: 0.0,
            dy: 0.0,
            step_x: step_y * width as f64 / height as f64,
            step_y,
        }
    }
}

impl Iterator for SpiralScan {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        self.t += self.dt;
        let sign = if self.t < 0 { -1.0 } else { 1.0 };
        let leg = ((1.0 + 4.0 * sign * self.t as f64).sqrt() - sign) as i32 & 3;
        match leg {
            0 => self.dx += self.step_x,
            1 => self.dy += self.step_y,
            2 => self.dx -= self.step_x,
            _ => self.dy -= self.step_y,
        }
        Some((self.dx as i32, self.dy as i32))
    }
}

// =============================================================================
// Placement engine
// =============================================================================

/// Extend the normalized word list with repeated, downweighted copies
/// until it covers `max_words`, the way `repeat = true` fills sparse
/// inputs.
pub(crate) fn repeat_extend<'a>(entries: &mut Vec<(&'a str, f64)>, max_words: usize) {
    if entries.is_empty() || entries.len() >= max_words {
        return;
    }
    let rounds = max_words.div_ceil(entries.len()) - 1;
    let downweight = entries.last().map(|(_, w)| *w).unwrap_or(1.0);
    let original = entries.clone();
    for i in 1..=rounds {
        let factor = downweight.powi(i as i32);
        entries.extend(original.iter().map(|(w, v)| (*w, v * factor)));
    }
}

/// Lay out the rescaled frequency map on the canvas.
///
/// Follows the frequency-driven sizing scheme: font size starts at
/// `max_font_size` and contracts per word by
/// `(rs * w/w_prev + (1 - rs))` with `rs = relative_scaling`; orientation
/// is horizontal with probability `prefer_horizontal`; a word that does
/// not fit flips orientation once, then shrinks in 1 px steps. Once the
/// size falls below `min_font_size`, placement stops for good.
pub(crate) fn place_words(
    weights: &[(String, f64)],
    config: &Config,
    font: &Font,
    mask: Option<&MaskImage>,
    colors: &ColorFunc,
) -> Result<Vec<PlacedWord>, Error> {
    if weights.is_empty() {
        return Err(Error::Input("no words to lay out".into()));
    }

    let max_weight = weights
        .iter()
        .map(|(_, w)| *w)
        .fold(f64::MIN, f64::max)
        .max(f64::MIN_POSITIVE);
    let mut entries: Vec<(&str, f64)> = weights
        .iter()
        .map(|(word, w)| (word.as_str(), w / max_weight))
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries.truncate(config.max_words);
    if config.repeat {
        repeat_extend(&mut entries, config.max_words);
    }

    let mut grid = Occupancy::new(config.width, config.height);
    if let Some(mask) = mask {
        for y in 0..config.height {
            for x in 0..config.width {
                if mask.is_blocked(x, y) {
                    grid.set(x, y);
                }
            }
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.random_state);
    let rs = config.relative_scaling.clamp(0.0, 1.0) as f64;
    let mut font_size = config.max_font_size.min(config.height as f32);
    let mut last_weight = 1.0f64;
    let mut placed = Vec::new();

    'words: for (word, weight) in entries {
        if weight <= 0.0 {
            continue;
        }
        if rs > 0.0 {
            font_size =
                ((rs * (weight / last_weight) + (1.0 - rs)) * font_size as f64).round() as f32;
        }

        let mut vertical = rng.random::<f32>() >= config.prefer_horizontal;
        let mut flipped = false;
        loop {
            if font_size < config.min_font_size {
                debug!("stopping layout at {} placed words", placed.len());
                break 'words;
            }
            let sprite = rasterize(word, font, font_size, MARGIN, vertical);
            if let Some((x, y)) = scan(&sprite, &grid, &mut rng) {
                grid.stamp(&sprite, x, y);
                let region = Region {
                    x: x.max(0) as u32,
                    y: y.max(0) as u32,
                    width: sprite.width,
                    height: sprite.height,
                };
                let color = colors.pick(region, &mut rng);
                placed.push(PlacedWord {
                    text: word.to_string(),
                    font_size,
                    x: x as f32 + sprite.anchor_x,
                    y: y as f32 + sprite.anchor_y,
                    vertical,
                    color,
                });
                last_weight = weight;
                break;
            }
            if !flipped && config.prefer_horizontal < 1.0 {
                vertical = !vertical;
                flipped = true;
            } else {
                font_size -= FONT_STEP;
                flipped = false;
            }
        }
    }

    if placed.is_empty() {
        return Err(Error::Render("could not place any words".into()));
    }
    Ok(placed)
}

/// Walk the spiral from the canvas center until the sprite fits. Returns
/// the sprite's top-left, which the collision test has proven in-bounds.
fn scan(sprite: &WordSprite, grid: &Occupancy, rng: &mut ChaCha8Rng) -> Option<(i32, i32)> {
    let center_x = grid.width as i32 / 2;
    let center_y = grid.height as i32 / 2;
    let dt = if rng.random_bool(0.5) { 1 } else { -1 };

    for (dx, dy) in SpiralScan::new(grid.width as i32, grid.height as i32, dt).take(MAX_SPIRAL_STEPS)
    {
        let x = center_x + dx - sprite.width as i32 / 2;
        let y = center_y + dy - sprite.height as i32 / 2;
        if !grid.collides(sprite, x, y) {
            return Some((x, y));
        }
    }
    None
}
