//! Word coloring.
//!
//! A [`ColorFunc`] is a tagged variant over the three configured modes:
//! a named colormap gradient, a seeded random-lightness HSL function, and
//! a sampler that averages the mask image's own pixels under each word.

use crate::config::{ColorMode, Config};
use crate::mask::MaskImage;
use image::RgbaImage;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

/// Canvas-space bounding box of a placed word.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Colormap palettes
// =============================================================================

/// A named gradient as an ordered list of RGB anchors; sampling linearly
/// interpolates between adjacent anchors.
#[derive(Debug, Clone)]
pub struct Palette {
    anchors: &'static [[u8; 3]],
}

const PLASMA: &[[u8; 3]] = &[
    [13, 8, 135],
    [126, 3, 168],
    [204, 71, 120],
    [248, 149, 64],
    [240, 249, 33],
];
const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];
const INFERNO: &[[u8; 3]] = &[
    [0, 0, 4],
    [87, 16, 110],
    [188, 55, 84],
    [249, 142, 9],
    [252, 255, 164],
];
const MAGMA: &[[u8; 3]] = &[
    [0, 0, 4],
    [81, 18, 124],
    [183, 55, 121],
    [252, 137, 97],
    [252, 253, 191],
];
const CIVIDIS: &[[u8; 3]] = &[
    [0, 32, 76],
    [68, 79, 133],
    [124, 123, 120],
    [187, 175, 113],
    [255, 234, 70],
];
const COOL: &[[u8; 3]] = &[[0, 255, 255], [128, 128, 255], [255, 0, 255]];
const AUTUMN: &[[u8; 3]] = &[[255, 0, 0], [255, 128, 0], [255, 255, 0]];

impl Palette {
    /// Look up a palette by its matplotlib-style name.
    pub fn named(name: &str) -> Option<Self> {
        let anchors = match name {
            "plasma" => PLASMA,
            "viridis" => VIRIDIS,
            "inferno" => INFERNO,
            "magma" => MAGMA,
            "cividis" => CIVIDIS,
            "cool" => COOL,
            "autumn" => AUTUMN,
            _ => return None,
        };
        Some(Self { anchors })
    }

    /// `named`, warning and falling back to plasma on an unknown name.
    pub fn named_or_default(name: &str) -> Self {
        Self::named(name).unwrap_or_else(|| {
            warn!("unknown colormap {name:?}, falling back to plasma");
            Self { anchors: PLASMA }
        })
    }

    /// Sample the gradient at `t` in `[0, 1]`.
    pub fn sample(&self, t: f32) -> String {
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (self.anchors.len() - 1) as f32;
        let i = (scaled.floor() as usize).min(self.anchors.len() - 2);
        let frac = scaled - i as f32;
        let lo = self.anchors[i];
        let hi = self.anchors[i + 1];
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * frac).round() as u8;
        hex_color([lerp(lo[0], hi[0]), lerp(lo[1], hi[1]), lerp(lo[2], hi[2])])
    }
}

// =============================================================================
// Image sampler
// =============================================================================

/// Colors words from the mask image's pixels: the average RGB of the
/// opaque pixels under the word's bounding box.
#[derive(Debug, Clone)]
pub struct ImageSampler {
    pixels: RgbaImage,
}

impl ImageSampler {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn average(&self, region: Region) -> String {
        let (iw, ih) = self.pixels.dimensions();
        let x1 = region.x.min(iw);
        let y1 = region.y.min(ih);
        let x2 = (region.x + region.width.max(1)).min(iw);
        let y2 = (region.y + region.height.max(1)).min(ih);

        let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
        for y in y1..y2 {
            for x in x1..x2 {
                let p = self.pixels.get_pixel(x, y).0;
                if p[3] > 0 {
                    r += p[0] as u64;
                    g += p[1] as u64;
                    b += p[2] as u64;
                    n += 1;
                }
            }
        }
        if n == 0 {
            return hex_color([0, 0, 0]);
        }
        hex_color([(r / n) as u8, (g / n) as u8, (b / n) as u8])
    }
}

// =============================================================================
// Color function
// =============================================================================

/// Per-word color source, chosen by `color_mode`.
pub enum ColorFunc {
    /// Sample a named gradient at a random position.
    Colormap(Palette),
    /// Fixed hue and saturation, lightness drawn uniformly from a range.
    Hsl {
        hue: f32,
        saturation: f32,
        lightness_range: [f32; 2],
    },
    /// Average the mask image's pixels under the word.
    Image(ImageSampler),
}

impl ColorFunc {
    /// Build the color function for a config, enforcing the consistency
    /// invariant: `image_colors` without a loaded mask degrades to the
    /// configured colormap.
    pub fn from_config(config: &Config, mask: Option<&MaskImage>) -> Self {
        match config.color_mode {
            ColorMode::CustomColors => {
                let cc = &config.custom_colors;
                let lo = cc.lightness_range[0].clamp(0.0, 100.0);
                let hi = cc.lightness_range[1].clamp(lo, 100.0);
                ColorFunc::Hsl {
                    hue: cc.hue.rem_euclid(360.0),
                    saturation: cc.saturation.clamp(0.0, 100.0),
                    lightness_range: [lo, hi],
                }
            }
            ColorMode::ImageColors => match mask {
                Some(mask) => ColorFunc::Image(mask.sampler()),
                None => {
                    warn!("color_mode is image_colors but no mask is loaded, using colormap");
                    ColorFunc::Colormap(Palette::named_or_default(&config.colormap))
                }
            },
            ColorMode::Colormap => ColorFunc::Colormap(Palette::named_or_default(&config.colormap)),
        }
    }

    /// Produce a hex color for one placed word. Randomness comes from the
    /// layout's seeded RNG, so a fixed `random_state` reproduces colors.
    pub fn pick(&self, region: Region, rng: &mut ChaCha8Rng) -> String {
        match self {
            ColorFunc::Colormap(palette) => palette.sample(rng.random::<f32>()),
            ColorFunc::Hsl {
                hue,
                saturation,
                lightness_range: [lo, hi],
            } => {
                let lightness = rng.random_range(*lo..=*hi);
                hex_color(hsl_to_rgb(*hue, saturation / 100.0, lightness / 100.0))
            }
            ColorFunc::Image(sampler) => sampler.average(region),
        }
    }
}

/// HSL to RGB. Hue in degrees, saturation and lightness in `[0, 1]`.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if (0.0..60.0).contains(&h) {
        (c, x, 0.0)
    } else if (60.0..120.0).contains(&h) {
        (x, c, 0.0)
    } else if (120.0..180.0).contains(&h) {
        (0.0, c, x)
    } else if (180.0..240.0).contains(&h) {
        (0.0, x, c)
    } else if (240.0..300.0).contains(&h) {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

fn hex_color([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn region() -> Region {
        Region {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), [255, 255, 255]);
        assert_eq!(hsl_to_rgb(0.0, 0.0, 0.0), [0, 0, 0]);
    }

    #[test]
    fn palette_endpoints() {
        let p = Palette::named("plasma").unwrap();
        assert_eq!(p.sample(0.0), "#0d0887");
        assert_eq!(p.sample(1.0), "#f0f921");
    }

    #[test]
    fn unknown_palette_falls_back() {
        let p = Palette::named_or_default("nope");
        assert_eq!(p.sample(0.0), "#0d0887");
        assert!(Palette::named("nope").is_none());
    }

    #[test]
    fn hsl_pick_is_seed_reproducible() {
        let f = ColorFunc::Hsl {
            hue: 200.0,
            saturation: 80.0,
            lightness_range: [40.0, 80.0],
        };
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            assert_eq!(f.pick(region(), &mut a), f.pick(region(), &mut b));
        }
    }

    fn parse_hex(s: &str) -> [f32; 3] {
        let v = |i| u8::from_str_radix(&s[i..i + 2], 16).unwrap() as f32 / 255.0;
        [v(1), v(3), v(5)]
    }

    /// Inverse of `hsl_to_rgb`, up to 8-bit quantization.
    fn rgb_to_hsl([r, g, b]: [f32; 3]) -> (f32, f32, f32) {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d == 0.0 {
            return (0.0, 0.0, l);
        }
        let s = d / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / d + 2.0)
        } else {
            60.0 * ((r - g) / d + 4.0)
        };
        (h, s, l)
    }

    #[test]
    fn hsl_pick_keeps_hue_and_saturation_with_lightness_in_range() {
        let f = ColorFunc::Hsl {
            hue: 200.0,
            saturation: 80.0,
            lightness_range: [40.0, 80.0],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            let hex = f.pick(region(), &mut rng);
            let (h, s, l) = rgb_to_hsl(parse_hex(&hex));
            assert!((h - 200.0).abs() < 2.0, "hue {h} from {hex}");
            assert!((s - 0.8).abs() < 0.03, "saturation {s} from {hex}");
            assert!((0.39..=0.81).contains(&l), "lightness {l} from {hex}");
        }
    }

    #[test]
    fn hsl_pick_with_degenerate_range_is_exact() {
        let f = ColorFunc::Hsl {
            hue: 30.0,
            saturation: 80.0,
            lightness_range: [50.0, 50.0],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let expected = {
            let [r, g, b] = hsl_to_rgb(30.0, 0.8, 0.5);
            format!("#{r:02x}{g:02x}{b:02x}")
        };
        for _ in 0..10 {
            assert_eq!(f.pick(region(), &mut rng), expected);
        }
    }

    #[test]
    fn image_sampler_averages_uniform_region() {
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([10, 200, 30, 255]));
        let sampler = ImageSampler::new(img);
        assert_eq!(sampler.average(region()), "#0ac81e");
    }

    #[test]
    fn image_sampler_ignores_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        let sampler = ImageSampler::new(img);
        assert_eq!(sampler.average(region()), "#ff0000");
    }

    #[test]
    fn fully_transparent_region_is_black() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 0]));
        let sampler = ImageSampler::new(img);
        assert_eq!(sampler.average(region()), "#000000");
    }
}
