//! Static gradient palette for the card's info panel.

use serde::Serialize;

pub const DEFAULT_GRADIENT_ID: &str = "ocean_depth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(lerp(self.0, other.0), lerp(self.1, other.1), lerp(self.2, other.2))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    /// Position along the gradient line, `0.0..=1.0`.
    pub position: f32,
    pub color: Rgb,
}

/// A gradient running from the top-left corner to the bottom-right corner.
#[derive(Debug)]
pub struct GradientTheme {
    pub id: &'static str,
    pub label: &'static str,
    pub stops: [ColorStop; 3],
}

impl GradientTheme {
    /// Color at `t` along the gradient line. Stops are sorted by position.
    pub fn color_at(&self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let first = self.stops[0];
        if t <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if t <= to.position {
                let span = (to.position - from.position).max(f32::EPSILON);
                return from.color.mix(to.color, (t - from.position) / span);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

const fn three_stop(from: Rgb, via: Rgb, to: Rgb) -> [ColorStop; 3] {
    [
        ColorStop { position: 0.0, color: from },
        ColorStop { position: 0.5, color: via },
        ColorStop { position: 1.0, color: to },
    ]
}

pub static GRADIENTS: [GradientTheme; 6] = [
    GradientTheme {
        id: "ocean_depth",
        label: "Ocean Depth",
        stops: three_stop(Rgb(0x1e, 0x3a, 0x8a), Rgb(0x1d, 0x4e, 0xd8), Rgb(0x06, 0xb6, 0xd4)),
    },
    GradientTheme {
        id: "forest_mist",
        label: "Forest Mist",
        stops: three_stop(Rgb(0x06, 0x4e, 0x3b), Rgb(0x0f, 0x76, 0x6e), Rgb(0x4a, 0xde, 0x80)),
    },
    GradientTheme {
        id: "sunset_amber",
        label: "Sunset Amber",
        stops: three_stop(Rgb(0x9a, 0x34, 0x12), Rgb(0xd9, 0x77, 0x06), Rgb(0xfa, 0xcc, 0x15)),
    },
    GradientTheme {
        id: "midnight_sky",
        label: "Midnight Sky",
        stops: three_stop(Rgb(0x0f, 0x17, 0x2a), Rgb(0x1e, 0x3a, 0x8a), Rgb(0x37, 0x30, 0xa3)),
    },
    GradientTheme {
        id: "autumn_leaves",
        label: "Autumn Leaves",
        stops: three_stop(Rgb(0x7f, 0x1d, 0x1d), Rgb(0xc2, 0x41, 0x0c), Rgb(0xf5, 0x9e, 0x0b)),
    },
    GradientTheme {
        id: "arctic_ice",
        label: "Arctic Ice",
        stops: three_stop(Rgb(0x33, 0x41, 0x55), Rgb(0x08, 0x91, 0xb2), Rgb(0x38, 0xbd, 0xf8)),
    },
];

pub fn find_gradient(id: &str) -> Option<&'static GradientTheme> {
    GRADIENTS.iter().find(|g| g.id == id)
}

/// The theme for `id`, or the default theme when `id` is unknown.
pub fn gradient_or_default(id: &str) -> &'static GradientTheme {
    find_gradient(id).unwrap_or(&GRADIENTS[0])
}

/// API view of a theme.
#[derive(Debug, Serialize)]
pub struct GradientView {
    pub id: &'static str,
    pub label: &'static str,
    pub stops: Vec<String>,
}

impl From<&'static GradientTheme> for GradientView {
    fn from(theme: &'static GradientTheme) -> Self {
        GradientView {
            id: theme.id,
            label: theme.label,
            stops: theme.stops.iter().map(|s| s.color.to_hex()).collect(),
        }
    }
}
