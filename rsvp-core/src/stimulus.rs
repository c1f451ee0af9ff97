use serde::{Deserialize, Serialize};

/// Render parameters held constant across one stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulusParams {
    /// Item height in degrees of visual angle.
    pub size_deg: f64,
    /// Contrast against the background, in percent.
    pub contrast_pct: f64,
    /// Renderer color on the -1..1 gray scale (0 is mid gray).
    pub color: f64,
}

impl StimulusParams {
    pub fn new(size_deg: f64, contrast_pct: f64, background: f64) -> Self {
        Self {
            size_deg,
            contrast_pct,
            color: contrast_to_color(contrast_pct, background),
        }
    }
}

/// What the participant is asked to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Identification: the target item's label.
    Identity(String),
    /// Detection: whether a target was embedded at all.
    Presence(bool),
}

/// LogMAR to degrees: the letter subtends 5 MAR, `MAR = 10^logmar` arcmin.
pub fn logmar_to_degrees(logmar: f64) -> f64 {
    5.0 * 10f64.powf(logmar) / 60.0
}

/// Contrast percentage to a dark-on-background color value (-1..1 scale).
pub fn contrast_to_color(contrast_pct: f64, background: f64) -> f64 {
    let contrast = contrast_pct / 100.0;
    background - contrast * (1.0 - background)
}

/// `(Lmax - Lmin) / (Lmax + Lmin)`, zero for a black field.
pub fn michelson_contrast(l_max: f64, l_min: f64) -> f64 {
    let sum = l_max + l_min;
    if sum == 0.0 { 0.0 } else { (l_max - l_min) / sum }
}
