//! `"lat,lon"` location strings as stored in the `_location_` field.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Decimal places kept for coordinates derived from geometry
pub const DEFAULT_PLACES: u32 = 6;

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid location \"{0}\", expected \"lat,lon\"")]
pub struct ParseLocationError(pub String);

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round both coordinates to `places` decimals
    pub fn rounded(&self, places: u32) -> Self {
        Self {
            lat: round_to(self.lat, places),
            lon: round_to(self.lon, places),
        }
    }

    /// OpenStreetMap URL centred on this point
    pub fn map_url(&self) -> String {
        format!("https://www.openstreetmap.org/#map=19/{}/{}", self.lat, self.lon)
    }
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Shortest round-trip float text, with a trailing `.0` on whole numbers
///
/// Magnitudes below `1e-4` or from `1e16` up use exponent form with a signed,
/// two-digit exponent (`-5e-05`, `1e+16`).
fn float_text(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_finite() && value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{:e}", value);
        if let Some((mantissa, exponent)) = text.split_once('e') {
            if let Ok(exponent) = exponent.parse::<i32>() {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
            }
        }
        return text;
    }
    let text = format!("{}", value);
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", float_text(self.lat), float_text(self.lon))
    }
}

impl FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLocationError(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lon: f64 = lon.trim().parse().map_err(|_| err())?;
        Ok(Self { lat, lon })
    }
}
