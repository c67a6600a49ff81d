//! Coordinate reference systems and the geographic → UTM projection.
//!
//! Only what the cost matrix needs is supported: geographic WGS84 input is
//! projected onto a UTM zone with the transverse Mercator series on the WGS84
//! ellipsoid. Anything else is a [`ProjectionError`] and callers fall back to
//! the source coordinates.

use geo::Coord;
use map_3d::Ellipsoid;
use std::fmt;
use std::str::FromStr;

const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const UTM_MIN_LAT: f64 = -80.0;
const UTM_MAX_LAT: f64 = 84.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("source reference system is unknown")]
    MissingSource,

    #[error("unsupported reprojection from {from} to {to}")]
    Unsupported { from: Crs, to: Crs },

    #[error("coordinate ({x}, {y}) is outside the valid range of {crs}")]
    OutOfRange { x: f64, y: f64, crs: Crs },
}

/// Coordinate reference system, identified by its EPSG code
#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// Geographic WGS84, x = longitude, y = latitude (EPSG:4326)
    Wgs84,
    /// UTM zone on WGS84, metres (EPSG:326zz north, EPSG:327zz south)
    Utm { zone: u8, north: bool },
    /// Anything else; carried along for messages only
    Other(String),
}

impl Crs {
    /// UTM zone 33N, the metric reference used for Berlin-area studies.
    pub fn utm_33n() -> Self {
        Crs::Utm {
            zone: 33,
            north: true,
        }
    }

    /// Whether coordinates in this system are metres
    pub fn is_metric(&self) -> bool {
        matches!(self, Crs::Utm { .. })
    }

    /// Parses `EPSG:<code>` (case-insensitive) or `WGS84`. Unknown codes become [`Crs::Other`].
    pub fn from_code(s: &str) -> Self {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper == "WGS84" {
            return Crs::Wgs84;
        }

        let code = upper
            .strip_prefix("EPSG:")
            .and_then(|c| c.parse::<u32>().ok());
        match code {
            Some(4326) => Crs::Wgs84,
            Some(c @ 32601..=32660) => Crs::Utm {
                zone: (c - 32600) as u8,
                north: true,
            },
            Some(c @ 32701..=32760) => Crs::Utm {
                zone: (c - 32700) as u8,
                north: false,
            },
            _ => Crs::Other(trimmed.to_string()),
        }
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::utm_33n()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Wgs84 => write!(f, "EPSG:4326"),
            Crs::Utm { zone, north: true } => write!(f, "EPSG:326{:02}", zone),
            Crs::Utm { zone, north: false } => write!(f, "EPSG:327{:02}", zone),
            Crs::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Crs {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Crs::from_code(s))
    }
}

#[derive(Debug, Clone, Copy)]
enum Transform {
    Identity,
    GeographicToUtm { zone: u8, north: bool },
}

/// Point transform between two reference systems
#[derive(Debug, Clone)]
pub struct Projector {
    target: Crs,
    transform: Transform,
}

impl Projector {
    pub fn new(source: Option<&Crs>, target: &Crs) -> Result<Self, ProjectionError> {
        let source = source.ok_or(ProjectionError::MissingSource)?;
        let transform = match (source, target) {
            (Crs::Other(_), _) | (_, Crs::Other(_)) => {
                return Err(ProjectionError::Unsupported {
                    from: source.clone(),
                    to: target.clone(),
                })
            }
            (s, t) if s == t => Transform::Identity,
            (Crs::Wgs84, Crs::Utm { zone, north }) => Transform::GeographicToUtm {
                zone: *zone,
                north: *north,
            },
            _ => {
                return Err(ProjectionError::Unsupported {
                    from: source.clone(),
                    to: target.clone(),
                })
            }
        };
        Ok(Self {
            target: target.clone(),
            transform,
        })
    }

    pub fn target(&self) -> &Crs {
        &self.target
    }

    pub fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        match self.transform {
            Transform::Identity => Ok(coord),
            Transform::GeographicToUtm { zone, north } => utm_forward(coord, zone, north)
                .ok_or(ProjectionError::OutOfRange {
                    x: coord.x,
                    y: coord.y,
                    crs: Crs::Wgs84,
                }),
        }
    }
}

fn central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Transverse Mercator forward projection (Snyder, USGS PP 1395, eq. 8-9 to 8-11).
/// `coord` is (longitude, latitude) in degrees.
fn utm_forward(coord: Coord<f64>, zone: u8, north: bool) -> Option<Coord<f64>> {
    let (lon, lat) = (coord.x, coord.y);
    if !lon.is_finite() || !lat.is_finite() || !(UTM_MIN_LAT..=UTM_MAX_LAT).contains(&lat) {
        return None;
    }
    if !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    let (major, _, _, e2) = Ellipsoid::WGS84.parameters();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let phi = lat.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = major / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = cos_phi * (lon - central_meridian(zone)).to_radians();

    let m = major
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let easting = UTM_K0
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
        + UTM_FALSE_EASTING;

    let mut northing = UTM_K0
        * (m + n
            * tan_phi
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
    if !north {
        northing += UTM_FALSE_NORTHING_SOUTH;
    }

    Some(Coord {
        x: easting,
        y: northing,
    })
}
