use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, Vector3};

use crate::error::GncError;

// ---------------------------------------------------------------------------
// Reference frames
// ---------------------------------------------------------------------------

/// The four frames of the Inertial, Geographic, Velocity, Body chain.
///
/// Declaration order is chain order; [`Frame::depth`] is the number of links
/// between the frame and Inertial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frame {
    Inertial,
    Geographic,
    Velocity,
    Body,
}

/// Rotation tensors relating adjacent frames at one instant.
///
/// Each tensor maps components in the parent frame (the one closer to
/// Inertial) into components in the child frame, e.g. `v_g = tgi * v_i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub tbv: Matrix3<f64>, // body / velocity
    pub tvg: Matrix3<f64>, // velocity / geographic
    pub tgi: Matrix3<f64>, // geographic / inertial
}

impl Orientation {
    /// Bundle for a point mass: body and velocity frames coincide with geographic.
    pub fn geographic_only(tgi: Matrix3<f64>) -> Self {
        Orientation {
            tbv: Matrix3::identity(),
            tvg: Matrix3::identity(),
            tgi,
        }
    }

    /// Links in chain order; link `i` joins depth `i` to depth `i + 1`.
    fn links(&self) -> [&Matrix3<f64>; 3] {
        [&self.tgi, &self.tvg, &self.tbv]
    }
}

impl Frame {
    pub const ALL: [Frame; 4] = [Frame::Inertial, Frame::Geographic, Frame::Velocity, Frame::Body];

    pub fn depth(self) -> usize {
        self as usize
    }

    /// Express `v`, given in `self`, in frame `to`.
    ///
    /// Every link strictly between the two frames is applied once: forward
    /// when moving away from Inertial, transposed when moving towards it.
    pub fn convert(self, to: Frame, orientation: &Orientation, v: &Vector3<f64>) -> Vector3<f64> {
        let (from, to) = (self.depth(), to.depth());
        let links = orientation.links();
        if from <= to {
            links[from..to].iter().fold(*v, |acc, t| *t * acc)
        } else {
            links[to..from].iter().rev().fold(*v, |acc, t| t.tr_mul(&acc))
        }
    }

    pub fn to_inertial(self, orientation: &Orientation, v: &Vector3<f64>) -> Vector3<f64> {
        self.convert(Frame::Inertial, orientation, v)
    }

    pub fn to_geographic(self, orientation: &Orientation, v: &Vector3<f64>) -> Vector3<f64> {
        self.convert(Frame::Geographic, orientation, v)
    }

    pub fn to_velocity(self, orientation: &Orientation, v: &Vector3<f64>) -> Vector3<f64> {
        self.convert(Frame::Velocity, orientation, v)
    }

    pub fn to_body(self, orientation: &Orientation, v: &Vector3<f64>) -> Vector3<f64> {
        self.convert(Frame::Body, orientation, v)
    }

    pub fn tag(self) -> char {
        match self {
            Frame::Inertial => 'I',
            Frame::Geographic => 'G',
            Frame::Velocity => 'V',
            Frame::Body => 'B',
        }
    }
}

impl TryFrom<char> for Frame {
    type Error = GncError;

    fn try_from(tag: char) -> Result<Self, Self::Error> {
        match tag.to_ascii_uppercase() {
            'I' => Ok(Frame::Inertial),
            'G' => Ok(Frame::Geographic),
            'V' => Ok(Frame::Velocity),
            'B' => Ok(Frame::Body),
            _ => Err(GncError::UnknownFrame(tag.to_string())),
        }
    }
}

impl FromStr for Frame {
    type Err = GncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inertial" => Ok(Frame::Inertial),
            "geographic" => Ok(Frame::Geographic),
            "velocity" => Ok(Frame::Velocity),
            "body" => Ok(Frame::Body),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(tag), None) => Frame::try_from(tag),
                    _ => Err(GncError::UnknownFrame(s.to_string())),
                }
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// Geographic direction helpers
// ---------------------------------------------------------------------------

/// Geographic vector (X North, Y East, Z Down) of length `norm`.
///
/// `elevation` is the angle above the horizon (pi/2 straight up), `bearing`
/// the heading clockwise from North (pi/2 East).
pub fn geographic_from_elevation_bearing(elevation: f64, bearing: f64, norm: f64) -> Vector3<f64> {
    let (sin_e, cos_e) = elevation.sin_cos();
    let (sin_b, cos_b) = bearing.sin_cos();
    norm * Vector3::new(cos_b * cos_e, sin_b * cos_e, -sin_e)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
