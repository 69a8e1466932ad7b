//! Bounded scalar types used by the GPX model.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, SecondsFormat};
use serde::{Serialize, Serializer};

use crate::error::ValidationError;

/// Bit pattern used for hashing floats, with `-0.0` folded onto `0.0`.
fn float_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::new(field, value, "must be a finite number"))
    }
}

/// Latitude in decimal degrees, within [-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Latitude(f64);

impl Latitude {
    pub fn from_degrees(degrees: f64) -> Result<Self, ValidationError> {
        let degrees = finite("latitude", degrees)?;
        if !(-90.0..=90.0).contains(&degrees) {
            return Err(ValidationError::new(
                "latitude",
                degrees,
                "must be within [-90, 90]",
            ));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl Eq for Latitude {}

impl Hash for Latitude {
    fn hash<H: Hasher>(&self, state: &mut H) {
        float_bits(self.0).hash(state);
    }
}

impl fmt::Display for Latitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longitude in decimal degrees, within [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Longitude(f64);

impl Longitude {
    pub fn from_degrees(degrees: f64) -> Result<Self, ValidationError> {
        let degrees = finite("longitude", degrees)?;
        if !(-180.0..=180.0).contains(&degrees) {
            return Err(ValidationError::new(
                "longitude",
                degrees,
                "must be within [-180, 180]",
            ));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl Eq for Longitude {}

impl Hash for Longitude {
    fn hash<H: Hasher>(&self, state: &mut H) {
        float_bits(self.0).hash(state);
    }
}

impl fmt::Display for Longitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Meter,
    Kilometer,
    Decimeter,
    Centimeter,
    Millimeter,
    Mile,
    NauticalMile,
    Yard,
    Foot,
    Inch,
}

impl LengthUnit {
    /// Size of one unit in meters.
    pub fn meters(self) -> f64 {
        match self {
            Self::Meter => 1.0,
            Self::Kilometer => 1000.0,
            Self::Decimeter => 0.1,
            Self::Centimeter => 0.01,
            Self::Millimeter => 0.001,
            Self::Mile => 1609.344,
            Self::NauticalMile => 1852.0,
            Self::Yard => 0.9144,
            Self::Foot => 0.3048,
            Self::Inch => 0.0254,
        }
    }
}

/// A length with its unit. GPX always carries meters on the wire.
///
/// Two lengths are equal when they denote the same distance in meters, so
/// `1 km == 1000 m`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Length {
    value: f64,
    unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Result<Self, ValidationError> {
        let value = finite("length", value)?;
        let length = Self { value, unit };
        finite("length", length.to_meters())?;
        Ok(length)
    }

    pub fn meters(value: f64) -> Result<Self, ValidationError> {
        Self::new(value, LengthUnit::Meter)
    }

    pub fn value(self) -> f64 {
        self.value
    }

    pub fn unit(self) -> LengthUnit {
        self.unit
    }

    pub fn to_meters(self) -> f64 {
        if self.unit == LengthUnit::Meter {
            self.value
        } else {
            self.value * self.unit.meters()
        }
    }

    /// Magnitude of this length expressed in `unit`.
    pub fn to(self, unit: LengthUnit) -> f64 {
        if unit == self.unit {
            self.value
        } else {
            self.to_meters() / unit.meters()
        }
    }
}

impl PartialEq for Length {
    fn eq(&self, other: &Self) -> bool {
        self.to_meters() == other.to_meters()
    }
}

impl Eq for Length {}

impl Hash for Length {
    fn hash<H: Hasher>(&self, state: &mut H) {
        float_bits(self.to_meters()).hash(state);
    }
}

/// Non-negative integer (`xsd:nonNegativeInteger`), limited to `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UInt(u32);

impl UInt {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < 0 {
            return Err(ValidationError::new("unsigned integer", value, "must not be negative"));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| ValidationError::new("unsigned integer", value, "is too large"))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for UInt {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for UInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Angle in degrees normalized into [0, 360). Used for course and magnetic
/// variation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Degrees(f64);

impl Degrees {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        let value = finite("degrees", value)?;
        let mut normalized = value.rem_euclid(360.0);
        // rem_euclid may round tiny negative inputs up to exactly 360
        if normalized >= 360.0 {
            normalized = 0.0;
        }
        Ok(Self(normalized))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for Degrees {}

impl Hash for Degrees {
    fn hash<H: Hasher>(&self, state: &mut H) {
        float_bits(self.0).hash(state);
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dilution of precision (hdop, vdop, pdop).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Dop(f64);

impl Dop {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        let value = finite("dilution of precision", value)?;
        if value < 0.0 {
            return Err(ValidationError::new(
                "dilution of precision",
                value,
                "must not be negative",
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for Dop {}

impl Hash for Dop {
    fn hash<H: Hasher>(&self, state: &mut H) {
        float_bits(self.0).hash(state);
    }
}

impl fmt::Display for Dop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Elapsed seconds, used for the age of DGPS data.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Seconds(f64);

impl Seconds {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        let value = finite("seconds", value)?;
        if value < 0.0 {
            return Err(ValidationError::new("seconds", value, "must not be negative"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for Seconds {}

impl Hash for Seconds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        float_bits(self.0).hash(state);
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DGPS reference station id, within [0, 1023].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DgpsStation(u16);

impl DgpsStation {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if !(0..=1023).contains(&value) {
            return Err(ValidationError::new(
                "DGPS station",
                value,
                "must be within [0, 1023]",
            ));
        }
        Ok(Self(value as u16))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for DgpsStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// GPS fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Fix {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "2d")]
    Dim2,
    #[serde(rename = "3d")]
    Dim3,
    #[serde(rename = "dgps")]
    Dgps,
    #[serde(rename = "pps")]
    Pps,
}

impl Fix {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Dim2 => "2d",
            Self::Dim3 => "3d",
            Self::Dgps => "dgps",
            Self::Pps => "pps",
        }
    }
}

impl FromStr for Fix {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Self::None),
            "2d" => Ok(Self::Dim2),
            "3d" => Ok(Self::Dim3),
            "dgps" => Ok(Self::Dgps),
            "pps" => Ok(Self::Pps),
            other => Err(ValidationError::new(
                "fix",
                other,
                "must be one of none, 2d, 3d, dgps, pps",
            )),
        }
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in time with an explicit UTC offset.
///
/// Displays as RFC 3339: `Z` for a zero offset, fractional seconds only when
/// non-zero. Equality compares both the instant and the offset.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// The local year must fit four digits and the offset must be whole
    /// minutes.
    pub fn new(time: DateTime<FixedOffset>) -> Result<Self, ValidationError> {
        if time.offset().local_minus_utc() % 60 != 0 {
            return Err(ValidationError::new(
                "timestamp",
                time,
                "UTC offset must be a whole number of minutes",
            ));
        }
        if !(0..=9999).contains(&time.year()) {
            return Err(ValidationError::new(
                "timestamp",
                time,
                "year must be within [0, 9999]",
            ));
        }
        Ok(Self(time))
    }

    /// Parse RFC 3339. A value without zone designator is taken as UTC.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let time = match DateTime::parse_from_rfc3339(s) {
            Ok(time) => time,
            Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()?
                .and_utc()
                .fixed_offset(),
        };
        Self::new(time).ok()
    }

    pub fn date_time(self) -> DateTime<FixedOffset> {
        self.0
    }

    fn key(&self) -> (i64, u32, i32) {
        (
            self.0.timestamp(),
            self.0.timestamp_subsec_nanos(),
            self.0.offset().local_minus_utc(),
        )
    }
}

impl TryFrom<DateTime<FixedOffset>> for Timestamp {
    type Error = ValidationError;

    fn try_from(time: DateTime<FixedOffset>) -> Result<Self, Self::Error> {
        Self::new(time)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// E-mail address split into id and domain, as GPX stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Email {
    id: String,
    domain: String,
}

impl Email {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let domain = domain.into();
        if id.is_empty() {
            return Err(ValidationError::new("email id", id, "must not be empty"));
        }
        if domain.is_empty() {
            return Err(ValidationError::new("email domain", domain, "must not be empty"));
        }
        Ok(Self { id, domain })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((id, domain)) => Self::new(id, domain),
            None => Err(ValidationError::new("email", s, "must have the form id@domain")),
        }
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.domain)
    }
}
