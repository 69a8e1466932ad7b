use std::slice;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;

use crate::error::ValidationError;
use crate::values::*;

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, value, "must not be blank"))
    } else {
        Ok(value)
    }
}

/// Read-only view over an ordered child sequence.
///
/// The view is `Copy`; every call to [`Seq::iter`] (or every `for` loop over
/// it) starts a fresh traversal from the first element.
#[derive(Debug)]
pub struct Seq<'a, T> {
    items: &'a [T],
}

impl<T> Clone for Seq<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Seq<'_, T> {}

impl<'a, T> Seq<'a, T> {
    fn new(items: &'a [T]) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> slice::Iter<'a, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&'a T> {
        self.items.first()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.items
    }
}

impl<'a, T> IntoIterator for Seq<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &Seq<'a, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// One unknown element captured verbatim, tagged with its qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExtensionNode {
    name: String,
    xml: String,
}

impl ExtensionNode {
    /// `xml` must be the complete serialized element named `name`.
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Result<Self, ValidationError> {
        let name = required("extension name", name.into())?;
        let xml = xml.into();
        let opens_with_name = xml
            .strip_prefix('<')
            .and_then(|rest| rest.strip_prefix(name.as_str()))
            .is_some_and(|rest| rest.starts_with(['>', '/', ' ', '\t', '\r', '\n']));
        if !opens_with_name {
            return Err(ValidationError::new(
                "extension",
                xml,
                "must start with the element's own start tag",
            ));
        }
        if let Err(reason) = single_element(&xml) {
            return Err(ValidationError::new("extension", xml, reason));
        }
        Ok(Self { name, xml })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Checks that `xml` holds exactly one complete element, optionally followed
/// by whitespace or comments.
fn single_element(xml: &str) -> Result<(), &'static str> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut closed = false;
    loop {
        let event = reader.read_event().map_err(|_| "must be well-formed XML")?;
        match event {
            Event::Start(_) if closed => return Err("must contain a single root element"),
            Event::Empty(_) if closed => return Err("must contain a single root element"),
            Event::Start(_) => depth += 1,
            Event::Empty(_) => closed = depth == 0,
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or("must be well-formed XML")?;
                closed = depth == 0;
            }
            Event::Text(e) if closed && !e.iter().all(u8::is_ascii_whitespace) => {
                return Err("must not have content after the element");
            }
            Event::CData(_) | Event::GeneralRef(_) if closed => {
                return Err("must not have content after the element");
            }
            Event::Decl(_) | Event::DocType(_) => return Err("must be an element, not a document"),
            Event::Eof if closed => return Ok(()),
            Event::Eof => return Err("must close every element it opens"),
            _ => {}
        }
    }
}

/// Producer-specific content of an `<extensions>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Extensions {
    nodes: Vec<ExtensionNode>,
}

impl Extensions {
    pub fn new(nodes: Vec<ExtensionNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> Seq<'_, ExtensionNode> {
        Seq::new(&self.nodes)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push(&mut self, node: ExtensionNode) {
        self.nodes.push(node);
    }
}

/// A GPX link element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    href: String,
    text: Option<String>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with(href, None, None)
    }

    pub fn with(
        href: impl Into<String>,
        text: Option<String>,
        mime_type: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            href: required("link href", href.into())?,
            text,
            mime_type,
        })
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// A person or organization (`<author>` in metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Person {
    name: Option<String>,
    email: Option<Email>,
    link: Option<Link>,
}

impl Person {
    pub fn new(name: Option<String>, email: Option<Email>, link: Option<Link>) -> Self {
        Self { name, email, link }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.link.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Copyright {
    author: String,
    year: Option<i32>,
    license: Option<String>,
}

impl Copyright {
    pub fn new(
        author: impl Into<String>,
        year: Option<i32>,
        license: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            author: required("copyright author", author.into())?,
            year,
            license,
        })
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }
}

/// Bounding box. Degenerate or inverted boxes are stored as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Bounds {
    min_lat: Latitude,
    min_lon: Longitude,
    max_lat: Latitude,
    max_lon: Longitude,
}

impl Bounds {
    pub fn new(min_lat: Latitude, min_lon: Longitude, max_lat: Latitude, max_lon: Longitude) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    pub fn min_lat(&self) -> Latitude {
        self.min_lat
    }

    pub fn min_lon(&self) -> Longitude {
        self.min_lon
    }

    pub fn max_lat(&self) -> Latitude {
        self.max_lat
    }

    pub fn max_lon(&self) -> Longitude {
        self.max_lon
    }
}

/// Optional parts of a [`WayPoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct WayPointFields {
    pub elevation: Option<Length>,
    pub time: Option<Timestamp>,
    pub magnetic_variation: Option<Degrees>,
    pub geoid_height: Option<Length>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub links: Vec<Link>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub fix: Option<Fix>,
    pub sat: Option<UInt>,
    pub hdop: Option<Dop>,
    pub vdop: Option<Dop>,
    pub pdop: Option<Dop>,
    pub age_of_dgps_data: Option<Seconds>,
    pub dgps_id: Option<DgpsStation>,
    pub course: Option<Degrees>,
    pub extensions: Option<Extensions>,
}

/// A single point (used for wpt, rtept, trkpt).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WayPoint {
    latitude: Latitude,
    longitude: Longitude,
    #[serde(flatten)]
    fields: WayPointFields,
}

impl WayPoint {
    pub fn new(latitude: Latitude, longitude: Longitude) -> Self {
        Self::with_fields(latitude, longitude, WayPointFields::default())
    }

    pub fn with_fields(latitude: Latitude, longitude: Longitude, fields: WayPointFields) -> Self {
        Self {
            latitude,
            longitude,
            fields,
        }
    }

    /// Point from raw degrees, validating both coordinates.
    pub fn of(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Ok(Self::new(
            Latitude::from_degrees(latitude)?,
            Longitude::from_degrees(longitude)?,
        ))
    }

    pub fn latitude(&self) -> Latitude {
        self.latitude
    }

    pub fn longitude(&self) -> Longitude {
        self.longitude
    }

    pub fn fields(&self) -> &WayPointFields {
        &self.fields
    }

    pub fn elevation(&self) -> Option<Length> {
        self.fields.elevation
    }

    pub fn time(&self) -> Option<Timestamp> {
        self.fields.time
    }

    pub fn magnetic_variation(&self) -> Option<Degrees> {
        self.fields.magnetic_variation
    }

    pub fn geoid_height(&self) -> Option<Length> {
        self.fields.geoid_height
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.fields.comment.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.fields.source.as_deref()
    }

    pub fn links(&self) -> Seq<'_, Link> {
        Seq::new(&self.fields.links)
    }

    pub fn symbol(&self) -> Option<&str> {
        self.fields.symbol.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields.kind.as_deref()
    }

    pub fn fix(&self) -> Option<Fix> {
        self.fields.fix
    }

    pub fn sat(&self) -> Option<UInt> {
        self.fields.sat
    }

    pub fn hdop(&self) -> Option<Dop> {
        self.fields.hdop
    }

    pub fn vdop(&self) -> Option<Dop> {
        self.fields.vdop
    }

    pub fn pdop(&self) -> Option<Dop> {
        self.fields.pdop
    }

    pub fn age_of_dgps_data(&self) -> Option<Seconds> {
        self.fields.age_of_dgps_data
    }

    pub fn dgps_id(&self) -> Option<DgpsStation> {
        self.fields.dgps_id
    }

    pub fn course(&self) -> Option<Degrees> {
        self.fields.course
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.fields.extensions.as_ref()
    }

    /// True when nothing but the coordinates is set.
    pub fn is_bare(&self) -> bool {
        self.fields == WayPointFields::default()
    }
}

/// Descriptive fields shared by routes and tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PathFields {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub links: Vec<Link>,
    pub number: Option<UInt>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub extensions: Option<Extensions>,
}

/// A GPX route (<rte>).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    #[serde(flatten)]
    fields: PathFields,
    points: Vec<WayPoint>,
}

impl Route {
    pub fn new(fields: PathFields, points: Vec<WayPoint>) -> Self {
        Self { fields, points }
    }

    pub fn fields(&self) -> &PathFields {
        &self.fields
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.fields.comment.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.fields.source.as_deref()
    }

    pub fn links(&self) -> Seq<'_, Link> {
        Seq::new(&self.fields.links)
    }

    pub fn number(&self) -> Option<UInt> {
        self.fields.number
    }

    /// Classification (`<type>`).
    pub fn kind(&self) -> Option<&str> {
        self.fields.kind.as_deref()
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.fields.extensions.as_ref()
    }

    pub fn points(&self) -> Seq<'_, WayPoint> {
        Seq::new(&self.points)
    }
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TrackSegment {
    points: Vec<WayPoint>,
    extensions: Option<Extensions>,
}

impl TrackSegment {
    pub fn new(points: Vec<WayPoint>, extensions: Option<Extensions>) -> Self {
        Self { points, extensions }
    }

    pub fn points(&self) -> Seq<'_, WayPoint> {
        Seq::new(&self.points)
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.extensions.as_ref()
    }
}

/// A GPX track (<trk>).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Track {
    #[serde(flatten)]
    fields: PathFields,
    segments: Vec<TrackSegment>,
}

impl Track {
    pub fn new(fields: PathFields, segments: Vec<TrackSegment>) -> Self {
        Self { fields, segments }
    }

    pub fn fields(&self) -> &PathFields {
        &self.fields
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.fields.comment.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.fields.source.as_deref()
    }

    pub fn links(&self) -> Seq<'_, Link> {
        Seq::new(&self.fields.links)
    }

    pub fn number(&self) -> Option<UInt> {
        self.fields.number
    }

    /// Classification (`<type>`).
    pub fn kind(&self) -> Option<&str> {
        self.fields.kind.as_deref()
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.fields.extensions.as_ref()
    }

    pub fn segments(&self) -> Seq<'_, TrackSegment> {
        Seq::new(&self.segments)
    }

    /// All points of all segments, in order.
    pub fn points(&self) -> impl Iterator<Item = &WayPoint> {
        self.segments.iter().flat_map(|segment| segment.points.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct MetadataFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<Person>,
    pub copyright: Option<Copyright>,
    pub links: Vec<Link>,
    pub time: Option<Timestamp>,
    pub keywords: Option<String>,
    pub bounds: Option<Bounds>,
    pub extensions: Option<Extensions>,
}

/// Document level information (<metadata>).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Metadata {
    #[serde(flatten)]
    fields: MetadataFields,
}

impl Metadata {
    pub fn new(fields: MetadataFields) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &MetadataFields {
        &self.fields
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    pub fn author(&self) -> Option<&Person> {
        self.fields.author.as_ref()
    }

    pub fn copyright(&self) -> Option<&Copyright> {
        self.fields.copyright.as_ref()
    }

    pub fn links(&self) -> Seq<'_, Link> {
        Seq::new(&self.fields.links)
    }

    pub fn time(&self) -> Option<Timestamp> {
        self.fields.time
    }

    pub fn keywords(&self) -> Option<&str> {
        self.fields.keywords.as_deref()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.fields.bounds
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.fields.extensions.as_ref()
    }
}

/// Namespace declaration (`xmlns:prefix="uri"`) kept from the root element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Namespace {
    prefix: String,
    uri: String,
}

/// Prefixes the writer declares itself or that XML reserves.
const RESERVED_PREFIXES: [&str; 3] = ["xml", "xmlns", "xsi"];

impl Namespace {
    /// `prefix` must be an XML name without a colon and must not be one of
    /// `xml`, `xmlns` or `xsi`; `uri` must not be blank.
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        let mut chars = prefix.chars();
        let name_like = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !name_like {
            return Err(ValidationError::new(
                "namespace prefix",
                prefix,
                "must be an XML name without a colon",
            ));
        }
        if RESERVED_PREFIXES.contains(&prefix.as_str()) {
            return Err(ValidationError::new("namespace prefix", prefix, "is reserved"));
        }
        Ok(Self {
            prefix,
            uri: required("namespace uri", uri.into())?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct GpxFields {
    pub metadata: Option<Metadata>,
    pub waypoints: Vec<WayPoint>,
    pub routes: Vec<Route>,
    pub tracks: Vec<Track>,
    pub extensions: Option<Extensions>,
    pub namespaces: Vec<Namespace>,
}

/// Parsed GPX document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Gpx {
    creator: String,
    version: String,
    #[serde(flatten)]
    fields: GpxFields,
}

impl Gpx {
    pub fn new(
        creator: impl Into<String>,
        version: impl Into<String>,
        fields: GpxFields,
    ) -> Result<Self, ValidationError> {
        for (i, namespace) in fields.namespaces.iter().enumerate() {
            if fields.namespaces[..i].iter().any(|n| n.prefix == namespace.prefix) {
                return Err(ValidationError::new(
                    "namespace prefix",
                    &namespace.prefix,
                    "is declared more than once",
                ));
            }
        }
        Ok(Self {
            creator: required("creator", creator.into())?,
            version: required("version", version.into())?,
            fields,
        })
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fields(&self) -> &GpxFields {
        &self.fields
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.fields.metadata.as_ref()
    }

    pub fn waypoints(&self) -> Seq<'_, WayPoint> {
        Seq::new(&self.fields.waypoints)
    }

    pub fn routes(&self) -> Seq<'_, Route> {
        Seq::new(&self.fields.routes)
    }

    pub fn tracks(&self) -> Seq<'_, Track> {
        Seq::new(&self.fields.tracks)
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.fields.extensions.as_ref()
    }

    pub fn namespaces(&self) -> Seq<'_, Namespace> {
        Seq::new(&self.fields.namespaces)
    }

    /// Every track point of every track, flattened in document order.
    pub fn track_points(&self) -> impl Iterator<Item = &WayPoint> {
        self.fields.tracks.iter().flat_map(|track| track.points())
    }
}
