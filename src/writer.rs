use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::GpxError;
use crate::gpx_types::*;
use crate::options::WriteOptions;
use crate::values::Length;

type Result<T> = std::result::Result<T, GpxError>;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";

/// Serialize `gpx` into `out`, flushing it before returning.
pub fn write_gpx<W: Write>(gpx: &Gpx, out: W, options: &WriteOptions) -> Result<()> {
    GpxWriter::new(out, options).write(gpx)?;
    Ok(())
}

/// Serialize `gpx` into a string.
pub fn write_gpx_string(gpx: &Gpx, options: &WriteOptions) -> Result<String> {
    let bytes = GpxWriter::new(Vec::new(), options).write(gpx)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Serialize `gpx` into a newly created (or truncated) file.
pub fn write_gpx_file(gpx: &Gpx, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let file = File::create(path)?;
    write_gpx(gpx, BufWriter::new(file), options)
}

/// Depth-first GPX serializer. Children are always emitted in schema order
/// and absent optional fields are omitted.
pub struct GpxWriter<W: Write> {
    xml: Writer<W>,
    declaration: bool,
}

impl<W: Write> GpxWriter<W> {
    pub fn new(inner: W, options: &WriteOptions) -> Self {
        let xml = if options.indent > 0 {
            Writer::new_with_indent(inner, b' ', options.indent)
        } else {
            Writer::new(inner)
        };
        Self {
            xml,
            declaration: options.xml_declaration,
        }
    }

    /// Write the whole document and hand back the flushed sink.
    pub fn write(mut self, gpx: &Gpx) -> Result<W> {
        if self.declaration {
            self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }

        let mut root = BytesStart::new("gpx");
        root.push_attribute(("version", gpx.version()));
        root.push_attribute(("creator", gpx.creator()));
        root.push_attribute(("xmlns", GPX_NAMESPACE));
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
        for namespace in gpx.namespaces() {
            let key = format!("xmlns:{}", namespace.prefix());
            root.push_attribute((key.as_str(), namespace.uri()));
        }
        self.event(Event::Start(root))?;

        if let Some(metadata) = gpx.metadata() {
            self.metadata(metadata)?;
        }
        for waypoint in gpx.waypoints() {
            self.waypoint("wpt", waypoint)?;
        }
        for route in gpx.routes() {
            self.route(route)?;
        }
        for track in gpx.tracks() {
            self.track(track)?;
        }
        self.extensions(gpx.extensions())?;
        self.end("gpx")?;

        log::trace!(
            "wrote GPX with {} waypoints, {} routes, {} tracks",
            gpx.waypoints().len(),
            gpx.routes().len(),
            gpx.tracks().len()
        );

        let mut inner = self.xml.into_inner();
        inner.flush()?;
        Ok(inner)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.xml.write_event(event)?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn leaf(&mut self, name: &str, value: impl Display) -> Result<()> {
        let text = value.to_string();
        self.event(Event::Start(BytesStart::new(name)))?;
        self.event(Event::Text(BytesText::new(&text)))?;
        self.end(name)
    }

    fn optional(&mut self, name: &str, value: Option<impl Display>) -> Result<()> {
        match value {
            Some(value) => self.leaf(name, value),
            None => Ok(()),
        }
    }

    fn metadata(&mut self, metadata: &Metadata) -> Result<()> {
        let fields = metadata.fields();
        if fields == &MetadataFields::default() {
            return self.event(Event::Empty(BytesStart::new("metadata")));
        }

        self.event(Event::Start(BytesStart::new("metadata")))?;
        self.optional("name", fields.name.as_deref())?;
        self.optional("desc", fields.description.as_deref())?;
        if let Some(author) = &fields.author {
            self.person("author", author)?;
        }
        if let Some(copyright) = &fields.copyright {
            self.copyright(copyright)?;
        }
        for link in &fields.links {
            self.link(link)?;
        }
        self.optional("time", fields.time)?;
        self.optional("keywords", fields.keywords.as_deref())?;
        if let Some(bounds) = &fields.bounds {
            self.bounds(bounds)?;
        }
        self.extensions(fields.extensions.as_ref())?;
        self.end("metadata")
    }

    fn waypoint(&mut self, tag: &str, point: &WayPoint) -> Result<()> {
        let lat = point.latitude().to_string();
        let lon = point.longitude().to_string();
        let mut start = BytesStart::new(tag);
        start.push_attribute(("lat", lat.as_str()));
        start.push_attribute(("lon", lon.as_str()));
        if point.is_bare() {
            return self.event(Event::Empty(start));
        }

        let f = point.fields();
        self.event(Event::Start(start))?;
        self.optional("ele", f.elevation.map(Length::to_meters))?;
        self.optional("time", f.time)?;
        self.optional("magvar", f.magnetic_variation)?;
        self.optional("geoidheight", f.geoid_height.map(Length::to_meters))?;
        self.optional("name", f.name.as_deref())?;
        self.optional("cmt", f.comment.as_deref())?;
        self.optional("desc", f.description.as_deref())?;
        self.optional("src", f.source.as_deref())?;
        for link in &f.links {
            self.link(link)?;
        }
        self.optional("sym", f.symbol.as_deref())?;
        self.optional("type", f.kind.as_deref())?;
        self.optional("fix", f.fix)?;
        self.optional("sat", f.sat)?;
        self.optional("hdop", f.hdop)?;
        self.optional("vdop", f.vdop)?;
        self.optional("pdop", f.pdop)?;
        self.optional("ageofdgpsdata", f.age_of_dgps_data)?;
        self.optional("dgpsid", f.dgps_id)?;
        self.optional("course", f.course)?;
        self.extensions(f.extensions.as_ref())?;
        self.end(tag)
    }

    /// name, cmt, desc, src, link*, number, type, extensions
    fn path_fields(&mut self, fields: &PathFields) -> Result<()> {
        self.optional("name", fields.name.as_deref())?;
        self.optional("cmt", fields.comment.as_deref())?;
        self.optional("desc", fields.description.as_deref())?;
        self.optional("src", fields.source.as_deref())?;
        for link in &fields.links {
            self.link(link)?;
        }
        self.optional("number", fields.number)?;
        self.optional("type", fields.kind.as_deref())?;
        self.extensions(fields.extensions.as_ref())
    }

    fn route(&mut self, route: &Route) -> Result<()> {
        if route == &Route::default() {
            return self.event(Event::Empty(BytesStart::new("rte")));
        }
        self.event(Event::Start(BytesStart::new("rte")))?;
        self.path_fields(route.fields())?;
        for point in route.points() {
            self.waypoint("rtept", point)?;
        }
        self.end("rte")
    }

    fn track(&mut self, track: &Track) -> Result<()> {
        if track == &Track::default() {
            return self.event(Event::Empty(BytesStart::new("trk")));
        }
        self.event(Event::Start(BytesStart::new("trk")))?;
        self.path_fields(track.fields())?;
        for segment in track.segments() {
            self.segment(segment)?;
        }
        self.end("trk")
    }

    fn segment(&mut self, segment: &TrackSegment) -> Result<()> {
        if segment.points().is_empty() && segment.extensions().is_none() {
            return self.event(Event::Empty(BytesStart::new("trkseg")));
        }
        self.event(Event::Start(BytesStart::new("trkseg")))?;
        for point in segment.points() {
            self.waypoint("trkpt", point)?;
        }
        self.extensions(segment.extensions())?;
        self.end("trkseg")
    }

    fn link(&mut self, link: &Link) -> Result<()> {
        let mut start = BytesStart::new("link");
        start.push_attribute(("href", link.href()));
        if link.text().is_none() && link.mime_type().is_none() {
            return self.event(Event::Empty(start));
        }
        self.event(Event::Start(start))?;
        self.optional("text", link.text())?;
        self.optional("type", link.mime_type())?;
        self.end("link")
    }

    fn person(&mut self, tag: &str, person: &Person) -> Result<()> {
        if person.is_empty() {
            return self.event(Event::Empty(BytesStart::new(tag)));
        }
        self.event(Event::Start(BytesStart::new(tag)))?;
        self.optional("name", person.name())?;
        if let Some(email) = person.email() {
            let mut start = BytesStart::new("email");
            start.push_attribute(("id", email.id()));
            start.push_attribute(("domain", email.domain()));
            self.event(Event::Empty(start))?;
        }
        if let Some(link) = person.link() {
            self.link(link)?;
        }
        self.end(tag)
    }

    fn copyright(&mut self, copyright: &Copyright) -> Result<()> {
        let mut start = BytesStart::new("copyright");
        start.push_attribute(("author", copyright.author()));
        if copyright.year().is_none() && copyright.license().is_none() {
            return self.event(Event::Empty(start));
        }
        self.event(Event::Start(start))?;
        self.optional("year", copyright.year())?;
        self.optional("license", copyright.license())?;
        self.end("copyright")
    }

    fn bounds(&mut self, bounds: &Bounds) -> Result<()> {
        let attributes = [
            ("minlat", bounds.min_lat().to_string()),
            ("minlon", bounds.min_lon().to_string()),
            ("maxlat", bounds.max_lat().to_string()),
            ("maxlon", bounds.max_lon().to_string()),
        ];
        let mut start = BytesStart::new("bounds");
        for (key, value) in &attributes {
            start.push_attribute((*key, value.as_str()));
        }
        self.event(Event::Empty(start))
    }

    /// Captured extension nodes are replayed byte for byte.
    fn extensions(&mut self, extensions: Option<&Extensions>) -> Result<()> {
        let Some(extensions) = extensions else {
            return Ok(());
        };
        if extensions.is_empty() {
            return self.event(Event::Empty(BytesStart::new("extensions")));
        }
        self.event(Event::Start(BytesStart::new("extensions")))?;
        for node in extensions.nodes() {
            self.event(Event::Text(BytesText::from_escaped(node.xml())))?;
        }
        self.end("extensions")
    }
}
