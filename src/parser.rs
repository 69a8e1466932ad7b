use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::error::{GpxError, ValidationError};
use crate::gpx_types::*;
use crate::values::*;

type Result<T> = std::result::Result<T, GpxError>;

/// Reads one child element into a field of the composite under construction.
type Setter<T> = fn(&mut T, Element, &mut XmlCursor<'_>) -> Result<()>;

/// Child tag name (local part) → setter. Children may arrive in any order.
type Table<T> = &'static [(&'static str, Setter<T>)];

/// Namespace URIs of every GPX schema version share this stem.
const GPX_NAMESPACE_STEM: &str = "http://www.topografix.com/GPX/";

/// Parse a GPX XML string into a [`Gpx`] document.
pub fn parse_gpx(xml: &str) -> Result<Gpx> {
    read_gpx(xml.as_bytes())
}

/// Parse a GPX document from a buffered byte stream.
pub fn read_gpx<'a, R: BufRead + 'a>(input: R) -> Result<Gpx> {
    XmlCursor::new(input).document()
}

/// Parse a GPX file. The file is closed when this returns, on success or error.
pub fn read_gpx_file(path: impl AsRef<Path>) -> Result<Gpx> {
    let file = File::open(path)?;
    read_gpx(BufReader::new(file))
}

/// Capture the first element of `xml` verbatim as an extension node.
pub fn parse_extension_node(xml: &str) -> Result<ExtensionNode> {
    let mut cursor = XmlCursor::new(xml.as_bytes());
    let element = cursor.first_element()?;
    cursor.capture(element)
}

/// A start tag together with whether it was self-closing.
pub(crate) struct Element {
    start: BytesStart<'static>,
    empty: bool,
}

impl Element {
    fn local_name(&self) -> String {
        String::from_utf8_lossy(self.start.local_name().as_ref()).into_owned()
    }

    fn qualified_name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }
}

/// Parse a decimal literal. `NaN`, `inf` and `infinity` are not numbers in GPX.
fn decimal<N: FromStr>(text: &str) -> Option<N> {
    let token = text.trim();
    let plain = token
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if plain { token.parse().ok() } else { None }
}

/// Prefix of a qualified name, `""` when unprefixed.
fn prefix_of(name: QName<'_>) -> String {
    name.prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned())
        .unwrap_or_default()
}

/// Schema shape of one composite element.
trait Composite: Sized + 'static {
    const TABLE: Table<Self>;

    /// Slot receiving unknown child elements, if the composite has one.
    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        None
    }
}

/// Pull-based event source that tracks the element path for diagnostics.
pub(crate) struct XmlCursor<'a> {
    reader: Reader<Box<dyn BufRead + 'a>>,
    buf: Vec<u8>,
    path: Vec<String>,
    /// Namespace declarations `(prefix, raw uri)` of each element on `path`,
    /// the root first. The default namespace has the prefix `""`.
    scopes: Vec<Vec<(String, String)>>,
    /// Namespace of the root element.
    namespace: Option<String>,
}

impl<'a> XmlCursor<'a> {
    fn new<R: BufRead + 'a>(input: R) -> Self {
        let input: Box<dyn BufRead + 'a> = Box::new(input);
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            path: Vec::new(),
            scopes: Vec::new(),
            namespace: None,
        }
    }

    fn next_event(&mut self) -> Result<Event<'static>> {
        self.buf.clear();
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .map(Event::into_owned);
        event.map_err(|e| self.xml_error(e))
    }

    fn path(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.path.join("/"))
        }
    }

    fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn xml_error(&self, err: quick_xml::Error) -> GpxError {
        GpxError::from_xml(err, self.path(), self.position())
    }

    fn format_error(&self, message: impl Into<String>) -> GpxError {
        GpxError::Format {
            path: self.path(),
            position: self.position(),
            message: message.into(),
        }
    }

    fn invalid(&self, source: ValidationError) -> GpxError {
        GpxError::Validation {
            path: self.path(),
            source,
        }
    }

    fn utf8<'b>(&self, bytes: &'b [u8]) -> Result<&'b str> {
        std::str::from_utf8(bytes).map_err(|e| self.format_error(format!("invalid UTF-8: {e}")))
    }

    fn first_element(&mut self) -> Result<Element> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return Ok(Element { start, empty: false }),
                Event::Empty(start) => return Ok(Element { start, empty: true }),
                Event::Eof => return Err(self.format_error("document has no root element")),
                _ => {}
            }
        }
    }

    fn document(&mut self) -> Result<Gpx> {
        let root = self.first_element()?;
        let tag = root.local_name();
        self.path.push(tag.clone());
        if tag != "gpx" {
            return Err(self.format_error(format!("expected root element <gpx>, found <{tag}>")));
        }

        let creator = self.non_empty_attribute(&root.start, "creator")?;
        let version = self.non_empty_attribute(&root.start, "version")?;
        let declared = self.declarations(&root.start)?;
        let mut fields = GpxFields {
            namespaces: self.namespaces(&declared)?,
            ..Default::default()
        };
        self.scopes.push(declared);
        self.namespace = self
            .lookup(&prefix_of(root.start.name()))
            .map(|(_, uri)| uri.to_string());
        self.children(&root, &mut fields)?;

        log::trace!(
            "read GPX {version} by '{creator}': {} waypoints, {} routes, {} tracks",
            fields.waypoints.len(),
            fields.routes.len(),
            fields.tracks.len()
        );
        Gpx::new(creator, version, fields).map_err(|e| self.invalid(e))
    }

    // ---- attributes ----

    fn attribute(&self, start: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e.into()))?;
            if attr.key.local_name().as_ref() == name.as_bytes() {
                let raw = self.utf8(&attr.value)?;
                let value = unescape(raw)
                    .map_err(|e| self.format_error(format!("attribute '{name}': {e}")))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn required_attribute(&self, start: &BytesStart<'_>, name: &str) -> Result<String> {
        self.attribute(start, name)?
            .ok_or_else(|| self.format_error(format!("missing required attribute '{name}'")))
    }

    fn non_empty_attribute(&self, start: &BytesStart<'_>, name: &str) -> Result<String> {
        let value = self.required_attribute(start, name)?;
        if value.trim().is_empty() {
            return Err(self.format_error(format!("attribute '{name}' must not be empty")));
        }
        Ok(value)
    }

    fn coordinate<T>(
        &self,
        start: &BytesStart<'_>,
        name: &str,
        build: fn(f64) -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        let raw = self.required_attribute(start, name)?;
        let value: f64 = decimal(&raw)
            .ok_or_else(|| self.format_error(format!("attribute '{name}' is not a number: '{raw}'")))?;
        build(value).map_err(|e| self.invalid(e))
    }

    /// `xmlns` and `xmlns:prefix` attributes as `(prefix, raw uri)` pairs.
    fn declarations(&self, start: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
        let mut declared = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e.into()))?;
            let key = self.utf8(attr.key.as_ref())?;
            let prefix = match key.strip_prefix("xmlns") {
                Some("") => "",
                Some(rest) => match rest.strip_prefix(':') {
                    Some(prefix) => prefix,
                    None => continue,
                },
                None => continue,
            };
            declared.push((prefix.to_string(), self.utf8(&attr.value)?.to_string()));
        }
        Ok(declared)
    }

    /// Root `xmlns:prefix` declarations other than `xsi` and `xml`.
    fn namespaces(&self, declared: &[(String, String)]) -> Result<Vec<Namespace>> {
        let mut namespaces = Vec::new();
        for (prefix, raw) in declared {
            if matches!(prefix.as_str(), "" | "xsi" | "xml") {
                continue;
            }
            let uri = unescape(raw)
                .map_err(|e| self.format_error(format!("attribute 'xmlns:{prefix}': {e}")))?;
            let namespace = Namespace::new(prefix.as_str(), uri).map_err(|e| self.invalid(e))?;
            namespaces.push(namespace);
        }
        Ok(namespaces)
    }

    /// Innermost binding of `prefix` and the depth of the element declaring it.
    fn lookup(&self, prefix: &str) -> Option<(usize, &str)> {
        self.scopes.iter().enumerate().rev().find_map(|(depth, scope)| {
            scope
                .iter()
                .rev()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| (depth, uri.as_str()))
        })
    }

    /// Whether `element` belongs to the GPX schema. Unprefixed names with no
    /// default namespace in scope count as GPX.
    fn in_schema(&self, element: &Element) -> bool {
        let prefix = prefix_of(element.start.name());
        match self.lookup(&prefix) {
            Some((_, uri)) => uri.starts_with(GPX_NAMESPACE_STEM) || self.namespace.as_deref() == Some(uri),
            None => prefix.is_empty(),
        }
    }

    // ---- leaf content ----

    /// Text content of a leaf element, with CDATA and references resolved.
    fn text(&mut self, element: Element) -> Result<String> {
        let mut text = String::new();
        if element.empty {
            return Ok(text);
        }

        loop {
            match self.next_event()? {
                Event::Text(e) => text.push_str(self.utf8(&e)?),
                Event::CData(e) => text.push_str(self.utf8(&e)?),
                Event::GeneralRef(e) => {
                    if let Ok(Some(ch)) = e.resolve_char_ref() {
                        text.push(ch);
                        continue;
                    }
                    let name = self.utf8(&e)?;
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {
                            log::debug!("keeping unknown entity &{name}; at {}", self.path());
                            text.push('&');
                            text.push_str(name);
                            text.push(';');
                        }
                    }
                }
                Event::End(_) => break,
                Event::Start(e) | Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(self.format_error(format!("unexpected element <{name}> in text content")));
                }
                Event::Eof => return Err(self.format_error("unexpected end of document")),
                _ => {}
            }
        }

        Ok(text)
    }

    /// Parse trimmed text content; an unparseable token is a format error.
    fn number<N: FromStr>(&mut self, element: Element) -> Result<N> {
        let text = self.text(element)?;
        decimal(&text).ok_or_else(|| self.format_error(format!("'{}' is not a valid number", text.trim())))
    }

    /// Parse a number and pass it through a validating constructor.
    fn checked<N: FromStr, T>(
        &mut self,
        element: Element,
        build: impl FnOnce(N) -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        let value = self.number(element)?;
        build(value).map_err(|e| self.invalid(e))
    }

    fn timestamp(&mut self, element: Element) -> Result<Timestamp> {
        let text = self.text(element)?;
        Timestamp::parse(&text)
            .ok_or_else(|| self.format_error(format!("'{}' is not an ISO-8601 date-time", text.trim())))
    }

    fn fix(&mut self, element: Element) -> Result<Fix> {
        let text = self.text(element)?;
        text.parse().map_err(|e| self.invalid(e))
    }

    // ---- composites ----

    /// Dispatch every child of `parent` through `T::TABLE` until its end tag.
    fn children<T: Composite>(&mut self, parent: &Element, target: &mut T) -> Result<()> {
        if parent.empty {
            return Ok(());
        }

        loop {
            let child = match self.next_event()? {
                Event::Start(start) => Element { start, empty: false },
                Event::Empty(start) => Element { start, empty: true },
                Event::End(_) => return Ok(()),
                Event::Text(e) => {
                    if !e.iter().all(u8::is_ascii_whitespace) {
                        log::debug!("ignoring stray text at {}", self.path());
                    }
                    continue;
                }
                Event::Eof => return Err(self.format_error("unexpected end of document")),
                _ => continue,
            };
            self.dispatch(target, child)?;
        }
    }

    fn dispatch<T: Composite>(&mut self, target: &mut T, child: Element) -> Result<()> {
        let tag = child.local_name();
        let declared = self.declarations(&child.start)?;
        self.scopes.push(declared);
        let setter = if self.in_schema(&child) {
            T::TABLE
                .iter()
                .find(|(name, _)| *name == tag)
                .map(|(_, setter)| *setter)
        } else {
            None
        };

        self.path.push(tag);
        let result = match setter {
            Some(set) => set(target, child, self),
            None => self.foreign(target, child),
        };
        self.path.pop();
        self.scopes.pop();
        result
    }

    /// Unknown child: keep it verbatim when the composite has an extension
    /// slot, drop it otherwise.
    fn foreign<T: Composite>(&mut self, target: &mut T, child: Element) -> Result<()> {
        let node = self.capture(child)?;
        match target.extensions() {
            Some(slot) => slot.get_or_insert_with(Extensions::default).push(node),
            None => log::debug!("dropping unknown element <{}> at {}", node.name(), self.path()),
        }
        Ok(())
    }

    fn extensions(&mut self, element: Element, slot: &mut Option<Extensions>) -> Result<()> {
        let extensions = slot.get_or_insert_with(Extensions::default);
        if element.empty {
            return Ok(());
        }

        loop {
            let child = match self.next_event()? {
                Event::Start(start) => Element { start, empty: false },
                Event::Empty(start) => Element { start, empty: true },
                Event::End(_) => return Ok(()),
                Event::Text(e) => {
                    if !e.iter().all(u8::is_ascii_whitespace) {
                        log::debug!("ignoring text directly inside <extensions> at {}", self.path());
                    }
                    continue;
                }
                Event::Eof => return Err(self.format_error("unexpected end of document")),
                _ => continue,
            };
            extensions.push(self.capture(child)?);
        }
    }

    /// Re-serialize the subtree rooted at `element` exactly as it was read.
    ///
    /// Prefixes the subtree uses but inherits from an element between the
    /// root and `element` are re-declared on the captured start tag.
    fn capture(&mut self, element: Element) -> Result<ExtensionNode> {
        let name = element.qualified_name();
        let mut xml = Vec::new();
        let mut bound = Vec::new();
        let mut unbound = Vec::new();
        self.note_prefixes(&element.start, &mut bound, &mut unbound)?;

        if element.empty {
            wrap(&mut xml, b"<", &element.start, b"/>");
        } else {
            wrap(&mut xml, b"<", &element.start, b">");
            let mut depth = 0usize;
            loop {
                match self.next_event()? {
                    Event::Start(e) => {
                        depth += 1;
                        self.note_prefixes(&e, &mut bound, &mut unbound)?;
                        wrap(&mut xml, b"<", &e, b">");
                    }
                    Event::End(e) => {
                        bound.pop();
                        wrap(&mut xml, b"</", &e, b">");
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                    }
                    Event::Empty(e) => {
                        self.note_prefixes(&e, &mut bound, &mut unbound)?;
                        bound.pop();
                        wrap(&mut xml, b"<", &e, b"/>");
                    }
                    Event::Text(e) => xml.extend_from_slice(&e),
                    Event::CData(e) => wrap(&mut xml, b"<![CDATA[", &e, b"]]>"),
                    Event::Comment(e) => wrap(&mut xml, b"<!--", &e, b"-->"),
                    Event::PI(e) => wrap(&mut xml, b"<?", &e, b"?>"),
                    Event::GeneralRef(e) => wrap(&mut xml, b"&", &e, b";"),
                    Event::Eof => {
                        return Err(self.format_error(format!("unexpected end of document inside <{name}>")));
                    }
                    _ => {}
                }
            }
        }

        let inherited = self.inherited(&unbound);
        if !inherited.is_empty() {
            let tail = xml.split_off(1 + element.start.name().as_ref().len());
            xml.extend_from_slice(inherited.as_bytes());
            xml.extend_from_slice(&tail);
        }

        let xml = String::from_utf8(xml).map_err(|e| self.format_error(format!("invalid UTF-8: {e}")))?;
        ExtensionNode::new(name, xml).map_err(|e| self.invalid(e))
    }

    /// Push the prefixes `start` declares onto `bound` and record in `unbound`
    /// every prefix it uses that no enclosing captured element declares.
    fn note_prefixes(
        &self,
        start: &BytesStart<'_>,
        bound: &mut Vec<Vec<String>>,
        unbound: &mut Vec<String>,
    ) -> Result<()> {
        let declared = self.declarations(start)?.into_iter().map(|(prefix, _)| prefix).collect();
        bound.push(declared);

        let mut used = vec![prefix_of(start.name())];
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e.into()))?;
            let Some(prefix) = attr.key.prefix() else {
                continue;
            };
            let prefix = String::from_utf8_lossy(prefix.as_ref()).into_owned();
            if prefix != "xmlns" && prefix != "xml" {
                used.push(prefix);
            }
        }
        for prefix in used {
            if !bound.iter().flatten().any(|p| *p == prefix) && !unbound.contains(&prefix) {
                unbound.push(prefix);
            }
        }
        Ok(())
    }

    /// Declarations for `prefixes` bound below the root. The root's own
    /// declarations are written with the document and not repeated.
    fn inherited(&self, prefixes: &[String]) -> String {
        let mut declarations = String::new();
        for prefix in prefixes {
            let Some((depth, uri)) = self.lookup(prefix) else {
                continue;
            };
            if depth == 0 {
                continue;
            }
            let uri = uri.replace('"', "&quot;");
            if prefix.is_empty() {
                declarations.push_str(&format!(r#" xmlns="{uri}""#));
            } else {
                declarations.push_str(&format!(r#" xmlns:{prefix}="{uri}""#));
            }
        }
        declarations
    }

    fn waypoint(&mut self, element: Element) -> Result<WayPoint> {
        let latitude = self.coordinate(&element.start, "lat", Latitude::from_degrees)?;
        let longitude = self.coordinate(&element.start, "lon", Longitude::from_degrees)?;
        let mut fields = WayPointFields::default();
        self.children(&element, &mut fields)?;
        Ok(WayPoint::with_fields(latitude, longitude, fields))
    }

    fn route(&mut self, element: Element) -> Result<Route> {
        let mut parts = RouteParts::default();
        self.children(&element, &mut parts)?;
        Ok(Route::new(parts.fields, parts.points))
    }

    fn track(&mut self, element: Element) -> Result<Track> {
        let mut parts = TrackParts::default();
        self.children(&element, &mut parts)?;
        Ok(Track::new(parts.fields, parts.segments))
    }

    fn segment(&mut self, element: Element) -> Result<TrackSegment> {
        let mut parts = SegmentParts::default();
        self.children(&element, &mut parts)?;
        Ok(TrackSegment::new(parts.points, parts.extensions))
    }

    fn metadata(&mut self, element: Element) -> Result<Metadata> {
        let mut fields = MetadataFields::default();
        self.children(&element, &mut fields)?;
        Ok(Metadata::new(fields))
    }

    fn link(&mut self, element: Element) -> Result<Link> {
        let href = self.required_attribute(&element.start, "href")?;
        let mut parts = LinkParts::default();
        self.children(&element, &mut parts)?;
        Link::with(href, parts.text, parts.mime_type).map_err(|e| self.invalid(e))
    }

    fn person(&mut self, element: Element) -> Result<Person> {
        let mut parts = PersonParts::default();
        self.children(&element, &mut parts)?;
        Ok(Person::new(parts.name, parts.email, parts.link))
    }

    fn email(&mut self, element: Element) -> Result<Email> {
        let id = self.required_attribute(&element.start, "id")?;
        let domain = self.required_attribute(&element.start, "domain")?;
        self.children(&element, &mut NoChildren)?;
        Email::new(id, domain).map_err(|e| self.invalid(e))
    }

    fn copyright(&mut self, element: Element) -> Result<Copyright> {
        let author = self.required_attribute(&element.start, "author")?;
        let mut parts = CopyrightParts::default();
        self.children(&element, &mut parts)?;
        Copyright::new(author, parts.year, parts.license).map_err(|e| self.invalid(e))
    }

    fn bounds(&mut self, element: Element) -> Result<Bounds> {
        let bounds = Bounds::new(
            self.coordinate(&element.start, "minlat", Latitude::from_degrees)?,
            self.coordinate(&element.start, "minlon", Longitude::from_degrees)?,
            self.coordinate(&element.start, "maxlat", Latitude::from_degrees)?,
            self.coordinate(&element.start, "maxlon", Longitude::from_degrees)?,
        );
        self.children(&element, &mut NoChildren)?;
        Ok(bounds)
    }
}

fn wrap(out: &mut Vec<u8>, before: &[u8], content: &[u8], after: &[u8]) {
    out.extend_from_slice(before);
    out.extend_from_slice(content);
    out.extend_from_slice(after);
}

// ---- dispatch tables ----

impl Composite for GpxFields {
    const TABLE: Table<Self> = &[
        ("metadata", |g, el, c| {
            if g.metadata.is_some() {
                return Err(c.format_error("<metadata> may appear only once"));
            }
            g.metadata = Some(c.metadata(el)?);
            Ok(())
        }),
        ("wpt", |g, el, c| {
            g.waypoints.push(c.waypoint(el)?);
            Ok(())
        }),
        ("rte", |g, el, c| {
            g.routes.push(c.route(el)?);
            Ok(())
        }),
        ("trk", |g, el, c| {
            g.tracks.push(c.track(el)?);
            Ok(())
        }),
        ("extensions", |g, el, c| c.extensions(el, &mut g.extensions)),
    ];

    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        Some(&mut self.extensions)
    }
}

impl Composite for MetadataFields {
    const TABLE: Table<Self> = &[
        ("name", |m, el, c| {
            m.name = Some(c.text(el)?);
            Ok(())
        }),
        ("desc", |m, el, c| {
            m.description = Some(c.text(el)?);
            Ok(())
        }),
        ("author", |m, el, c| {
            m.author = Some(c.person(el)?);
            Ok(())
        }),
        ("copyright", |m, el, c| {
            m.copyright = Some(c.copyright(el)?);
            Ok(())
        }),
        ("link", |m, el, c| {
            m.links.push(c.link(el)?);
            Ok(())
        }),
        ("time", |m, el, c| {
            m.time = Some(c.timestamp(el)?);
            Ok(())
        }),
        ("keywords", |m, el, c| {
            m.keywords = Some(c.text(el)?);
            Ok(())
        }),
        ("bounds", |m, el, c| {
            m.bounds = Some(c.bounds(el)?);
            Ok(())
        }),
        ("extensions", |m, el, c| c.extensions(el, &mut m.extensions)),
    ];

    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        Some(&mut self.extensions)
    }
}

impl Composite for WayPointFields {
    const TABLE: Table<Self> = &[
        ("ele", |w, el, c| {
            w.elevation = Some(c.checked(el, Length::meters)?);
            Ok(())
        }),
        ("time", |w, el, c| {
            w.time = Some(c.timestamp(el)?);
            Ok(())
        }),
        ("magvar", |w, el, c| {
            w.magnetic_variation = Some(c.checked(el, Degrees::new)?);
            Ok(())
        }),
        ("geoidheight", |w, el, c| {
            w.geoid_height = Some(c.checked(el, Length::meters)?);
            Ok(())
        }),
        ("name", |w, el, c| {
            w.name = Some(c.text(el)?);
            Ok(())
        }),
        ("cmt", |w, el, c| {
            w.comment = Some(c.text(el)?);
            Ok(())
        }),
        ("desc", |w, el, c| {
            w.description = Some(c.text(el)?);
            Ok(())
        }),
        ("src", |w, el, c| {
            w.source = Some(c.text(el)?);
            Ok(())
        }),
        ("link", |w, el, c| {
            w.links.push(c.link(el)?);
            Ok(())
        }),
        ("sym", |w, el, c| {
            w.symbol = Some(c.text(el)?);
            Ok(())
        }),
        ("type", |w, el, c| {
            w.kind = Some(c.text(el)?);
            Ok(())
        }),
        ("fix", |w, el, c| {
            w.fix = Some(c.fix(el)?);
            Ok(())
        }),
        ("sat", |w, el, c| {
            w.sat = Some(c.checked(el, UInt::new)?);
            Ok(())
        }),
        ("hdop", |w, el, c| {
            w.hdop = Some(c.checked(el, Dop::new)?);
            Ok(())
        }),
        ("vdop", |w, el, c| {
            w.vdop = Some(c.checked(el, Dop::new)?);
            Ok(())
        }),
        ("pdop", |w, el, c| {
            w.pdop = Some(c.checked(el, Dop::new)?);
            Ok(())
        }),
        ("ageofdgpsdata", |w, el, c| {
            w.age_of_dgps_data = Some(c.checked(el, Seconds::new)?);
            Ok(())
        }),
        ("dgpsid", |w, el, c| {
            w.dgps_id = Some(c.checked(el, DgpsStation::new)?);
            Ok(())
        }),
        ("course", |w, el, c| {
            w.course = Some(c.checked(el, Degrees::new)?);
            Ok(())
        }),
        ("extensions", |w, el, c| c.extensions(el, &mut w.extensions)),
    ];

    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        Some(&mut self.extensions)
    }
}

#[derive(Default)]
struct RouteParts {
    fields: PathFields,
    points: Vec<WayPoint>,
}

impl Composite for RouteParts {
    const TABLE: Table<Self> = &[
        ("name", |r, el, c| {
            r.fields.name = Some(c.text(el)?);
            Ok(())
        }),
        ("cmt", |r, el, c| {
            r.fields.comment = Some(c.text(el)?);
            Ok(())
        }),
        ("desc", |r, el, c| {
            r.fields.description = Some(c.text(el)?);
            Ok(())
        }),
        ("src", |r, el, c| {
            r.fields.source = Some(c.text(el)?);
            Ok(())
        }),
        ("link", |r, el, c| {
            r.fields.links.push(c.link(el)?);
            Ok(())
        }),
        ("number", |r, el, c| {
            r.fields.number = Some(c.checked(el, UInt::new)?);
            Ok(())
        }),
        ("type", |r, el, c| {
            r.fields.kind = Some(c.text(el)?);
            Ok(())
        }),
        ("extensions", |r, el, c| c.extensions(el, &mut r.fields.extensions)),
        ("rtept", |r, el, c| {
            r.points.push(c.waypoint(el)?);
            Ok(())
        }),
    ];

    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        Some(&mut self.fields.extensions)
    }
}

#[derive(Default)]
struct TrackParts {
    fields: PathFields,
    segments: Vec<TrackSegment>,
}

impl Composite for TrackParts {
    const TABLE: Table<Self> = &[
        ("name", |t, el, c| {
            t.fields.name = Some(c.text(el)?);
            Ok(())
        }),
        ("cmt", |t, el, c| {
            t.fields.comment = Some(c.text(el)?);
            Ok(())
        }),
        ("desc", |t, el, c| {
            t.fields.description = Some(c.text(el)?);
            Ok(())
        }),
        ("src", |t, el, c| {
            t.fields.source = Some(c.text(el)?);
            Ok(())
        }),
        ("link", |t, el, c| {
            t.fields.links.push(c.link(el)?);
            Ok(())
        }),
        ("number", |t, el, c| {
            t.fields.number = Some(c.checked(el, UInt::new)?);
            Ok(())
        }),
        ("type", |t, el, c| {
            t.fields.kind = Some(c.text(el)?);
            Ok(())
        }),
        ("extensions", |t, el, c| c.extensions(el, &mut t.fields.extensions)),
        ("trkseg", |t, el, c| {
            t.segments.push(c.segment(el)?);
            Ok(())
        }),
    ];

    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        Some(&mut self.fields.extensions)
    }
}

#[derive(Default)]
struct SegmentParts {
    points: Vec<WayPoint>,
    extensions: Option<Extensions>,
}

impl Composite for SegmentParts {
    const TABLE: Table<Self> = &[
        ("trkpt", |s, el, c| {
            s.points.push(c.waypoint(el)?);
            Ok(())
        }),
        ("extensions", |s, el, c| c.extensions(el, &mut s.extensions)),
    ];

    fn extensions(&mut self) -> Option<&mut Option<Extensions>> {
        Some(&mut self.extensions)
    }
}

#[derive(Default)]
struct LinkParts {
    text: Option<String>,
    mime_type: Option<String>,
}

impl Composite for LinkParts {
    const TABLE: Table<Self> = &[
        ("text", |l, el, c| {
            l.text = Some(c.text(el)?);
            Ok(())
        }),
        ("type", |l, el, c| {
            l.mime_type = Some(c.text(el)?);
            Ok(())
        }),
    ];
}

#[derive(Default)]
struct PersonParts {
    name: Option<String>,
    email: Option<Email>,
    link: Option<Link>,
}

impl Composite for PersonParts {
    const TABLE: Table<Self> = &[
        ("name", |p, el, c| {
            p.name = Some(c.text(el)?);
            Ok(())
        }),
        ("email", |p, el, c| {
            p.email = Some(c.email(el)?);
            Ok(())
        }),
        ("link", |p, el, c| {
            p.link = Some(c.link(el)?);
            Ok(())
        }),
    ];
}

#[derive(Default)]
struct CopyrightParts {
    year: Option<i32>,
    license: Option<String>,
}

impl Composite for CopyrightParts {
    const TABLE: Table<Self> = &[
        ("year", |p, el, c| {
            p.year = Some(c.number(el)?);
            Ok(())
        }),
        ("license", |p, el, c| {
            p.license = Some(c.text(el)?);
            Ok(())
        }),
    ];
}

/// Elements whose content is carried by attributes only.
struct NoChildren;

impl Composite for NoChildren {
    const TABLE: Table<Self> = &[];
}
