use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Reader};

use crate::error::{GpxError, Result};
use crate::gpx_types::*;
use crate::options::{ElementKind, ParseOptions};
use crate::style::{StyleRecord, GPX_STYLE_NS};

type XmlReader<'a> = NsReader<&'a [u8]>;

/// Structural pass over canonicalized GPX text.
///
/// Discovers waypoints, routes and tracks anywhere in the tree, in document
/// order within each kind. Kinds not requested by `opts` are skipped but
/// still checked for well-formedness.
pub fn parse_gpx(xml: &str, opts: &ParseOptions) -> Result<RawDocument> {
    let mut reader = NsReader::from_str(xml);
    let mut data = RawDocument::default();
    let mut saw_root = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                saw_root = true;
                match e.local_name().as_ref() {
                    b"wpt" if opts.should_include(ElementKind::Waypoint) => {
                        data.waypoints.push(parse_point(&e, &mut reader)?);
                    }
                    b"rte" if opts.should_include(ElementKind::Route) => {
                        data.routes.push(parse_route(&mut reader)?);
                    }
                    b"trk" if opts.should_include(ElementKind::Track) => {
                        data.tracks.push(parse_track(&mut reader)?);
                    }
                    b"wpt" | b"rte" | b"trk" => {
                        reader.read_to_end(e.name())?;
                    }
                    _ => depth += 1,
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                if e.local_name().as_ref() == b"wpt" && opts.should_include(ElementKind::Waypoint)
                {
                    data.waypoints.push(point_attributes(&e)?);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof if depth > 0 => {
                return Err(GpxError::malformed("unexpected end of input"));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(GpxError::malformed("document has no root element"));
    }

    Ok(data)
}

/// Read the raw lat/lon attributes of a point element's start tag.
fn point_attributes(e: &BytesStart<'_>) -> Result<RawPoint> {
    let mut point = RawPoint::default();

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => point.lat = Some(val.to_string()),
            b"lon" => point.lon = Some(val.to_string()),
            _ => {}
        }
    }

    Ok(point)
}

/// Parse a point element (wpt, rtept, trkpt) and its descendants.
/// Called after receiving Event::Start for the point element.
///
/// Channel fields are looked up at any depth so that values nested inside
/// `<extensions>` are found; the first occurrence of each field wins.
fn parse_point<'a>(start: &BytesStart<'a>, reader: &mut XmlReader<'a>) -> Result<RawPoint> {
    let mut point = point_attributes(start)?;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ele" => capture(&mut point.ele, reader)?,
                b"time" => capture(&mut point.time, reader)?,
                b"speed" => capture(&mut point.speed, reader)?,
                b"hr" => capture(&mut point.hr, reader)?,
                b"cad" => capture(&mut point.cad, reader)?,
                b"atemp" => capture(&mut point.atemp, reader)?,
                b"name" => capture(&mut point.name, reader)?,
                b"desc" => capture(&mut point.desc, reader)?,
                b"sym" => capture(&mut point.sym, reader)?,
                b"type" => capture(&mut point.point_type, reader)?,
                b"link" => {
                    reader.read_to_end(e.name())?;
                }
                _ => depth += 1,
            },
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(GpxError::unexpected_eof(start.name().as_ref())),
            _ => {}
        }
    }

    Ok(point)
}

/// Parse a <rte> element.
fn parse_route(reader: &mut XmlReader<'_>) -> Result<RawRoute> {
    let mut route = RawRoute::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"name" => capture(&mut route.name, reader)?,
                b"extensions" => {
                    if let Some(style) = parse_style_extension(reader)? {
                        route.style.get_or_insert(style);
                    }
                }
                b"rtept" => route.points.push(parse_point(&e, reader)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"rtept" {
                    route.points.push(point_attributes(&e)?);
                }
            }
            Event::End(_) => break,
            Event::Eof => return Err(GpxError::unexpected_eof(b"rte")),
            _ => {}
        }
    }

    Ok(route)
}

/// Parse a <trk> element.
fn parse_track(reader: &mut XmlReader<'_>) -> Result<RawTrack> {
    let mut track = RawTrack::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"name" => capture(&mut track.name, reader)?,
                b"extensions" => {
                    if let Some(style) = parse_style_extension(reader)? {
                        track.style.get_or_insert(style);
                    }
                }
                b"trkseg" => {
                    let seg = parse_segment(reader)?;
                    if !seg.points.is_empty() {
                        track.segments.push(seg);
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(_) => break,
            Event::Eof => return Err(GpxError::unexpected_eof(b"trk")),
            _ => {}
        }
    }

    Ok(track)
}

/// Parse a <trkseg> element.
fn parse_segment(reader: &mut XmlReader<'_>) -> Result<RawSegment> {
    let mut segment = RawSegment::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"trkpt" => segment.points.push(parse_point(&e, reader)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"trkpt" {
                    segment.points.push(point_attributes(&e)?);
                }
            }
            Event::End(_) => break,
            Event::Eof => return Err(GpxError::unexpected_eof(b"trkseg")),
            _ => {}
        }
    }

    Ok(segment)
}

/// Look for a `<line>` block in the gpx_style namespace inside an
/// `<extensions>` element. Lines in any other namespace are ignored.
fn parse_style_extension(reader: &mut XmlReader<'_>) -> Result<Option<StyleRecord>> {
    let mut style = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let (ns, local) = reader.resolve_element(e.name());
                let in_style_ns =
                    matches!(ns, ResolveResult::Bound(Namespace(ns)) if ns == GPX_STYLE_NS);
                if in_style_ns && local.as_ref() == b"line" && style.is_none() {
                    let entries = read_line_entries(reader)?;
                    style = Some(StyleRecord::from_extension(&entries));
                } else {
                    depth += 1;
                }
            }
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(GpxError::unexpected_eof(b"extensions")),
            _ => {}
        }
    }

    Ok(style)
}

/// Collect `(local name, text)` for each child of a style `<line>` block.
fn read_line_entries(reader: &mut XmlReader<'_>) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let text = read_text_owned(reader)?;
                entries.push((name, text));
            }
            Event::End(_) => break,
            Event::Eof => return Err(GpxError::unexpected_eof(b"line")),
            _ => {}
        }
    }

    Ok(entries)
}

/// Store the element's text in `slot` unless an earlier occurrence already did.
fn capture(slot: &mut Option<String>, reader: &mut XmlReader<'_>) -> Result<()> {
    let text = read_text_owned(reader)?;
    if slot.is_none() {
        *slot = Some(text);
    }
    Ok(())
}

/// Read the text content of the current element, descendants included,
/// up to and including its end tag.
fn read_text_owned(reader: &mut XmlReader<'_>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(GpxError::malformed("unexpected end of input in text")),
            _ => push_text(&mut text, &event),
        }
    }

    Ok(text)
}

/// Append the text carried by a Text, CData or GeneralRef event.
fn push_text(text: &mut String, event: &Event<'_>) {
    match event {
        Event::Text(e) => {
            let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
            text.push_str(raw);
        }
        Event::CData(e) => {
            let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
            text.push_str(s);
        }
        Event::GeneralRef(e) => {
            // Character references (&#60; &#x3C;) and predefined entities
            if let Ok(Some(ch)) = e.resolve_char_ref() {
                text.push(ch);
            } else {
                let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                match name {
                    "amp" => text.push('&'),
                    "lt" => text.push('<'),
                    "gt" => text.push('>'),
                    "quot" => text.push('"'),
                    "apos" => text.push('\''),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Name,
    Desc,
    Author,
    Copyright,
}

impl MetaField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"name" => Some(Self::Name),
            b"desc" => Some(Self::Desc),
            b"author" => Some(Self::Author),
            b"copyright" => Some(Self::Copyright),
            _ => None,
        }
    }

    fn slot(self, meta: &mut DocumentMetadata) -> &mut Option<String> {
        match self {
            Self::Name => &mut meta.name,
            Self::Desc => &mut meta.desc,
            Self::Author => &mut meta.author,
            Self::Copyright => &mut meta.copyright,
        }
    }
}

struct Capture {
    field: MetaField,
    depth: usize,
    attribute: Option<String>,
    text: String,
}

/// Scan the whole document for the first `name`, `desc`, `author` and
/// `copyright` elements, wherever they appear. Nested captures are allowed,
/// so `<author><name>` can provide both the author and the name.
pub fn scan_metadata(xml: &str) -> Result<DocumentMetadata> {
    let mut reader = Reader::from_str(xml);
    let mut meta = DocumentMetadata::default();
    let mut open: Vec<Capture> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_start = matches!(event, Event::Start(_));
                if is_start {
                    depth += 1;
                }
                let Some(field) = MetaField::from_local_name(e.local_name().as_ref()) else {
                    continue;
                };
                let pending = field.slot(&mut meta).is_none()
                    && !open.iter().any(|capture| capture.field == field);
                if !pending {
                    continue;
                }
                let attribute = match field {
                    MetaField::Copyright => copyright_author(e)?,
                    _ => None,
                };
                if is_start {
                    open.push(Capture {
                        field,
                        depth,
                        attribute,
                        text: String::new(),
                    });
                } else if attribute.is_some() {
                    *field.slot(&mut meta) = attribute;
                }
            }
            Event::End(_) => {
                if open.last().is_some_and(|capture| capture.depth == depth) {
                    if let Some(capture) = open.pop() {
                        let text = capture.text.trim();
                        let value = capture
                            .attribute
                            .or_else(|| (!text.is_empty()).then(|| text.to_string()));
                        let slot = capture.field.slot(&mut meta);
                        if slot.is_none() {
                            *slot = value;
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {
                for capture in &mut open {
                    push_text(&mut capture.text, &event);
                }
            }
        }
    }

    Ok(meta)
}

/// GPX 1.1 puts the copyright holder in an `author` attribute.
fn copyright_author(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr_result in e.attributes() {
        let attr = attr_result?;
        if attr.key.local_name().as_ref() == b"author" {
            let val = std::str::from_utf8(&attr.value).unwrap_or_default().trim();
            if !val.is_empty() {
                return Ok(Some(val.to_string()));
            }
        }
    }
    Ok(None)
}
