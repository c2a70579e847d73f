//! Streaming decoder for Subsurface XML exports using quick-xml.
//!
//! The decoder walks the document in one pass and reports structure to a
//! [`DecodeHandler`] instead of materializing a parsed tree. Exactly one
//! `begin` and one `end` are emitted per document; geo-label events always
//! follow the site event of their enclosing `<site>` subtree; dive events
//! always follow the trip event of their enclosing `<trip>`. Unknown
//! elements are reported as skips and never fail the decode.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::schema::{
    ComputerRecord, CylinderRecord, DiveRecord, GeoRecord, ManualTemperatureRecord, SiteRecord,
    WeightsystemRecord,
};
use crate::tags;

/// Errors that can occur while decoding an export.
///
/// `E` is the handler's error type; a handler rejection aborts the decode
/// and surfaces as [`DecodeError::Handler`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError<E> {
    /// Malformed XML markup.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O failure reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-UTF-8 content where text was expected.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Well-formed XML that is not a valid export document.
    #[error("invalid document structure: {0}")]
    InvalidStructure(String),

    /// An attribute whose value cannot be interpreted.
    #[error("invalid attribute value: {0}")]
    InvalidAttributeValue(String),

    /// The handler rejected an event.
    #[error("handler error: {0}")]
    Handler(E),
}

/// Callback surface driven by the decoder, in document order.
///
/// Methods that create an entity return its newly assigned system
/// identifier, so later events in the same document (geo labels, dives
/// naming their trip) arrive with references already resolved.
pub trait DecodeHandler {
    /// Error type surfaced when the handler rejects an event.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Document opened; called exactly once, before any other event.
    fn on_begin(&mut self) -> Result<(), Self::Error>;

    /// Producer name and version from the root element.
    fn on_header(&mut self, program: &str, version: &str) -> Result<(), Self::Error>;

    /// A dive site declaration. Returns the site's system identifier.
    fn on_dive_site(&mut self, record: SiteRecord) -> Result<u32, Self::Error>;

    /// A geo label for an already-registered site.
    fn on_geo_label(&mut self, site_id: u32, record: GeoRecord) -> Result<(), Self::Error>;

    /// A trip declaration. Returns the trip's system identifier.
    fn on_dive_trip(&mut self, label: &str) -> Result<u32, Self::Error>;

    /// A fully decoded dive. Returns the dive's system identifier.
    fn on_dive(&mut self, record: DiveRecord) -> Result<u32, Self::Error>;

    /// An unsupported element that was skipped.
    fn on_skip(&mut self, element: &str) -> Result<(), Self::Error>;

    /// Document closed; called exactly once, after every other event.
    fn on_end(&mut self) -> Result<(), Self::Error>;
}

/// Streaming decoder over any buffered byte source.
pub struct Decoder<R: BufRead> {
    reader: Reader<R>,
}

impl Decoder<BufReader<File>> {
    /// Open an export file for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::with_capacity(64 * 1024, file)))
    }
}

/// Decode the export at `path`, driving `handler` with its events.
pub fn decode_file<P, H>(path: P, handler: &mut H) -> Result<(), DecodeError<H::Error>>
where
    P: AsRef<Path>,
    H: DecodeHandler,
{
    Decoder::open(path)?.decode(handler)
}

impl<R: BufRead> Decoder<R> {
    /// Create a decoder from a buffered reader.
    pub fn new(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);
        Self { reader: xml_reader }
    }

    /// Run the decode to completion.
    ///
    /// On success the handler has received one `begin`, the document's
    /// events in order, and one `end`. On error no further events are
    /// delivered and no partial result is returned.
    pub fn decode<H: DecodeHandler>(mut self, handler: &mut H) -> Result<(), DecodeError<H::Error>> {
        let mut buf = Vec::new();
        let mut saw_root = false;

        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let name = e.name();
                    match name.as_ref() {
                        b"divelog" if !saw_root => {
                            saw_root = true;
                            handler.on_begin().map_err(DecodeError::Handler)?;
                            let program = attr(e, "program")?.unwrap_or_default();
                            let version = attr(e, "version")?.unwrap_or_default();
                            handler
                                .on_header(&program, &version)
                                .map_err(DecodeError::Handler)?;
                        }
                        b"divesites" if saw_root => self.decode_sites(handler)?,
                        b"dives" if saw_root => self.decode_dives(handler)?,
                        other => {
                            if !saw_root {
                                return Err(DecodeError::InvalidStructure(format!(
                                    "expected <divelog> root, found <{}>",
                                    String::from_utf8_lossy(other)
                                )));
                            }
                            self.skip_element(e, handler)?;
                        }
                    }
                }
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"divelog" if !saw_root => {
                        // Degenerate but well-formed: an export with no content.
                        saw_root = true;
                        handler.on_begin().map_err(DecodeError::Handler)?;
                        let program = attr(e, "program")?.unwrap_or_default();
                        let version = attr(e, "version")?.unwrap_or_default();
                        handler
                            .on_header(&program, &version)
                            .map_err(DecodeError::Handler)?;
                        handler.on_end().map_err(DecodeError::Handler)?;
                        return Ok(());
                    }
                    b"divesites" | b"dives" if saw_root => {}
                    other if saw_root => {
                        let element = String::from_utf8_lossy(other).into_owned();
                        debug!("skipping unsupported element <{element}>");
                        handler.on_skip(&element).map_err(DecodeError::Handler)?;
                    }
                    other => {
                        return Err(DecodeError::InvalidStructure(format!(
                            "expected <divelog> root, found <{}>",
                            String::from_utf8_lossy(other)
                        )));
                    }
                },
                Event::End(ref e) if e.name().as_ref() == b"divelog" => {
                    handler.on_end().map_err(DecodeError::Handler)?;
                    return Ok(());
                }
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        if saw_root {
                            "unexpected end of document inside <divelog>".to_string()
                        } else {
                            "document contains no <divelog> element".to_string()
                        },
                    ));
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Decode the `<divesites>` container.
    fn decode_sites<H: DecodeHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), DecodeError<H::Error>> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"site" => {
                        let site_id = self.begin_site(e, handler)?;
                        self.decode_site_children(site_id, handler)?;
                    }
                    _ => self.skip_element(e, handler)?,
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"site" => {
                        // A site with no geo children still registers.
                        self.begin_site(e, handler)?;
                    }
                    other => {
                        let element = String::from_utf8_lossy(other).into_owned();
                        handler.on_skip(&element).map_err(DecodeError::Handler)?;
                    }
                },
                Event::End(ref e) if e.name().as_ref() == b"divesites" => return Ok(()),
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        "unexpected end of document inside <divesites>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Report a `<site>` declaration and return its system identifier.
    fn begin_site<H: DecodeHandler>(
        &mut self,
        e: &BytesStart,
        handler: &mut H,
    ) -> Result<u32, DecodeError<H::Error>> {
        let record = SiteRecord {
            uuid: attr(e, "uuid")?.unwrap_or_default(),
            name: attr(e, "name")?.unwrap_or_default(),
            gps: attr(e, "gps")?.unwrap_or_default(),
            description: attr(e, "description")?.unwrap_or_default(),
        };
        handler.on_dive_site(record).map_err(DecodeError::Handler)
    }

    /// Decode the children of an open `<site>` element.
    ///
    /// Geo labels are delivered with the already-resolved site identifier,
    /// so they always arrive after their site within the same subtree.
    fn decode_site_children<H: DecodeHandler>(
        &mut self,
        site_id: u32,
        handler: &mut H,
    ) -> Result<(), DecodeError<H::Error>> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e)
                    if e.name().as_ref() == b"geo" =>
                {
                    let record = GeoRecord {
                        category: attr(e, "cat")?
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0),
                        label: attr(e, "value")?.unwrap_or_default(),
                    };
                    handler
                        .on_geo_label(site_id, record)
                        .map_err(DecodeError::Handler)?;
                }
                Event::Start(ref e) => self.skip_element(e, handler)?,
                Event::Empty(ref e) => {
                    let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    handler.on_skip(&element).map_err(DecodeError::Handler)?;
                }
                Event::End(ref e) if e.name().as_ref() == b"site" => return Ok(()),
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        "unexpected end of document inside <site>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Decode the `<dives>` container: trips and their dives.
    fn decode_dives<H: DecodeHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), DecodeError<H::Error>> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"trip" => {
                        let label = attr(e, "location")?.unwrap_or_default();
                        let trip_id = handler
                            .on_dive_trip(&label)
                            .map_err(DecodeError::Handler)?;
                        self.decode_trip_children(trip_id, handler)?;
                    }
                    b"dive" => {
                        // Trips own their dives; a stray dive means the
                        // decoder and the producer disagree about structure.
                        return Err(DecodeError::InvalidStructure(
                            "<dive> outside of a <trip>".to_string(),
                        ));
                    }
                    _ => self.skip_element(e, handler)?,
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"trip" => {
                        let label = attr(e, "location")?.unwrap_or_default();
                        handler
                            .on_dive_trip(&label)
                            .map_err(DecodeError::Handler)?;
                    }
                    b"dive" => {
                        return Err(DecodeError::InvalidStructure(
                            "<dive> outside of a <trip>".to_string(),
                        ));
                    }
                    other => {
                        let element = String::from_utf8_lossy(other).into_owned();
                        handler.on_skip(&element).map_err(DecodeError::Handler)?;
                    }
                },
                Event::End(ref e) if e.name().as_ref() == b"dives" => return Ok(()),
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        "unexpected end of document inside <dives>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Decode the children of an open `<trip>` element.
    fn decode_trip_children<H: DecodeHandler>(
        &mut self,
        trip_id: u32,
        handler: &mut H,
    ) -> Result<(), DecodeError<H::Error>> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"dive" => {
                        let record = self.decode_dive(e, false, trip_id)?;
                        handler.on_dive(record).map_err(DecodeError::Handler)?;
                    }
                    _ => self.skip_element(e, handler)?,
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"dive" => {
                        let record = self.decode_dive(e, true, trip_id)?;
                        handler.on_dive(record).map_err(DecodeError::Handler)?;
                    }
                    other => {
                        let element = String::from_utf8_lossy(other).into_owned();
                        handler.on_skip(&element).map_err(DecodeError::Handler)?;
                    }
                },
                Event::End(ref e) if e.name().as_ref() == b"trip" => return Ok(()),
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        "unexpected end of document inside <trip>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Decode one `<dive>` subtree into a flat record.
    fn decode_dive<E>(
        &mut self,
        start: &BytesStart,
        is_empty: bool,
        trip_id: u32,
    ) -> Result<DiveRecord, DecodeError<E>> {
        let mut record = DiveRecord {
            number: attr(start, "number")?.and_then(|v| v.parse().ok()).unwrap_or(0),
            rating: attr(start, "rating")?.and_then(|v| v.parse().ok()).unwrap_or(0),
            visibility: attr(start, "visibility")?
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            sac: attr(start, "sac")?.unwrap_or_default(),
            tags: tags::split_tag_list(&attr(start, "tags")?.unwrap_or_default()),
            site_ref: attr(start, "divesiteid")?.unwrap_or_default(),
            trip_id,
            water_salinity: attr(start, "watersalinity")?.unwrap_or_default(),
            timestamp: parse_timestamp(attr(start, "date")?, attr(start, "time")?)?,
            duration: attr(start, "duration")?.unwrap_or_default(),
            ..Default::default()
        };

        if is_empty {
            return Ok(record);
        }

        let mut buf = Vec::new();
        // Which text-bearing child element we are currently inside, if any.
        let mut text_target: Option<TextField> = None;
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"divemaster" => text_target = Some(TextField::DiveMaster),
                    b"buddy" => text_target = Some(TextField::Buddy),
                    b"notes" => text_target = Some(TextField::Notes),
                    b"suit" => text_target = Some(TextField::Suit),
                    b"cylinder" => {
                        record.cylinder = cylinder_record(e)?;
                        self.consume_subtree(e)?;
                    }
                    b"weightsystem" => {
                        record.weightsystem = weightsystem_record(e)?;
                        self.consume_subtree(e)?;
                    }
                    b"divetemperature" => {
                        record.manual_temperature = manual_temperature_record(e)?;
                        self.consume_subtree(e)?;
                    }
                    b"divecomputer" => {
                        record.computer = self.decode_computer(e)?;
                    }
                    _ => self.consume_subtree(e)?,
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"cylinder" => record.cylinder = cylinder_record(e)?,
                    b"weightsystem" => record.weightsystem = weightsystem_record(e)?,
                    b"divetemperature" => {
                        record.manual_temperature = manual_temperature_record(e)?
                    }
                    b"divecomputer" => {
                        record.computer = ComputerRecord {
                            model: attr(e, "model")?.unwrap_or_default(),
                            ..Default::default()
                        };
                    }
                    _ => {}
                },
                Event::Text(ref t) => {
                    if let Some(field) = text_target {
                        let text = t.unescape()?;
                        let target = match field {
                            TextField::DiveMaster => &mut record.dive_master,
                            TextField::Buddy => &mut record.buddy,
                            TextField::Notes => &mut record.notes,
                            TextField::Suit => &mut record.suit,
                        };
                        if !target.is_empty() {
                            target.push('\n');
                        }
                        target.push_str(text.trim());
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"dive" => return Ok(record),
                    b"divemaster" | b"buddy" | b"notes" | b"suit" => text_target = None,
                    _ => {}
                },
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        "unexpected end of document inside <dive>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Decode an open `<divecomputer>` subtree.
    ///
    /// Per-sample data is deliberately dropped; only the summary children
    /// are lifted.
    fn decode_computer<E>(
        &mut self,
        start: &BytesStart,
    ) -> Result<ComputerRecord, DecodeError<E>> {
        let mut record = ComputerRecord {
            model: attr(start, "model")?.unwrap_or_default(),
            ..Default::default()
        };

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                    b"depth" => {
                        record.depth_max = attr(e, "max")?.unwrap_or_default();
                        record.depth_mean = attr(e, "mean")?.unwrap_or_default();
                    }
                    b"temperature" => {
                        record.temperature_water_min = attr(e, "water")?.unwrap_or_default();
                    }
                    b"surface" => {
                        record.surface_pressure = attr(e, "pressure")?.unwrap_or_default();
                    }
                    _ => {}
                },
                Event::End(ref e) if e.name().as_ref() == b"divecomputer" => return Ok(record),
                Event::Eof => {
                    return Err(DecodeError::InvalidStructure(
                        "unexpected end of document inside <divecomputer>".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Report `e` as skipped and consume its whole subtree.
    fn skip_element<H: DecodeHandler>(
        &mut self,
        e: &BytesStart,
        handler: &mut H,
    ) -> Result<(), DecodeError<H::Error>> {
        let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        debug!("skipping unsupported element <{element}>");
        handler.on_skip(&element).map_err(DecodeError::Handler)?;
        self.consume_subtree(e)
    }

    /// Consume everything up to and including the end tag of `e`.
    fn consume_subtree<E>(&mut self, e: &BytesStart) -> Result<(), DecodeError<E>> {
        let mut skip_buf = Vec::new();
        let end = e.to_end().into_owned();
        self.reader.read_to_end_into(end.name(), &mut skip_buf)?;
        Ok(())
    }
}

/// Which text-bearing dive child is currently open.
#[derive(Debug, Clone, Copy)]
enum TextField {
    DiveMaster,
    Buddy,
    Notes,
    Suit,
}

/// Extract a cylinder record from element attributes.
fn cylinder_record<E>(e: &BytesStart) -> Result<CylinderRecord, DecodeError<E>> {
    Ok(CylinderRecord {
        size: attr(e, "size")?.unwrap_or_default(),
        work_pressure: attr(e, "workpressure")?.unwrap_or_default(),
        description: attr(e, "description")?.unwrap_or_default(),
        start: attr(e, "start")?.unwrap_or_default(),
        end: attr(e, "end")?.unwrap_or_default(),
        o2: attr(e, "o2")?.unwrap_or_default(),
    })
}

/// Extract a weightsystem record from element attributes.
fn weightsystem_record<E>(e: &BytesStart) -> Result<WeightsystemRecord, DecodeError<E>> {
    Ok(WeightsystemRecord {
        weight: attr(e, "weight")?.unwrap_or_default(),
        description: attr(e, "description")?.unwrap_or_default(),
    })
}

/// Extract a manual-temperature record from element attributes.
fn manual_temperature_record<E>(
    e: &BytesStart,
) -> Result<ManualTemperatureRecord, DecodeError<E>> {
    Ok(ManualTemperatureRecord {
        air: attr(e, "air")?.unwrap_or_default(),
        water: attr(e, "water")?.unwrap_or_default(),
    })
}

/// Parse the `date` and `time` attributes into one timestamp.
///
/// A dive without a parsable date is a malformed export, not a domain
/// fallback. A missing time defaults to midnight.
fn parse_timestamp<E>(
    date: Option<String>,
    time: Option<String>,
) -> Result<NaiveDateTime, DecodeError<E>> {
    let raw_date = date.ok_or_else(|| {
        DecodeError::InvalidAttributeValue("dive is missing a date".to_string())
    })?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|_| {
        DecodeError::InvalidAttributeValue(format!("unparsable dive date {raw_date:?}"))
    })?;

    let time = match time {
        Some(raw_time) => NaiveTime::parse_from_str(&raw_time, "%H:%M:%S").map_err(|_| {
            DecodeError::InvalidAttributeValue(format!("unparsable dive time {raw_time:?}"))
        })?,
        None => NaiveTime::MIN,
    };

    Ok(date.and_time(time))
}

/// Helper to read one attribute value from an element.
fn attr<E>(e: &BytesStart, name: &str) -> Result<Option<String>, DecodeError<E>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DecodeError::Xml(quick_xml::Error::from(err)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::fmt;

    use super::*;

    const MINIMAL_DIVELOG: &str = r#"<?xml version="1.0"?>
<divelog program="subsurface" version="3">
  <settings>
    <fingerprint model="deadbeef"/>
  </settings>
  <divesites>
    <site uuid="8e0546e3" name="Blue Hole, Gozo" gps="36.0012 14.3258" description="tags:_region_mediterranean Collapsed cave system">
      <geo cat="2" origin="0" value="Malta"/>
      <geo cat="2" origin="0" value="Malta"/>
    </site>
  </divesites>
  <dives>
    <trip date="2023-08-12" location="Malta 2023">
      <dive number="42" rating="5" visibility="4" tags="wreck, _award_100th-dive" divesiteid="8e0546e3" date="2023-08-12" time="10:30:00" duration="45:30 min">
        <divemaster>Ana</divemaster>
        <buddy>Marko</buddy>
        <notes>Great viz.</notes>
        <suit>Drysuit</suit>
        <cylinder size="12.0 l" workpressure="232.0 bar" description="HP100" start="200.0 bar" end="70.0 bar" o2="32.0%"/>
        <weightsystem weight="6.0 kg" description="belt"/>
        <divetemperature air="28.0 C" water="22.0 C"/>
        <divecomputer model="Perdix 2" deviceid="cafe">
          <depth max="31.2 m" mean="14.8 m"/>
          <temperature water="21.0 C"/>
          <surface pressure="1.013 bar"/>
        </divecomputer>
      </dive>
    </trip>
  </dives>
</divelog>"#;

    /// Records the event sequence and hands out sequential identifiers.
    #[derive(Default)]
    struct RecordingHandler {
        events: Vec<String>,
        sites: u32,
        trips: u32,
        dives: u32,
        last_dive: Option<DiveRecord>,
    }

    impl DecodeHandler for RecordingHandler {
        type Error = Infallible;

        fn on_begin(&mut self) -> Result<(), Infallible> {
            self.events.push("begin".to_string());
            Ok(())
        }

        fn on_header(&mut self, program: &str, version: &str) -> Result<(), Infallible> {
            self.events.push(format!("header {program} {version}"));
            Ok(())
        }

        fn on_dive_site(&mut self, record: SiteRecord) -> Result<u32, Infallible> {
            self.sites += 1;
            self.events.push(format!("site {}", record.uuid));
            Ok(self.sites)
        }

        fn on_geo_label(&mut self, site_id: u32, record: GeoRecord) -> Result<(), Infallible> {
            self.events
                .push(format!("geo {site_id} {} {}", record.category, record.label));
            Ok(())
        }

        fn on_dive_trip(&mut self, label: &str) -> Result<u32, Infallible> {
            self.trips += 1;
            self.events.push(format!("trip {label}"));
            Ok(self.trips)
        }

        fn on_dive(&mut self, record: DiveRecord) -> Result<u32, Infallible> {
            self.dives += 1;
            self.events
                .push(format!("dive {} trip={}", record.number, record.trip_id));
            self.last_dive = Some(record);
            Ok(self.dives)
        }

        fn on_skip(&mut self, element: &str) -> Result<(), Infallible> {
            self.events.push(format!("skip {element}"));
            Ok(())
        }

        fn on_end(&mut self) -> Result<(), Infallible> {
            self.events.push("end".to_string());
            Ok(())
        }
    }

    fn decode_str(input: &str) -> Result<RecordingHandler, DecodeError<Infallible>> {
        let mut handler = RecordingHandler::default();
        let decoder = Decoder::new(std::io::Cursor::new(input.as_bytes().to_vec()));
        decoder.decode(&mut handler)?;
        Ok(handler)
    }

    #[test]
    fn test_event_order() {
        let handler = decode_str(MINIMAL_DIVELOG).unwrap();
        assert_eq!(
            handler.events,
            vec![
                "begin",
                "header subsurface 3",
                "skip settings",
                "site 8e0546e3",
                "geo 1 2 Malta",
                "geo 1 2 Malta",
                "trip Malta 2023",
                "dive 42 trip=1",
                "end",
            ]
        );
    }

    #[test]
    fn test_dive_record_fields() {
        let handler = decode_str(MINIMAL_DIVELOG).unwrap();
        let dive = handler.last_dive.expect("one dive decoded");

        assert_eq!(dive.number, 42);
        assert_eq!(dive.rating, 5);
        assert_eq!(dive.visibility, 4);
        assert_eq!(dive.tags, vec!["wreck", "_award_100th-dive"]);
        assert_eq!(dive.site_ref, "8e0546e3");
        assert_eq!(dive.trip_id, 1);
        assert_eq!(dive.duration, "45:30 min");
        assert_eq!(dive.timestamp.to_string(), "2023-08-12 10:30:00");
        assert_eq!(dive.dive_master, "Ana");
        assert_eq!(dive.buddy, "Marko");
        assert_eq!(dive.notes, "Great viz.");
        assert_eq!(dive.suit, "Drysuit");
        assert_eq!(dive.cylinder.description, "HP100");
        assert_eq!(dive.cylinder.o2, "32.0%");
        assert_eq!(dive.weightsystem.weight, "6.0 kg");
        assert_eq!(dive.manual_temperature.water, "22.0 C");
        assert_eq!(dive.computer.model, "Perdix 2");
        assert_eq!(dive.computer.depth_max, "31.2 m");
        assert_eq!(dive.computer.surface_pressure, "1.013 bar");
    }

    #[test]
    fn test_truncated_document_is_an_error() {
        let truncated = &MINIMAL_DIVELOG[..MINIMAL_DIVELOG.len() - 60];
        assert!(decode_str(truncated).is_err());
    }

    #[test]
    fn test_wrong_root_is_an_error() {
        let result = decode_str("<divesites><site uuid='x'/></divesites>");
        assert!(matches!(result, Err(DecodeError::InvalidStructure(_))));
    }

    #[test]
    fn test_dive_outside_trip_is_an_error() {
        let doc = r#"<divelog program="subsurface" version="3">
  <dives>
    <dive number="1" date="2023-01-01" time="09:00:00"/>
  </dives>
</divelog>"#;
        let result = decode_str(doc);
        assert!(matches!(result, Err(DecodeError::InvalidStructure(_))));
    }

    #[test]
    fn test_unparsable_date_is_an_error() {
        let doc = r#"<divelog program="subsurface" version="3">
  <dives>
    <trip location="x">
      <dive number="1" date="yesterday" time="09:00:00"/>
    </trip>
  </dives>
</divelog>"#;
        let result = decode_str(doc);
        assert!(matches!(result, Err(DecodeError::InvalidAttributeValue(_))));
    }

    #[test]
    fn test_empty_divelog() {
        let handler = decode_str(r#"<divelog program="subsurface" version="3"/>"#).unwrap();
        assert_eq!(handler.events, vec!["begin", "header subsurface 3", "end"]);
    }

    #[derive(Debug)]
    struct Rejected;

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "rejected")
        }
    }

    impl std::error::Error for Rejected {}

    /// Fails every site event; the decode must stop at the first one.
    struct RejectingHandler {
        events: u32,
    }

    impl DecodeHandler for RejectingHandler {
        type Error = Rejected;

        fn on_begin(&mut self) -> Result<(), Rejected> {
            self.events += 1;
            Ok(())
        }

        fn on_header(&mut self, _: &str, _: &str) -> Result<(), Rejected> {
            self.events += 1;
            Ok(())
        }

        fn on_dive_site(&mut self, _: SiteRecord) -> Result<u32, Rejected> {
            Err(Rejected)
        }

        fn on_geo_label(&mut self, _: u32, _: GeoRecord) -> Result<(), Rejected> {
            self.events += 1;
            Ok(())
        }

        fn on_dive_trip(&mut self, _: &str) -> Result<u32, Rejected> {
            self.events += 1;
            Ok(1)
        }

        fn on_dive(&mut self, _: DiveRecord) -> Result<u32, Rejected> {
            self.events += 1;
            Ok(1)
        }

        fn on_skip(&mut self, _: &str) -> Result<(), Rejected> {
            self.events += 1;
            Ok(())
        }

        fn on_end(&mut self) -> Result<(), Rejected> {
            self.events += 1;
            Ok(())
        }
    }

    #[test]
    fn test_handler_error_aborts_decode() {
        let mut handler = RejectingHandler { events: 0 };
        let decoder = Decoder::new(std::io::Cursor::new(MINIMAL_DIVELOG.as_bytes().to_vec()));
        let result = decoder.decode(&mut handler);
        assert!(matches!(result, Err(DecodeError::Handler(Rejected))));
        // begin + header + the settings skip, then the site rejection.
        assert_eq!(handler.events, 3);
    }
}
