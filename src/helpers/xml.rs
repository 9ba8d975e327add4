//! XML reading utilities shared by the OOXML and OpenDocument readers.
//! Wraps the quick-xml reader and adds attribute and text helpers.

use crate::error::PriceSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while decoding XML content.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),

    #[error("Parse attribute value '{0}' failed")]
    ParseAttributeValueError(String),
}

/// Event reader over a spreadsheet part, reusing one buffer for all events.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // `<c r="A1"/>` must produce both a start and an end event
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Reads the next event, returning `None` at end of input.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, PriceSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(PriceSheetError::XmlError(error)),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, PriceSheetError>;

    fn parse_value<T: FromStr>(&self) -> Result<T, PriceSheetError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, PriceSheetError> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> Result<T, PriceSheetError> {
        self.get_value()?
            .parse()
            .map_err(|_| match std::str::from_utf8(&self.value) {
                Ok(value) => XmlError::ParseAttributeValueError(value.to_string()).into(),
                Err(error) => PriceSheetError::StringEncodingError(error),
            })
    }
}

/// Attribute lookup on element start events.
pub(crate) trait XmlNodeHelper<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, PriceSheetError>;

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, PriceSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, PriceSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, PriceSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }
}

/// Accumulates character data from text and entity events.
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), PriceSheetError>;

    /// Appends a character reference (`&#233;`, `&#xE9;`) or a predefined entity (`&amp;`).
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), PriceSheetError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), PriceSheetError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), PriceSheetError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Drives an `XmlReader` to the end of input, dispatching each event to the given arms.
/// Unmatched events are ignored.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_xml_events;
    use quick_xml::name::QName;

    fn collect_text(xml: &str) -> Result<String, PriceSheetError> {
        let mut reader = XmlReader::new(xml.as_bytes());
        let mut text = String::new();
        match_xml_events!(reader => {
            Event::Text(event) => text.push_bytes_text(&event)?,
            Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
        });
        Ok(text)
    }

    #[test]
    fn resolves_entities_and_character_references() {
        let text = collect_text("<t>C&#211;DIGO &amp; DESCRIPCI&#xD3;N</t>").unwrap();
        assert_eq!(text, "CÓDIGO & DESCRIPCIÓN");
    }

    #[test]
    fn rejects_unknown_entities() {
        assert!(collect_text("<t>&unknown;</t>").is_err());
    }

    #[test]
    fn reads_and_parses_attributes() -> Result<(), PriceSheetError> {
        let mut reader = XmlReader::new(r#"<row r="12" spans="1:3"/>"#.as_bytes());
        let mut number = None;
        let mut spans = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == QName(b"row") => {
                number = event.parse_attribute_value::<usize>("r")?;
                spans = event.get_attribute_value("spans")?.map(|value| value.to_string());
            }
        });
        assert_eq!(number, Some(12));
        assert_eq!(spans.as_deref(), Some("1:3"));
        Ok(())
    }

    #[test]
    fn reports_unparseable_attribute_values() {
        let mut reader = XmlReader::new(r#"<row r="twelve"/>"#.as_bytes());
        let mut outcome = None;
        while let Some(event) = reader.next().unwrap() {
            if let Event::Start(event) = event {
                outcome = Some(event.parse_attribute_value::<usize>("r"));
            }
        }
        assert!(matches!(outcome, Some(Err(PriceSheetError::XmlHelperError(_)))));
    }
}
