//! Parsed notification records and their typed accessors.

use std::collections::HashMap;

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;

use crate::error::ParseError;

/// The `eventType` value a camera reports for video motion detection.
pub const MOTION_EVENT_TYPE: &str = "VMD";

/// One parsed notification record.
///
/// A record is a flat map from leaf element name to text content. Namespace
/// prefixes are stripped, so `<ns:channelID>1</ns:channelID>` and
/// `<channelID>1</channelID>` both produce the `channelID` key. If a tag
/// repeats within one record the last occurrence wins; the wire format is not
/// expected to repeat tags.
///
/// Records are created per notification, consumed synchronously by the
/// registered handler, and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    fields: HashMap<String, String>,
}

impl EventRecord {
    /// Create a record directly from a field map.
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Parse one framed `EventNotificationAlert` record.
    ///
    /// Malformed XML is reported as [`ParseError::Xml`]; the caller is
    /// expected to drop the record and keep reading the stream.
    pub fn from_xml(xml: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(xml);
        let mut fields = HashMap::new();
        let mut stack: Vec<String> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(XmlEvent::Start(start)) => {
                    let local = start.local_name();
                    stack.push(String::from_utf8_lossy(local.as_ref()).into_owned());
                }
                Ok(XmlEvent::End(_)) => {
                    stack.pop();
                }
                Ok(XmlEvent::Text(text)) => {
                    // Only leaf elements below the record root carry fields.
                    if stack.len() > 1 {
                        let value = text
                            .unescape()
                            .map_err(|e| ParseError::Xml(e.to_string()))?;
                        let value = value.trim();
                        if !value.is_empty() {
                            if let Some(name) = stack.last() {
                                fields.insert(name.clone(), value.to_string());
                            }
                        }
                    }
                }
                Ok(XmlEvent::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(ParseError::Xml(e.to_string())),
            }
        }

        Ok(Self { fields })
    }

    /// Look up a raw field value.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The camera channel that produced this record.
    pub fn channel_id(&self) -> Result<u32, ParseError> {
        let raw = self
            .fields
            .get("channelID")
            .ok_or(ParseError::MissingField("channelID"))?;
        raw.parse().map_err(|_| ParseError::InvalidField {
            field: "channelID",
            value: raw.clone(),
        })
    }

    /// The record's event type, e.g. [`MOTION_EVENT_TYPE`].
    pub fn event_type(&self) -> Option<&str> {
        self.get("eventType")
    }

    /// The time of day the record carries, as an HHMM integer.
    ///
    /// Extracted from the `dateTime` field: the portion after the `T`
    /// separator with colons removed, truncated to four digits. A stamp of
    /// `2024-05-01T18:23:45+08:00` yields `1823`.
    pub fn clock_time(&self) -> Result<u16, ParseError> {
        let raw = self
            .fields
            .get("dateTime")
            .ok_or(ParseError::MissingField("dateTime"))?;
        let invalid = || ParseError::InvalidField {
            field: "dateTime",
            value: raw.clone(),
        };

        let (_, time) = raw.split_once('T').ok_or_else(invalid)?;
        let digits: String = time.chars().filter(|c| *c != ':').take(4).collect();
        if digits.len() < 4 {
            return Err(invalid());
        }
        digits.parse().map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOTION_RECORD: &str = r#"<EventNotificationAlert version="2.0" xmlns="http://www.hikvision.com/ver20/XMLSchema">
<ipAddress>192.168.1.64</ipAddress>
<channelID>1</channelID>
<dateTime>2024-05-01T18:23:45+08:00</dateTime>
<activePostCount>1</activePostCount>
<eventType>VMD</eventType>
<eventState>active</eventState>
<eventDescription>Motion alarm</eventDescription>
</EventNotificationAlert>"#;

    #[test]
    fn parses_leaf_fields() {
        let record = EventRecord::from_xml(MOTION_RECORD).unwrap();
        assert_eq!(record.get("ipAddress"), Some("192.168.1.64"));
        assert_eq!(record.get("eventState"), Some("active"));
        assert_eq!(record.get("eventDescription"), Some("Motion alarm"));
        assert_eq!(record.event_type(), Some(MOTION_EVENT_TYPE));
    }

    #[test]
    fn strips_namespace_prefixes() {
        let xml = r#"<ns:EventNotificationAlert xmlns:ns="http://example.com/schema">
<ns:channelID>2</ns:channelID>
<ns:eventType>VMD</ns:eventType>
</ns:EventNotificationAlert>"#;
        let record = EventRecord::from_xml(xml).unwrap();
        assert_eq!(record.channel_id().unwrap(), 2);
        assert_eq!(record.event_type(), Some("VMD"));
    }

    #[test]
    fn channel_id_parses_as_integer() {
        let record = EventRecord::from_xml(MOTION_RECORD).unwrap();
        assert_eq!(record.channel_id().unwrap(), 1);
    }

    #[test]
    fn channel_id_missing_is_an_error() {
        let record = EventRecord::from_xml("<EventNotificationAlert></EventNotificationAlert>")
            .unwrap();
        assert!(matches!(
            record.channel_id(),
            Err(ParseError::MissingField("channelID"))
        ));
    }

    #[test]
    fn clock_time_truncates_to_four_digits() {
        let record = EventRecord::from_xml(MOTION_RECORD).unwrap();
        assert_eq!(record.clock_time().unwrap(), 1823);
    }

    #[test]
    fn clock_time_parses_early_morning_times() {
        let record = EventRecord::new(HashMap::from([(
            "dateTime".to_string(),
            "2024-05-01T00:05:00".to_string(),
        )]));
        assert_eq!(record.clock_time().unwrap(), 5);
    }

    #[test]
    fn clock_time_rejects_stamp_without_time_part() {
        let record = EventRecord::new(HashMap::from([(
            "dateTime".to_string(),
            "2024-05-01".to_string(),
        )]));
        assert!(matches!(
            record.clock_time(),
            Err(ParseError::InvalidField { field: "dateTime", .. })
        ));
    }

    #[test]
    fn malformed_xml_is_reported() {
        let result = EventRecord::from_xml(
            "<EventNotificationAlert><channelID>1</wrongTag></EventNotificationAlert>",
        );
        assert!(matches!(result, Err(ParseError::Xml(_))));
    }

    #[test]
    fn repeated_tag_keeps_last_value() {
        let xml = r#"<EventNotificationAlert>
<eventType>IO</eventType>
<eventType>VMD</eventType>
</EventNotificationAlert>"#;
        let record = EventRecord::from_xml(xml).unwrap();
        assert_eq!(record.event_type(), Some("VMD"));
    }
}
