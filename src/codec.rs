//! On-disk format of intermediate files.
//!
//! Each key-value pair is one JSON object on its own line:
//!
//! ```text
//! {"key":"a","value":"1"}
//! {"key":[255,0],"value":"quote \" and\nnewline"}
//! ```
//!
//! Keys and values that are valid UTF-8 are written as JSON strings, anything
//! else as an array of byte values. JSON escaping takes care of quotes and
//! newlines, so every byte string round-trips exactly and a reader never needs
//! to know the number of records up front.

use std::io::{self, Read, Write};

use crate::KeyValue;

/// Streaming decoder over a JSON Lines record stream.
pub type RecordReader<R> =
    serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, KeyValue>;

/// Writes `records` to `writer`, one line per record.
pub fn write_records<W: Write>(writer: &mut W, records: &[KeyValue]) -> io::Result<()> {
    for kv in records {
        serde_json::to_writer(&mut *writer, kv)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Encodes `records` into an in-memory buffer.
pub fn encode_records(records: &[KeyValue]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_records(&mut buf, records)?;
    Ok(buf)
}

/// Returns an iterator that decodes records from `reader` as they are read.
pub fn reader<R: Read>(reader: R) -> RecordReader<R> {
    serde_json::Deserializer::from_reader(reader).into_iter()
}

/// Decodes every record in `buf`.
pub fn decode_records(buf: &[u8]) -> serde_json::Result<Vec<KeyValue>> {
    reader(buf).collect()
}

/// Serde adapter writing [`bytes::Bytes`] as a string when possible and as a
/// byte array otherwise.
pub mod text_bytes {
    use std::fmt;

    use bytes::Bytes;
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(bytes) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => serializer.collect_seq(bytes.iter()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        deserializer.deserialize_any(BytesVisitor)
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Bytes;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or an array of bytes")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Bytes, E> {
            Ok(Bytes::copy_from_slice(v.as_bytes()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Bytes, E> {
            Ok(Bytes::from(v))
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Bytes, E> {
            Ok(Bytes::copy_from_slice(v))
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Bytes, E> {
            Ok(Bytes::from(v))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Bytes, A::Error> {
            let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                buf.push(byte);
            }
            Ok(Bytes::from(buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn round_trip(records: &[KeyValue]) -> Vec<KeyValue> {
        let buf = encode_records(records).unwrap();
        decode_records(&buf).unwrap()
    }

    #[test]
    fn awkward_text_round_trips() {
        let records = vec![
            KeyValue::new("say \"hi\"", "line one\nline two\r\n"),
            KeyValue::new("", ""),
            KeyValue::new("{\"key\":\"fake\"}", "\\n is not a newline"),
            KeyValue::new("tab\there", "\u{0}\u{1f}\u{7f}"),
            KeyValue::new("ünïcödé", "\u{1F980}"),
        ];
        assert_eq!(round_trip(&records), records);
    }

    #[test]
    fn non_utf8_bytes_round_trip() {
        let records = vec![
            KeyValue::new(Bytes::from_static(&[0xff, 0xfe, b'\n', 0]), "ok"),
            KeyValue::new("ok", Bytes::from_static(&[0xc3, 0x28])),
        ];
        assert_eq!(round_trip(&records), records);
    }

    #[test]
    fn one_line_per_record() {
        let records = vec![KeyValue::new("a", "x\ny"), KeyValue::new("b", "1")];
        let buf = encode_records(&records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "{\"key\":\"a\",\"value\":\"x\\ny\"}\n{\"key\":\"b\",\"value\":\"1\"}\n"
        );
    }

    #[test]
    fn invalid_utf8_is_written_as_array() {
        let buf = encode_records(&[KeyValue::new(Bytes::from_static(&[0xff]), "v")]).unwrap();
        assert_eq!(buf, b"{\"key\":[255],\"value\":\"v\"}\n");
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(decode_records(b"").unwrap().is_empty());
    }

    #[test]
    fn truncated_record_is_an_error() {
        assert!(decode_records(b"{\"key\":\"a\",\"val").is_err());
    }

    #[test]
    fn reader_streams_records() {
        let buf = encode_records(&[KeyValue::new("a", "1"), KeyValue::new("b", "2")]).unwrap();
        let mut iter = reader(buf.as_slice());
        assert_eq!(iter.next().unwrap().unwrap(), KeyValue::new("a", "1"));
        assert_eq!(iter.next().unwrap().unwrap(), KeyValue::new("b", "2"));
        assert!(iter.next().is_none());
    }
}
