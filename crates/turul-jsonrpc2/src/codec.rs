//! Streaming JSON codec.
//!
//! Outgoing messages are written as one JSON document followed by `\n`.
//! Incoming bytes may hold consecutive JSON documents separated by any
//! whitespace. A document that is not valid JSON, or valid JSON of the wrong
//! shape, is yielded as an `Err` item so the connection can report it and
//! keep reading.
//!
//! After a syntax error the input is resynchronised at the first newline or
//! `{` at or after the error position. When neither has arrived yet the
//! buffered bytes are dropped, so the error is reported without waiting for
//! more input.
//!
//! A partially received object or array is only re-parsed once its brackets
//! balance, a new line arrives, or the buffer has doubled since the last
//! attempt; the bytes in between are scanned once.

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Default upper bound on a single buffered message
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// One decoded message, or the reason it could not be decoded
pub type Decoded<T> = Result<T, serde_json::Error>;

pub struct JsonCodec<In> {
    max_message_size: usize,
    scan: BracketScan,
    _decodes: PhantomData<fn() -> In>,
}

/// Bracket depth over the bytes of the pending message examined so far
#[derive(Debug, Default)]
struct BracketScan {
    offset: usize,
    parsed_len: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl BracketScan {
    /// Examine the bytes past `offset`; true once the outermost bracket closes
    fn advance(&mut self, buf: &[u8]) -> bool {
        while self.offset < buf.len() {
            let byte = buf[self.offset];
            self.offset += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }
}

impl<In> JsonCodec<In> {
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            scan: BracketScan::default(),
            _decodes: PhantomData,
        }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn check_size(&self, src: &BytesMut) -> Result<(), CodecError> {
        if src.len() > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                limit: self.max_message_size,
            });
        }
        Ok(())
    }
}

impl<In> Default for JsonCodec<In> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In> std::fmt::Debug for JsonCodec<In> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCodec")
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}

impl<In: DeserializeOwned> Decoder for JsonCodec<In> {
    type Item = Decoded<In>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(0) => {}
            Some(start) => {
                src.advance(start);
                self.scan = BracketScan::default();
            }
            None => {
                src.clear();
                self.scan = BracketScan::default();
                return Ok(None);
            }
        }

        if matches!(src[0], b'{' | b'[') {
            let scanned = self.scan.offset;
            let complete = self.scan.advance(src);
            if !complete
                && src.len() < 2 * self.scan.parsed_len
                && !src[scanned..].contains(&b'\n')
            {
                self.check_size(src)?;
                return Ok(None);
            }
        }

        let (next, consumed) = {
            let mut stream = serde_json::Deserializer::from_slice(&src[..]).into_iter::<Value>();
            let next = stream.next();
            (next, stream.byte_offset())
        };

        match next {
            Some(Ok(value)) => {
                if consumed > self.max_message_size {
                    return Err(CodecError::MessageTooLarge {
                        limit: self.max_message_size,
                    });
                }
                src.advance(consumed);
                self.scan = BracketScan::default();
                Ok(Some(serde_json::from_value(value)))
            }
            Some(Err(err)) if err.is_eof() => {
                self.check_size(src)?;
                self.scan.parsed_len = src.len();
                Ok(None)
            }
            Some(Err(err)) => {
                let from = error_offset(src, &err).max(1);
                match src[from..].iter().position(|b| matches!(b, b'\n' | b'{')) {
                    Some(pos) if src[from + pos] == b'\n' => src.advance(from + pos + 1),
                    Some(pos) => src.advance(from + pos),
                    None => src.clear(),
                }
                self.scan = BracketScan::default();
                Ok(Some(Err(err)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        if src.iter().all(u8::is_ascii_whitespace) {
            src.clear();
            return Ok(None);
        }

        let trailing = serde_json::from_slice::<In>(&src[..]);
        src.clear();
        self.scan = BracketScan::default();
        Ok(Some(trailing))
    }
}

/// Byte offset in `buf` of the position a syntax error was reported at
fn error_offset(buf: &[u8], err: &serde_json::Error) -> usize {
    let mut line_start = 0;
    for _ in 1..err.line() {
        match buf[line_start..].iter().position(|b| *b == b'\n') {
            Some(newline) => line_start += newline + 1,
            None => break,
        }
    }
    (line_start + err.column().saturating_sub(1)).min(buf.len())
}

impl<In, Out: Serialize> Encoder<Out> for JsonCodec<In> {
    type Error = CodecError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)?;
        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use serde_json::json;

    fn decode_all(codec: &mut JsonCodec<Request>, input: &str) -> Vec<Decoded<Request>> {
        let mut buf = BytesMut::from(input.as_bytes());
        let mut items = Vec::new();
        while let Some(item) = codec.decode_eof(&mut buf).unwrap() {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_decode_newline_delimited() {
        let mut codec = JsonCodec::<Request>::new();
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"A.a","id":"1"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"B.b","id":"2"}"#,
            "\n"
        );

        let items = decode_all(&mut codec, input);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().method, "A.a");
        assert_eq!(items[1].as_ref().unwrap().method, "B.b");
    }

    #[test]
    fn test_decode_without_framing() {
        let mut codec = JsonCodec::<Request>::new();
        let input = r#"{"method":"A.a"}{"method":"B.b"}  {"method":"C.c"}"#;

        let methods: Vec<String> = decode_all(&mut codec, input)
            .into_iter()
            .map(|item| item.unwrap().method)
            .collect();
        assert_eq!(methods, vec!["A.a", "B.b", "C.c"]);
    }

    #[test]
    fn test_partial_message_waits_for_more() {
        let mut codec = JsonCodec::<Request>::new();
        let mut buf = BytesMut::from(&br#"{"method":"A."#[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(br#"a"}"#);
        let request = codec.decode(&mut buf).unwrap().unwrap().unwrap();
        assert_eq!(request.method, "A.a");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_syntax_error_resyncs_at_newline() {
        let mut codec = JsonCodec::<Request>::new();
        let input = concat!("{not json}\n", r#"{"method":"A.a","id":"2"}"#, "\n");

        let items = decode_all(&mut codec, input);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_err());
        assert_eq!(items[1].as_ref().unwrap().method, "A.a");
    }

    #[test]
    fn test_syntax_error_without_newline_is_reported_at_once() {
        let mut codec = JsonCodec::<Request>::new();
        let mut buf = BytesMut::from(&b"{bad}"[..]);

        let item = codec.decode(&mut buf).unwrap().expect("error item");
        assert!(item.is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_resync_keeps_request_on_same_line() {
        let mut codec = JsonCodec::<Request>::new();
        let input = concat!(r#"{"bad": } {"method":"A.b","id":"second"}"#, "\n");

        let items = decode_all(&mut codec, input);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_err());
        let request = items[1].as_ref().unwrap();
        assert_eq!(request.method, "A.b");
        assert_eq!(request.id, "second".into());
    }

    #[test]
    fn test_brackets_inside_strings_do_not_end_a_message() {
        let mut codec = JsonCodec::<Request>::new();
        let mut buf = BytesMut::from(&br#"{"method":"A.b","params":["}{][\""]"#[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(br#","id":"x"}"#);
        let request = codec.decode(&mut buf).unwrap().unwrap().unwrap();
        assert_eq!(request.params, vec![json!("}{][\"")]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_message_is_scanned_once() {
        let mut codec = JsonCodec::<Request>::new();
        let mut buf = BytesMut::from(&br#"{"method":"A.b","params":["#[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(codec.scan.offset, buf.len());

        // More of the same message without a line break: scanned, not parsed
        buf.extend_from_slice(br#"1, 2, {"k": "]"}"#);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(codec.scan.offset, buf.len());
        assert_eq!(codec.scan.depth, 2);
        assert_eq!(codec.scan.parsed_len, 26);

        buf.extend_from_slice(b"]}");
        let request = codec.decode(&mut buf).unwrap().unwrap().unwrap();
        assert_eq!(request.params, vec![json!(1), json!(2), json!({"k": "]"})]);
        assert_eq!(codec.scan.offset, 0);
    }

    #[test]
    fn test_late_syntax_error_is_reported_once_buffer_doubles() {
        let mut codec = JsonCodec::<Request>::new();
        let mut buf = BytesMut::from(&br#"{"method":"#[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b" nope");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b" nope nope");
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_bracket_scan_tracks_escapes() {
        let mut scan = BracketScan::default();
        assert!(!scan.advance(br#"{"a": "\"}""#));
        assert_eq!(scan.depth, 1);
        assert!(!scan.in_string);

        let full = br#"{"a": "\"}", "b": [1, {"c": 2}]}"#;
        assert!(scan.advance(full));
        assert_eq!(scan.offset, full.len());
    }

    #[test]
    fn test_wrong_shape_is_an_error_item() {
        let mut codec = JsonCodec::<Request>::new();
        let items = decode_all(&mut codec, "[1, 2, 3]\n{\"method\": 5}\n");
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.is_err()));
    }

    #[test]
    fn test_trailing_garbage_at_eof() {
        let mut codec = JsonCodec::<Request>::new();
        let items = decode_all(&mut codec, r#"{"method":"A.a"}{"method""#);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn test_whitespace_only_is_end_of_stream() {
        let mut codec = JsonCodec::<Request>::new();
        assert!(decode_all(&mut codec, "  \n\t\n").is_empty());
    }

    #[test]
    fn test_oversized_message() {
        let mut codec = JsonCodec::<Request>::with_max_message_size(16);
        let mut buf = BytesMut::from(&br#"{"method":"Class.SomethingLong","#[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::MessageTooLarge { limit: 16 }));
    }

    #[test]
    fn test_oversized_complete_message() {
        let mut codec = JsonCodec::<Request>::with_max_message_size(16);
        let mut buf = BytesMut::from(&br#"{"method":"Class.SomethingLong"}"#[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::MessageTooLarge { limit: 16 }));
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = JsonCodec::<Request>::new();
        let mut buf = BytesMut::new();
        codec.encode(json!({"jsonrpc": "2.0"}), &mut buf).unwrap();
        assert_eq!(&buf[..], b"{\"jsonrpc\":\"2.0\"}\n");
    }
}
