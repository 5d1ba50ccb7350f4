//! XML-RPC wire encoding
//!
//! Encodes `methodCall` documents and decodes `methodResponse` documents,
//! including `fault` responses, using quick-xml's pull parser.

use super::value::RpcValue;
use crate::domain::TracError;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Layouts accepted for `dateTime.iso8601`
const DATETIME_FORMATS: [&str; 2] = ["%Y%m%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Encodes a `methodCall` document
pub fn encode_call(method: &str, params: &[RpcValue]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params>");
    for param in params {
        xml.push_str("<param>");
        encode_value(&mut xml, param);
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>");
    xml
}

fn encode_value(xml: &mut String, value: &RpcValue) {
    xml.push_str("<value>");
    match value {
        RpcValue::Int(i) => {
            let _ = write!(xml, "<int>{i}</int>");
        }
        RpcValue::Boolean(b) => {
            let _ = write!(xml, "<boolean>{}</boolean>", u8::from(*b));
        }
        RpcValue::Double(d) => {
            let _ = write!(xml, "<double>{d}</double>");
        }
        RpcValue::String(s) => {
            let _ = write!(xml, "<string>{}</string>", escape(s.as_str()));
        }
        RpcValue::DateTime(ts) => {
            let _ = write!(
                xml,
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                ts.format(DATETIME_FORMATS[0])
            );
        }
        RpcValue::Base64(bytes) => {
            let _ = write!(xml, "<base64>{}</base64>", general_purpose::STANDARD.encode(bytes));
        }
        RpcValue::Array(items) => {
            xml.push_str("<array><data>");
            for item in items {
                encode_value(xml, item);
            }
            xml.push_str("</data></array>");
        }
        RpcValue::Struct(members) => {
            xml.push_str("<struct>");
            for (name, member) in members {
                let _ = write!(xml, "<member><name>{}</name>", escape(name.as_str()));
                encode_value(xml, member);
                xml.push_str("</member>");
            }
            xml.push_str("</struct>");
        }
        RpcValue::Nil => xml.push_str("<nil/>"),
    }
    xml.push_str("</value>");
}

/// Decodes a `methodResponse` document
///
/// # Errors
///
/// [`TracError::Fault`] when the server answered with a fault,
/// [`TracError::InvalidResponse`] when the document is not well formed.
pub fn decode_response(xml: &str) -> Result<RpcValue, TracError> {
    ResponseParser::new(xml).parse()
}

fn invalid(message: impl Into<String>) -> TracError {
    TracError::InvalidResponse(message.into())
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// Element-level view of the event stream
enum Node {
    Open(String),
    Empty(String),
    Close(String),
    Text(String),
    Eof,
}

struct ResponseParser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> ResponseParser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    /// Next node, comments and declarations skipped, text kept verbatim
    fn next_raw(&mut self) -> Result<Node, TracError> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|e| invalid(format!("malformed XML: {e}")))?;
            return Ok(match event {
                Event::Start(e) => Node::Open(tag_name(&e)),
                Event::Empty(e) => Node::Empty(tag_name(&e)),
                Event::End(e) => Node::Close(String::from_utf8_lossy(e.name().as_ref()).into_owned()),
                Event::Text(t) => Node::Text(
                    t.unescape()
                        .map_err(|e| invalid(format!("bad text content: {e}")))?
                        .into_owned(),
                ),
                Event::CData(c) => Node::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
                Event::Eof => Node::Eof,
                _ => continue,
            });
        }
    }

    /// Next node with whitespace-only text skipped
    fn next(&mut self) -> Result<Node, TracError> {
        loop {
            match self.next_raw()? {
                Node::Text(t) if t.trim().is_empty() => continue,
                node => return Ok(node),
            }
        }
    }

    fn expect_open(&mut self, name: &str) -> Result<(), TracError> {
        match self.next()? {
            Node::Open(tag) if tag == name => Ok(()),
            _ => Err(invalid(format!("expected <{name}>"))),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<(), TracError> {
        match self.next()? {
            Node::Close(tag) if tag == name => Ok(()),
            _ => Err(invalid(format!("expected </{name}>"))),
        }
    }

    fn parse(mut self) -> Result<RpcValue, TracError> {
        self.expect_open("methodResponse")?;
        match self.next()? {
            Node::Open(tag) if tag == "params" => {
                self.expect_open("param")?;
                self.expect_open("value")?;
                let value = self.parse_value()?;
                self.expect_close("param")?;
                self.expect_close("params")?;
                Ok(value)
            }
            Node::Open(tag) if tag == "fault" => {
                self.expect_open("value")?;
                let fault = self.parse_value()?;
                Err(fault_error(&fault))
            }
            _ => Err(invalid("methodResponse has neither params nor fault")),
        }
    }

    /// Parses the content of a `<value>` whose start tag was consumed
    fn parse_value(&mut self) -> Result<RpcValue, TracError> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Node::Text(t) => text.push_str(&t),
                Node::Open(tag) => {
                    let value = self.parse_typed(&tag)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                Node::Empty(tag) => {
                    let value = empty_typed(&tag)?;
                    self.expect_close("value")?;
                    return Ok(value);
                }
                // an untyped value is a string
                Node::Close(tag) if tag == "value" => return Ok(RpcValue::String(text)),
                Node::Close(tag) => return Err(invalid(format!("unexpected </{tag}> in value"))),
                Node::Eof => return Err(invalid("unexpected end of document in value")),
            }
        }
    }

    /// Reads character data up to the closing tag `name`
    fn read_text(&mut self, name: &str) -> Result<String, TracError> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Node::Text(t) => text.push_str(&t),
                Node::Close(tag) if tag == name => return Ok(text),
                _ => return Err(invalid(format!("unexpected markup inside <{name}>"))),
            }
        }
    }

    fn parse_typed(&mut self, tag: &str) -> Result<RpcValue, TracError> {
        match tag {
            "int" | "i4" | "i8" => {
                let text = self.read_text(tag)?;
                text.trim()
                    .parse()
                    .map(RpcValue::Int)
                    .map_err(|_| invalid(format!("bad integer {text:?}")))
            }
            "boolean" => match self.read_text(tag)?.trim() {
                "1" | "true" => Ok(RpcValue::Boolean(true)),
                "0" | "false" => Ok(RpcValue::Boolean(false)),
                other => Err(invalid(format!("bad boolean {other:?}"))),
            },
            "double" => {
                let text = self.read_text(tag)?;
                text.trim()
                    .parse()
                    .map(RpcValue::Double)
                    .map_err(|_| invalid(format!("bad double {text:?}")))
            }
            "string" => self.read_text(tag).map(RpcValue::String),
            "dateTime.iso8601" => {
                let text = self.read_text(tag)?;
                parse_datetime(text.trim())
                    .map(RpcValue::DateTime)
                    .ok_or_else(|| invalid(format!("bad dateTime {text:?}")))
            }
            "base64" => {
                let text = self.read_text(tag)?;
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                general_purpose::STANDARD
                    .decode(compact)
                    .map(RpcValue::Base64)
                    .map_err(|e| invalid(format!("bad base64: {e}")))
            }
            "nil" => {
                self.expect_close("nil")?;
                Ok(RpcValue::Nil)
            }
            "array" => self.parse_array(),
            "struct" => self.parse_struct(),
            other => Err(invalid(format!("unknown value type <{other}>"))),
        }
    }

    fn parse_array(&mut self) -> Result<RpcValue, TracError> {
        let mut items = Vec::new();
        match self.next()? {
            Node::Empty(tag) if tag == "data" => {}
            Node::Open(tag) if tag == "data" => loop {
                match self.next()? {
                    Node::Open(tag) if tag == "value" => items.push(self.parse_value()?),
                    Node::Empty(tag) if tag == "value" => items.push(RpcValue::String(String::new())),
                    Node::Close(tag) if tag == "data" => break,
                    _ => return Err(invalid("unexpected content in <data>")),
                }
            },
            _ => return Err(invalid("expected <data> in <array>")),
        }
        self.expect_close("array")?;
        Ok(RpcValue::Array(items))
    }

    fn parse_struct(&mut self) -> Result<RpcValue, TracError> {
        let mut members = BTreeMap::new();
        loop {
            match self.next()? {
                Node::Open(tag) if tag == "member" => {
                    self.expect_open("name")?;
                    let name = self.read_text("name")?;
                    let value = match self.next()? {
                        Node::Open(tag) if tag == "value" => self.parse_value()?,
                        Node::Empty(tag) if tag == "value" => RpcValue::String(String::new()),
                        _ => return Err(invalid(format!("member {name:?} has no value"))),
                    };
                    self.expect_close("member")?;
                    members.insert(name, value);
                }
                Node::Close(tag) if tag == "struct" => return Ok(RpcValue::Struct(members)),
                _ => return Err(invalid("unexpected content in <struct>")),
            }
        }
    }
}

fn empty_typed(tag: &str) -> Result<RpcValue, TracError> {
    match tag {
        "string" => Ok(RpcValue::String(String::new())),
        "nil" => Ok(RpcValue::Nil),
        "base64" => Ok(RpcValue::Base64(Vec::new())),
        "array" => Ok(RpcValue::Array(Vec::new())),
        "struct" => Ok(RpcValue::Struct(BTreeMap::new())),
        other => Err(invalid(format!("empty <{other}/> is not a value"))),
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn fault_error(fault: &RpcValue) -> TracError {
    let members = fault.as_struct();
    let code = members
        .and_then(|m| m.get("faultCode"))
        .and_then(RpcValue::as_i64)
        .unwrap_or(0);
    let message = members
        .and_then(|m| m.get("faultString"))
        .and_then(RpcValue::as_str)
        .unwrap_or("unknown fault")
        .to_string();
    TracError::Fault { code, message }
}
