//! Value model encoder: `Value` trees to wire fragments.
//!
//! Dispatch is a total match over the eight variant tags, so encoding never
//! fails for a well-formed tree. Anything that cannot be expressed in the
//! model is rejected earlier, where the native value is lifted into `Value`.

use crate::types::Struct;
use crate::types::Value;
use crate::writer::XmlWriter;

/// Compact basic ISO form: date without separators, time with colons.
pub const DATE_TIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Writes one value as its wire fragment.
pub fn encode_value(w: &mut XmlWriter, value: &Value) {
    match value {
        Value::Int(n) => w.element("i4", &n.to_string()),
        Value::Bool(b) => w.element("boolean", if *b { "1" } else { "0" }),
        Value::Double(d) => w.element("double", &d.to_string()),
        Value::String(s) => w.element("string", s),
        Value::DateTime(ts) => {
            w.element("dateTime.iso8601", &ts.format(DATE_TIME_FORMAT).to_string())
        }
        Value::Nil => w.empty("nil"),
        Value::Array(items) => {
            w.open("array");
            w.open("data");
            for item in items {
                w.open("value");
                encode_value(w, item);
                w.close("value");
            }
            w.close("data");
            w.close("array");
        }
        Value::Struct(members) => encode_struct(w, members),
    }
}

/// Writes a member mapping as a `<struct>`, in insertion order.
pub fn encode_struct(w: &mut XmlWriter, members: &Struct) {
    w.open("struct");
    for (name, value) in members {
        w.open("member");
        w.element("name", name);
        w.open("value");
        encode_value(w, value);
        w.close("value");
        w.close("member");
    }
    w.close("struct");
}

/// Serializes one value into a standalone wire fragment.
pub fn encode_fragment(value: &Value) -> String {
    let mut w = XmlWriter::new();
    encode_value(&mut w, value);
    w.into_string()
}
