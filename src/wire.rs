use serde_json::{Map, Value};

/// Output encoding for a serialized payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Xml,
}

/// A single field value selected for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Str(String),
    Int(i64),
    /// Already rendered in the canonical wire datetime shape. Carries a
    /// `type="datetime"` attribute in the XML encoding.
    Datetime(String),
}

/// The touched fields of a record, in emission order, independent of the
/// final encoding. Field selection happens upstream; this type only knows
/// how to render what it was given.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WirePayload {
    fields: Vec<(&'static str, WireValue)>,
}

impl WirePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: WireValue) {
        self.fields.push((key, value));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[(&'static str, WireValue)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Render as a JSON object. Integers stay numbers; datetimes are
    /// strings in the canonical shape.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        for (key, value) in &self.fields {
            let rendered = match value {
                WireValue::Str(s) | WireValue::Datetime(s) => Value::String(s.clone()),
                WireValue::Int(n) => Value::Number((*n).into()),
            };
            obj.insert((*key).to_string(), rendered);
        }
        Value::Object(obj)
    }

    /// Render as the legacy `<story>` element tree: one child element per
    /// field, text content escaped, datetime elements tagged with
    /// `type="datetime"`.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<story>");
        for (key, value) in &self.fields {
            match value {
                WireValue::Str(s) => {
                    out.push('<');
                    out.push_str(key);
                    out.push('>');
                    escape_xml_into(s, &mut out);
                    out.push_str("</");
                    out.push_str(key);
                    out.push('>');
                }
                WireValue::Int(n) => {
                    out.push('<');
                    out.push_str(key);
                    out.push('>');
                    out.push_str(&n.to_string());
                    out.push_str("</");
                    out.push_str(key);
                    out.push('>');
                }
                WireValue::Datetime(s) => {
                    out.push('<');
                    out.push_str(key);
                    out.push_str(" type=\"datetime\">");
                    escape_xml_into(s, &mut out);
                    out.push_str("</");
                    out.push_str(key);
                    out.push('>');
                }
            }
        }
        out.push_str("</story>");
        out
    }

    /// Render in the requested encoding as a string. The field selection is
    /// identical either way; only the envelope differs.
    pub fn render(&self, encoding: Encoding) -> String {
        match encoding {
            Encoding::Json => self.to_json().to_string(),
            Encoding::Xml => self.to_xml(),
        }
    }
}

fn escape_xml_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}
