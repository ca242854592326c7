//! The Universal Data Model (UDM): the single tagged value type that
//! travels between format adapters and the interpreter.
//!
//! A tagged union in the shape of a configuration-language value type,
//! generalized: objects carry a *separate* attributes map next to
//! properties, and the variant set is widened with calendar, binary,
//! and lambda kinds (§3.1).

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::rc::Rc;

use crate::ast::Expr;
use crate::interpreter::Environment;

/// An Object's properties, insertion-order preserved.
pub type Properties = IndexMap<String, Udm>;
/// An Object's attributes: a separate string->string namespace (XML
/// attributes and format equivalents). Disjoint from `properties`.
pub type Attributes = IndexMap<String, String>;
/// Optional free-form metadata attached by an adapter (e.g. XSD/JSON
/// Schema `__metadata`), never touched by ordinary path traversal.
pub type Metadata = IndexMap<String, Udm>;

/// UDM arrays use a small inline buffer: most transformation results
/// are short sequences of object children, rarely over a handful of
/// elements.
pub type UdmArray = SmallVec<[Udm; 4]>;

/// A callable closure value: a lambda literal bound to the environment
/// it was created in. Never serializable (§3.1).
#[derive(Debug)]
pub struct LambdaValue {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub closure: Environment,
}

impl PartialEq for LambdaValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// An Object: properties and attributes live in disjoint key spaces
/// (§3.1 core invariant). `metadata` is populated only by adapters that
/// need to stash synthetic data (XSD/JSON-Schema `__metadata`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UdmObject {
    pub properties: Properties,
    pub attributes: Attributes,
    pub metadata: Option<Metadata>,
}

impl UdmObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: Properties) -> Self {
        Self {
            properties,
            attributes: Attributes::new(),
            metadata: None,
        }
    }

    /// `keys`/`values`/`entries`/`hasKey` all go through this: the
    /// attributes map is never visible here (§4.4).
    pub fn property_keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(|k| k.as_str())
    }
}

/// The Universal Data Model value type (§3.1).
#[derive(Debug, Clone, PartialEq)]
pub enum Udm {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,

    Array(Box<UdmArray>),
    Object(Box<UdmObject>),

    /// Calendar date, no time, no zone. Serializes as `YYYY-MM-DD`.
    Date(chrono::NaiveDate),
    /// Instant with time zone, UTC-canonicalized. Serializes ISO-8601
    /// with zone.
    DateTime(chrono::DateTime<chrono::Utc>),
    /// Wall-clock date+time, no zone. Serializes `YYYY-MM-DDTHH:MM:SS`.
    LocalDateTime(chrono::NaiveDateTime),
    /// Wall-clock time, no date. Serializes `HH:MM:SS`.
    Time(chrono::NaiveTime),
    /// Opaque bytes. Serialized as base64 in textual formats.
    Binary(Vec<u8>),

    /// Runtime-only callable, never serializable.
    Lambda(Rc<LambdaValue>),
}

impl Udm {
    pub fn string(s: impl Into<String>) -> Self {
        Udm::String(s.into())
    }

    pub fn array(items: impl IntoIterator<Item = Udm>) -> Self {
        let v: UdmArray = items.into_iter().collect();
        Udm::Array(Box::new(v))
    }

    pub fn empty_array() -> Self {
        Udm::Array(Box::new(UdmArray::new()))
    }

    pub fn object(obj: UdmObject) -> Self {
        Udm::Object(Box::new(obj))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Udm::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Udm::Array(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Udm::Null)
    }

    pub fn as_object(&self) -> Option<&UdmObject> {
        match self {
            Udm::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut UdmObject> {
        match self {
            Udm::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&UdmArray> {
        match self {
            Udm::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Udm::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Udm::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Udm::Float(f) => Some(*f),
            Udm::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Udm::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Truthiness per §4.3: `false`, null, `0`, empty string, empty
    /// array, empty object are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Udm::Boolean(b) => *b,
            Udm::Null => false,
            Udm::Integer(i) => *i != 0,
            Udm::Float(f) => *f != 0.0,
            Udm::String(s) => !s.is_empty(),
            Udm::Array(a) => !a.is_empty(),
            Udm::Object(o) => !o.properties.is_empty() || !o.attributes.is_empty(),
            Udm::Date(_)
            | Udm::DateTime(_)
            | Udm::LocalDateTime(_)
            | Udm::Time(_)
            | Udm::Binary(_)
            | Udm::Lambda(_) => true,
        }
    }

    /// A short, stable name for error messages and `typeOf`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Udm::String(_) => "string",
            Udm::Integer(_) => "integer",
            Udm::Float(_) => "float",
            Udm::Boolean(_) => "boolean",
            Udm::Null => "null",
            Udm::Array(_) => "array",
            Udm::Object(_) => "object",
            Udm::Date(_) => "date",
            Udm::DateTime(_) => "datetime",
            Udm::LocalDateTime(_) => "localdatetime",
            Udm::Time(_) => "time",
            Udm::Binary(_) => "binary",
            Udm::Lambda(_) => "lambda",
        }
    }

    /// String coercion used by `+` on string/non-string and by CSV/YAML
    /// scalar rendering; not the same as a format serializer.
    pub fn coerce_to_string(&self) -> String {
        match self {
            Udm::String(s) => s.clone(),
            Udm::Integer(i) => i.to_string(),
            Udm::Float(f) => format_float(*f),
            Udm::Boolean(b) => b.to_string(),
            Udm::Null => "null".to_string(),
            Udm::Date(d) => d.format("%Y-%m-%d").to_string(),
            Udm::DateTime(dt) => dt.to_rfc3339(),
            Udm::LocalDateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Udm::Time(t) => t.format("%H:%M:%S").to_string(),
            Udm::Binary(b) => base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b),
            Udm::Array(_) | Udm::Object(_) => "[object]".to_string(),
            Udm::Lambda(_) => "<lambda>".to_string(),
        }
    }
}

/// Renders a float without a trailing `.0` only when its origin was
/// integral and the target format has no distinct integer type — this
/// helper is the "no fractional part, no exponent" text form used by
/// `coerce_to_string` and the XML/CSV serializers.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.0}", f)
    } else {
        let s = format!("{}", f);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec_table() {
        assert!(!Udm::Boolean(false).is_truthy());
        assert!(!Udm::Null.is_truthy());
        assert!(!Udm::Integer(0).is_truthy());
        assert!(!Udm::String(String::new()).is_truthy());
        assert!(!Udm::empty_array().is_truthy());
        assert!(!Udm::object(UdmObject::new()).is_truthy());
        assert!(Udm::Integer(1).is_truthy());
        assert!(Udm::String("x".into()).is_truthy());
    }

    #[test]
    fn properties_and_attributes_are_disjoint_key_spaces() {
        let mut obj = UdmObject::new();
        obj.properties.insert("id".into(), Udm::Integer(1));
        obj.attributes.insert("id".into(), "attr-id".into());
        assert_eq!(obj.properties.get("id"), Some(&Udm::Integer(1)));
        assert_eq!(obj.attributes.get("id").map(String::as_str), Some("attr-id"));
        assert_eq!(obj.property_keys().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn equality_is_structural_on_properties_and_attributes() {
        let mut a = UdmObject::new();
        a.properties.insert("x".into(), Udm::Integer(1));
        a.attributes.insert("a".into(), "1".into());
        let mut b = UdmObject::new();
        b.properties.insert("x".into(), Udm::Integer(1));
        b.attributes.insert("a".into(), "1".into());
        assert_eq!(Udm::object(a), Udm::object(b));
    }
}
