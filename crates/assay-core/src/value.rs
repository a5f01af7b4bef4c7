//! Runtime value representation
//!
//! The value model the comparator and constraints operate on.
//! - Null, Bool, Int, Float: immediate values
//! - Strings: reference-counted, immutable
//! - Arrays: copy-on-write ordered maps (`ValueArray`), value semantics
//! - Objects: shared handles (`ObjectRef`), reference semantics; may form cycles
//! - Resources: opaque handles compared by identity only
//! - DateTime: instants with a fixed UTC offset
//! - Markup: parsed element trees

use crate::markup::Document;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone};
use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Key of an array entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayKey {
    Int(i64),
    Str(Arc<str>),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<i32> for ArrayKey {
    fn from(i: i32) -> Self {
        ArrayKey::Int(i64::from(i))
    }
}

impl From<usize> for ArrayKey {
    fn from(i: usize) -> Self {
        ArrayKey::Int(i as i64)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::Str(Arc::from(s))
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        ArrayKey::Str(Arc::from(s))
    }
}

/// Copy-on-write ordered map. Cheap to clone (refcount bump).
/// Mutations on a shared array clone the inner map first (Arc::make_mut).
#[derive(Clone, Debug, Default)]
pub struct ValueArray(Arc<IndexMap<ArrayKey, Value>>);

impl ValueArray {
    pub fn new() -> Self {
        ValueArray(Arc::new(IndexMap::new()))
    }

    /// Build a sequence keyed `0..n`.
    pub fn from_values(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<ArrayKey>, value: Value) {
        Arc::make_mut(&mut self.0).insert(key.into(), value);
    }

    /// Remove an entry, keeping the order of the rest.
    pub fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        Arc::make_mut(&mut self.0).shift_remove(key)
    }

    /// Append with the next free integer key.
    pub fn push(&mut self, value: Value) {
        let next = self
            .0
            .keys()
            .filter_map(|k| match k {
                ArrayKey::Int(i) => Some(*i + 1),
                ArrayKey::Str(_) => None,
            })
            .max()
            .unwrap_or(0)
            .max(0);
        Arc::make_mut(&mut self.0).insert(ArrayKey::Int(next), value);
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, ArrayKey, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, ArrayKey, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, ArrayKey, Value> {
        self.0.values()
    }
}

impl FromIterator<Value> for ValueArray {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueArray(Arc::new(
            iter.into_iter()
                .enumerate()
                .map(|(i, v)| (ArrayKey::Int(i as i64), v))
                .collect(),
        ))
    }
}

impl FromIterator<(ArrayKey, Value)> for ValueArray {
    fn from_iter<I: IntoIterator<Item = (ArrayKey, Value)>>(iter: I) -> Self {
        ValueArray(Arc::new(iter.into_iter().collect()))
    }
}

/// Visibility of an object field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A named object field.
#[derive(Clone, Debug)]
pub struct Field {
    pub value: Value,
    pub visibility: Visibility,
}

#[derive(Debug)]
struct ObjectData {
    class: String,
    ancestors: Vec<String>,
    fields: IndexMap<String, Field>,
}

/// Shared object handle.
///
/// All clones point to the same object; mutation through one clone is visible
/// through every other. Two handles are *identical* only when they refer to the
/// same allocation. Fields can be assigned after construction, which is how
/// self-referential graphs are built (such graphs are never freed).
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<ObjectData>>);

impl ObjectRef {
    pub fn new(class: impl Into<String>) -> Self {
        ObjectRef(Arc::new(RwLock::new(ObjectData {
            class: class.into(),
            ancestors: Vec::new(),
            fields: IndexMap::new(),
        })))
    }

    /// Declare parent classes and interfaces for instance-of checks.
    pub fn with_ancestors<I, S>(self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write()
            .ancestors
            .extend(ancestors.into_iter().map(Into::into));
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, ObjectData> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ObjectData> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn class_name(&self) -> String {
        self.read().class.clone()
    }

    /// True when the object's class or one of its ancestors is `class`.
    pub fn is_instance_of(&self, class: &str) -> bool {
        let data = self.read();
        data.class == class || data.ancestors.iter().any(|a| a == class)
    }

    /// Set a public field.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.set_with_visibility(name, value, Visibility::Public);
    }

    pub fn set_with_visibility(
        &self,
        name: impl Into<String>,
        value: impl Into<Value>,
        visibility: Visibility,
    ) {
        self.write().fields.insert(
            name.into(),
            Field {
                value: value.into(),
                visibility,
            },
        );
    }

    /// Read a public field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.read()
            .fields
            .get(name)
            .filter(|f| f.visibility == Visibility::Public)
            .map(|f| f.value.clone())
    }

    /// Read a field regardless of its visibility.
    pub fn read_attribute(&self, name: &str) -> Option<Value> {
        self.read().fields.get(name).map(|f| f.value.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.read().fields.contains_key(name)
    }

    /// Snapshot of all fields in declaration order.
    ///
    /// The lock is released before the caller walks the values, so a field
    /// pointing back at this object can be visited safely.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.read()
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect()
    }

    pub fn field_count(&self) -> usize {
        self.read().fields.len()
    }

    /// Stable identity of the handle (address of the shared allocation).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} #{:x})", self.class_name(), self.id())
    }
}

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// An external resource handle (file, socket, stream, ...).
#[derive(Debug)]
pub struct ResourceHandle {
    id: u64,
    kind: String,
}

/// Shared resource handle. Equal only to itself.
#[derive(Clone, Debug)]
pub struct ResourceRef(Arc<ResourceHandle>);

impl ResourceRef {
    pub fn new(kind: impl Into<String>) -> Self {
        ResourceRef(Arc::new(ResourceHandle {
            id: NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed),
            kind: kind.into(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    pub fn ptr_eq(&self, other: &ResourceRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Runtime value type
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// IEEE 754 double-precision
    Float(f64),
    String(Arc<str>),
    /// Ordered key/value map (sequences use keys `0..n`)
    Array(ValueArray),
    Object(ObjectRef),
    Resource(ResourceRef),
    /// Instant with the offset it was expressed in
    DateTime(DateTime<FixedOffset>),
    Markup(Arc<Document>),
}

impl Value {
    /// Create a new string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Create a sequence keyed `0..n`
    pub fn list(values: Vec<Value>) -> Self {
        Value::Array(ValueArray::from_values(values))
    }

    /// Create an array from explicit key/value pairs
    pub fn map<K: Into<ArrayKey>>(pairs: Vec<(K, Value)>) -> Self {
        Value::Array(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create an instant from a local wall-clock time in an IANA zone.
    ///
    /// `local` uses the `YYYY-MM-DD HH:MM:SS` layout. Returns `None` for an
    /// unknown zone, an unparsable time, or a wall-clock time that does not
    /// exist (or is ambiguous) in that zone.
    pub fn datetime_in_zone(local: &str, zone: &str) -> Option<Value> {
        let tz: chrono_tz::Tz = zone.parse().ok()?;
        let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S").ok()?;
        let zoned = tz.from_local_datetime(&naive).single()?;
        let offset = zoned.offset().fix();
        Some(Value::DateTime(zoned.with_timezone(&offset)))
    }

    /// Parse a markup document into a value.
    pub fn markup(text: &str) -> Result<Value, crate::markup::MarkupError> {
        Ok(Value::Markup(Arc::new(Document::parse(text)?)))
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) | Value::DateTime(_) | Value::Markup(_) => "object",
            Value::Resource(_) => "resource",
        }
    }

    /// Class name for object-like values.
    pub fn class_name(&self) -> Option<String> {
        match self {
            Value::Object(obj) => Some(obj.class_name()),
            Value::DateTime(_) => Some("DateTime".to_string()),
            Value::Markup(_) => Some("Document".to_string()),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::DateTime(_) | Value::Markup(_))
    }

    /// Numeric view: numbers, and strings holding a decimal or scientific literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => numeric_literal(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ValueArray> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// String form of a scalar: null and false are empty, true is `1`.
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(float_to_string(*f)),
            Value::String(s) => Some(s.to_string()),
            _ => None,
        }
    }

    /// Number of elements for countable values.
    pub fn count(&self) -> Option<usize> {
        match self {
            Value::Array(arr) => Some(arr.len()),
            _ => None,
        }
    }

    /// Strict identity.
    ///
    /// Scalars must agree in type and value (NaN is never identical to
    /// anything), arrays must hold identical entries in the same order, and
    /// handles (objects, resources, documents) must be the same allocation.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Resource(a), Value::Resource(b)) => a.ptr_eq(b),
            (Value::DateTime(a), Value::DateTime(b)) => a == b && a.offset() == b.offset(),
            (Value::Markup(a), Value::Markup(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    /// Identity equality, see [`Value::identical`].
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

/// Parse a decimal or scientific numeric literal, surrounding whitespace allowed.
///
/// Rejects the special spellings `inf`/`nan` that `f64::from_str` accepts.
/// Literals too large for `f64` parse to an infinity.
pub fn numeric_literal(s: &str) -> Option<f64> {
    let t = s.trim();
    let b = t.as_bytes();
    let mut i = 0;

    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }

    if i != b.len() {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Render a float the way it is shown in diagnostics.
pub(crate) fn float_to_string(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "INF" } else { "-INF" }.to_string()
    } else if f != 0.0 && (f.abs() >= 1e15 || f.abs() < 1e-4) {
        format!("{:E}", f)
    } else {
        format!("{}", f)
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::list(values)
    }
}

impl From<ValueArray> for Value {
    fn from(arr: ValueArray) -> Self {
        Value::Array(arr)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ResourceRef> for Value {
    fn from(res: ResourceRef) -> Self {
        Value::Resource(res)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "boolean");
        assert_eq!(Value::Int(1).type_name(), "integer");
        assert_eq!(Value::Float(1.5).type_name(), "double");
        assert_eq!(Value::string("x").type_name(), "string");
        assert_eq!(Value::list(vec![]).type_name(), "array");
        assert_eq!(Value::Object(ObjectRef::new("Foo")).type_name(), "object");
        assert_eq!(Value::Resource(ResourceRef::new("stream")).type_name(), "resource");
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(numeric_literal("42"), Some(42.0));
        assert_eq!(numeric_literal(" -1.5 "), Some(-1.5));
        assert_eq!(numeric_literal(".5"), Some(0.5));
        assert_eq!(numeric_literal("1e3"), Some(1000.0));
        assert_eq!(numeric_literal("9E6666666"), Some(f64::INFINITY));
        assert_eq!(numeric_literal("Foobar"), None);
        assert_eq!(numeric_literal("inf"), None);
        assert_eq!(numeric_literal("NaN"), None);
        assert_eq!(numeric_literal("1e"), None);
        assert_eq!(numeric_literal(""), None);
        assert_eq!(numeric_literal("."), None);
    }

    #[test]
    fn test_push_uses_next_integer_key() {
        let mut arr = ValueArray::new();
        arr.insert("name", Value::string("x"));
        arr.insert(5, Value::Int(1));
        arr.push(Value::Int(2));
        assert_eq!(arr.get(&ArrayKey::Int(6)), Some(&Value::Int(2)));
    }

    #[test]
    fn test_array_cow_mutation_independent() {
        let original = ValueArray::from_values(vec![Value::Int(1)]);
        let mut copy = original.clone();
        copy.push(Value::Int(2));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_identity_of_objects() {
        let a = ObjectRef::new("Foo");
        let b = ObjectRef::new("Foo");
        assert!(Value::Object(a.clone()).identical(&Value::Object(a.clone())));
        assert!(!Value::Object(a).identical(&Value::Object(b)));
    }

    #[test]
    fn test_identity_is_type_strict() {
        assert!(!Value::Int(1).identical(&Value::Float(1.0)));
        assert!(!Value::Float(f64::NAN).identical(&Value::Float(f64::NAN)));
        assert!(Value::list(vec![1.into(), "a".into()])
            .identical(&Value::list(vec![1.into(), "a".into()])));
    }

    #[test]
    fn test_private_fields_hidden_from_get() {
        let obj = ObjectRef::new("Account");
        obj.set_with_visibility("balance", 10, Visibility::Private);
        assert_eq!(obj.get("balance"), None);
        assert_eq!(obj.read_attribute("balance"), Some(Value::Int(10)));
    }

    #[test]
    fn test_self_referential_object() {
        let obj = ObjectRef::new("Node");
        obj.set("next", obj.clone());
        let fields = obj.fields();
        assert_eq!(fields.len(), 1);
        assert!(matches!(&fields[0].1, Value::Object(o) if o.ptr_eq(&obj)));
    }

    #[test]
    fn test_instance_of_ancestors() {
        let obj = ObjectRef::new("ArrayIterator").with_ancestors(["Iterator", "Countable"]);
        assert!(obj.is_instance_of("ArrayIterator"));
        assert!(obj.is_instance_of("Countable"));
        assert!(!obj.is_instance_of("Exception"));
    }

    #[test]
    fn test_datetime_in_zone() {
        let ny = Value::datetime_in_zone("2013-03-29 04:13:35", "America/New_York").unwrap();
        match ny {
            Value::DateTime(dt) => assert_eq!(dt.offset().local_minus_utc(), -4 * 3600),
            other => panic!("expected datetime, got {:?}", other),
        }
        assert!(Value::datetime_in_zone("2013-03-29 04:13:35", "Mars/Olympus").is_none());
    }

    #[test]
    fn test_float_to_string() {
        assert_eq!(float_to_string(1.5), "1.5");
        assert_eq!(float_to_string(1.0), "1");
        assert_eq!(float_to_string(f64::NAN), "NAN");
        assert_eq!(float_to_string(f64::NEG_INFINITY), "-INF");
    }
}
