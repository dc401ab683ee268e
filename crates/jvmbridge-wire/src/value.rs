//! Argument values carried by call payloads.
//!
//! [`Value`] is a closed union over every shape the wire format can
//! represent. Its variant alone decides the tag written before it, so
//! classification and tagging cannot disagree.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::{Result, WireError};
use crate::tag::TypeTag;

/// A call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int32(i32),
    Int64(i64),
    Bool(bool),
    Double(f64),
    Single(f32),
    String(String),
    Bytes(Bytes),
    Handle(ObjectRef),
    Date(Date),
    Timestamp(Timestamp),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    DoubleArray(Vec<f64>),
    SingleArray(Vec<f32>),
    DoubleMatrix(Vec<Vec<f64>>),
    SingleMatrix(Vec<Vec<f32>>),
    BytesArray(Vec<Bytes>),
    StringArray(Vec<String>),
    HandleArray(Vec<ObjectRef>),
    /// A single row record; fields carry their own tags.
    Row(GenericRow),
    Rows(Vec<GenericRow>),
    /// Heterogeneous object array; each element carries its own tag.
    ObjectArray(Vec<Value>),
    Map(ValueMap),
    /// Any other enumerable; each element carries its own tag.
    Sequence(Vec<Value>),
}

impl Value {
    /// Tag written before this value.
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Null => TypeTag::Null,
            Self::Int32(_) => TypeTag::Int32,
            Self::Int64(_) => TypeTag::Int64,
            Self::Bool(_) => TypeTag::Bool,
            Self::Double(_) => TypeTag::Double,
            Self::Single(_) => TypeTag::Single,
            Self::String(_) => TypeTag::String,
            Self::Bytes(_) => TypeTag::ByteBuffer,
            Self::Handle(_) => TypeTag::ObjectHandle,
            Self::Date(_) => TypeTag::Date,
            Self::Timestamp(_) => TypeTag::Timestamp,
            Self::Int32Array(_)
            | Self::Int64Array(_)
            | Self::DoubleArray(_)
            | Self::SingleArray(_)
            | Self::DoubleMatrix(_)
            | Self::SingleMatrix(_)
            | Self::BytesArray(_)
            | Self::StringArray(_)
            | Self::HandleArray(_)
            | Self::Sequence(_) => TypeTag::HomogeneousArray,
            Self::Row(_) => TypeTag::RowRecord,
            Self::Rows(_) => TypeTag::RowSequence,
            Self::ObjectArray(_) => TypeTag::ObjectArray,
            Self::Map(_) => TypeTag::AssociativeMap,
        }
    }

    /// Element sub-tag written after the `'l'` tag of array values.
    pub fn element_tag(&self) -> Option<TypeTag> {
        let tag = match self {
            Self::Int32Array(_) => TypeTag::Int32,
            Self::Int64Array(_) => TypeTag::Int64,
            Self::DoubleArray(_) => TypeTag::Double,
            Self::SingleArray(_) => TypeTag::Single,
            Self::DoubleMatrix(_) => TypeTag::DoubleArrayOfArrays,
            Self::SingleMatrix(_) => TypeTag::SingleArrayOfArrays,
            Self::BytesArray(_) => TypeTag::ByteBuffer,
            Self::StringArray(_) => TypeTag::String,
            Self::HandleArray(_) => TypeTag::ObjectHandle,
            Self::Sequence(_) => TypeTag::GenericSequence,
            _ => return None,
        };
        Some(tag)
    }

    /// Build a sequence value, collapsing homogeneous primitive lists into
    /// their fixed array form.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        let items: Vec<Value> = items.into_iter().collect();
        collapse(&items).unwrap_or(Self::Sequence(items))
    }

    /// This value with a homogeneous primitive [`Value::Sequence`] collapsed
    /// into its fixed array form. Other values are returned as-is.
    pub fn normalized(&self) -> Cow<'_, Value> {
        match self {
            Self::Sequence(items) => match collapse(items) {
                Some(array) => Cow::Owned(array),
                None => Cow::Borrowed(self),
            },
            _ => Cow::Borrowed(self),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

// Bool lists are left alone: their generic form is already what the remote
// side expects for them.
fn collapse(items: &[Value]) -> Option<Value> {
    let first = items.first()?;
    macro_rules! gather {
        ($variant:ident, $array:ident) => {
            items
                .iter()
                .map(|item| match item {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::$array)
        };
    }
    match first {
        Value::Int32(_) => gather!(Int32, Int32Array),
        Value::Int64(_) => gather!(Int64, Int64Array),
        Value::Double(_) => gather!(Double, DoubleArray),
        Value::Single(_) => gather!(Single, SingleArray),
        Value::String(_) => gather!(String, StringArray),
        _ => None,
    }
}

/// Reference to a live object in the remote engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    id: String,
}

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Calendar date, carried as `yyyy-MM-dd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

impl Date {
    /// Create a date, rejecting days that do not exist in the given month.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self> {
        let valid = (1..=9999).contains(&year)
            && (1..=12).contains(&month)
            && day >= 1
            && day <= days_in_month(year, month);
        if !valid {
            return Err(WireError::InvalidDate(format!(
                "{year:04}-{month:02}-{day:02}"
            )));
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for Date {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || WireError::InvalidDate(s.to_string());
        let mut parts = s.splitn(3, '-');
        let mut field = |width: usize| -> Result<u16> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let year = field(4)?;
        let month = field(2)?;
        let day = field(2)?;
        Self::new(year, month as u8, day as u8)
    }
}

/// Point in time as whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
}

impl Timestamp {
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    /// Truncates to whole seconds; times before the epoch round toward it.
    pub fn from_system_time(time: SystemTime) -> Self {
        let seconds = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
            Err(before) => -i64::try_from(before.duration().as_secs()).unwrap_or(i64::MAX),
        };
        Self { seconds }
    }

    pub fn unix_seconds(&self) -> i64 {
        self.seconds
    }
}

/// A row record: ordered field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericRow {
    values: Vec<Value>,
}

impl GenericRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for GenericRow {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Associative map with one declared key kind.
///
/// Entries keep insertion order. Equality ignores order.
#[derive(Debug, Clone)]
pub struct ValueMap {
    key_tag: TypeTag,
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new(key_tag: TypeTag) -> Self {
        Self {
            key_tag,
            entries: Vec::new(),
        }
    }

    /// Build from entries whose keys are already known to be distinct.
    pub(crate) fn from_unique_entries(key_tag: TypeTag, entries: Vec<(Value, Value)>) -> Self {
        Self { key_tag, entries }
    }

    /// Insert an entry, returning the value previously stored under an
    /// equal key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn key_tag(&self) -> TypeTag {
        self.key_tag
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Fail with `UnsupportedArgumentType` unless the declared key kind is a
    /// legal key kind and every key is of that kind.
    pub fn check_keys(&self) -> Result<()> {
        if !self.key_tag.is_map_key() {
            return Err(WireError::unsupported(
                TypeTag::AssociativeMap,
                format!("{} cannot be a map key", self.key_tag),
            ));
        }
        if let Some(key) = self.keys().find(|k| k.tag() != self.key_tag) {
            return Err(WireError::unsupported(
                TypeTag::AssociativeMap,
                format!("{} key in a map keyed by {}", key.tag(), self.key_tag),
            ));
        }
        Ok(())
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.key_tag == other.key_tag
            && self.len() == other.len()
            && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// Collects entries; the key kind is taken from the first key, or string
/// for an empty map.
impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries = iter.into_iter().map(|(k, v)| (k.into(), v.into()));
        let Some((key, value)) = entries.next() else {
            return Self::new(TypeTag::String);
        };
        let mut map = Self::new(key.tag());
        map.insert(key, value);
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    i32 => Int32,
    i64 => Int64,
    bool => Bool,
    f64 => Double,
    f32 => Single,
    String => String,
    Bytes => Bytes,
    ObjectRef => Handle,
    Date => Date,
    Timestamp => Timestamp,
    Vec<i32> => Int32Array,
    Vec<i64> => Int64Array,
    Vec<f64> => DoubleArray,
    Vec<f32> => SingleArray,
    Vec<Vec<f64>> => DoubleMatrix,
    Vec<Vec<f32>> => SingleMatrix,
    Vec<Bytes> => BytesArray,
    Vec<String> => StringArray,
    Vec<ObjectRef> => HandleArray,
    GenericRow => Row,
    Vec<GenericRow> => Rows,
    ValueMap => Map,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Self::StringArray(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Self::Sequence(v.into_iter().map(Self::Bool).collect())
    }
}

/// Unsigned values travel as int32 when they fit; larger ones are rejected.
impl TryFrom<u32> for Value {
    type Error = WireError;

    fn try_from(v: u32) -> Result<Self> {
        i32::try_from(v).map(Self::Int32).map_err(|_| {
            WireError::unsupported(TypeTag::Int32, format!("unsigned value {v} exceeds int32"))
        })
    }
}

/// Unsigned values travel as int64 when they fit; larger ones are rejected.
impl TryFrom<u64> for Value {
    type Error = WireError;

    fn try_from(v: u64) -> Result<Self> {
        i64::try_from(v).map(Self::Int64).map_err(|_| {
            WireError::unsupported(TypeTag::Int64, format!("unsigned value {v} exceeds int64"))
        })
    }
}

impl From<&ObjectRef> for Value {
    fn from(v: &ObjectRef) -> Self {
        Self::Handle(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_lists_collapse() {
        let list = Value::list([Value::Double(1.0), Value::Double(2.0)]);
        assert_eq!(list, Value::DoubleArray(vec![1.0, 2.0]));

        let list = Value::list([Value::from("a"), Value::from("b")]);
        assert_eq!(list, Value::StringArray(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn mixed_bool_and_empty_lists_stay_generic() {
        let mixed = Value::list([Value::Int32(1), Value::Int64(2)]);
        assert!(matches!(mixed, Value::Sequence(ref items) if items.len() == 2));

        let bools = Value::list([Value::Bool(true), Value::Bool(false)]);
        assert!(matches!(bools, Value::Sequence(_)));

        assert_eq!(Value::list([]), Value::Sequence(Vec::new()));
    }

    #[test]
    fn normalized_borrows_when_nothing_changes() {
        let value = Value::Int32(7);
        assert!(matches!(value.normalized(), Cow::Borrowed(_)));

        let seq = Value::Sequence(vec![Value::Single(1.0)]);
        assert_eq!(
            seq.normalized().into_owned(),
            Value::SingleArray(vec![1.0])
        );
    }

    #[test]
    fn arrays_share_the_array_tag() {
        assert_eq!(Value::from(vec![1i32, 2]).tag(), TypeTag::HomogeneousArray);
        assert_eq!(
            Value::from(vec![vec![1.0f64]]).element_tag(),
            Some(TypeTag::DoubleArrayOfArrays)
        );
        assert_eq!(
            Value::Sequence(Vec::new()).element_tag(),
            Some(TypeTag::GenericSequence)
        );
        assert_eq!(Value::Int32(1).element_tag(), None);
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Int64(5));
    }

    #[test]
    fn date_round_trips_through_text() {
        let date: Date = "2024-02-29".parse().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 29));
        assert_eq!(date.to_string(), "2024-02-29");
    }

    #[test]
    fn date_rejects_impossible_days() {
        assert!(Date::new(2023, 2, 29).is_err());
        assert!(Date::new(2023, 13, 1).is_err());
        assert!("2023-4-01".parse::<Date>().is_err());
        assert!("20230401".parse::<Date>().is_err());
        assert!("2023-04-31".parse::<Date>().is_err());
    }

    #[test]
    fn timestamp_from_system_time() {
        let t = UNIX_EPOCH + std::time::Duration::from_millis(90_500);
        assert_eq!(Timestamp::from_system_time(t).unix_seconds(), 90);
        let before = UNIX_EPOCH - std::time::Duration::from_secs(10);
        assert_eq!(Timestamp::from_system_time(before).unix_seconds(), -10);
    }

    #[test]
    fn map_equality_ignores_order() {
        let a: ValueMap = [("x", 1), ("y", 2)].into_iter().collect();
        let b: ValueMap = [("y", 2), ("x", 1)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.key_tag(), TypeTag::String);
    }

    #[test]
    fn map_insert_replaces_equal_key() {
        let mut map = ValueMap::new(TypeTag::Int32);
        assert_eq!(map.insert(1i32, "a"), None);
        assert_eq!(map.insert(1i32, "b"), Some(Value::from("a")));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::Int32(1)), Some(&Value::from("b")));
    }

    #[test]
    fn map_key_checks() {
        let mut map = ValueMap::new(TypeTag::String);
        map.insert("a", 1i32);
        assert!(map.check_keys().is_ok());

        map.insert(2i32, 1i32);
        assert!(matches!(
            map.check_keys(),
            Err(WireError::UnsupportedArgumentType { .. })
        ));

        let rows = ValueMap::new(TypeTag::RowRecord);
        assert!(rows.check_keys().is_err());
    }

    #[test]
    fn unsigned_values_convert_when_they_fit() {
        assert_eq!(Value::try_from(7u32).unwrap(), Value::Int32(7));
        assert_eq!(Value::try_from(u64::from(u32::MAX)).unwrap(), Value::Int64(4_294_967_295));

        let err = Value::try_from(u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            WireError::UnsupportedArgumentType {
                kind: TypeTag::Int32,
                ..
            }
        ));
        assert!(Value::try_from(u64::MAX).is_err());
    }
}
