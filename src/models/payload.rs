use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Value attached to a broadcast or passed through a modal query.
///
/// The hub moves payloads between threads but never looks inside them.
/// Structured data uses the tagged arms; anything else can ride along in
/// [`Payload::Opaque`] and be recovered with [`Payload::downcast_ref`].
#[derive(Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Payload>),
    Map(IndexMap<String, Payload>),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    /// Wrap an arbitrary value in the type-erased arm.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Opaque(Arc::new(value))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Payload::Float(f) => Some(*f),
            Payload::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Payload]> {
        match self {
            Payload::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Payload>> {
        match self {
            Payload::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the value inside [`Payload::Opaque`] if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Empty"),
            Payload::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Payload::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Payload::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Payload::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Payload::List(items) => f.debug_tuple("List").field(items).finish(),
            Payload::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Payload::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Opaque values compare by identity: two payloads are equal only if they
/// share the same allocation.
impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Empty, Payload::Empty) => true,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Text(a), Payload::Text(b)) => a == b,
            (Payload::List(a), Payload::List(b)) => a == b,
            (Payload::Map(a), Payload::Map(b)) => a == b,
            (Payload::Opaque(a), Payload::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Bool(value)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Payload::Int(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Payload::Int(i64::from(value))
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Payload::Float(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(value: Vec<Payload>) -> Self {
        Payload::List(value)
    }
}

impl From<IndexMap<String, Payload>> for Payload {
    fn from(value: IndexMap<String, Payload>) -> Self {
        Payload::Map(value)
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Payload::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct PoolSource {
        id: u32,
        title: String,
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Payload::default().is_empty());
        assert!(Payload::from(None::<i64>).is_empty());
    }

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(Payload::from(42).as_int(), Some(42));
        assert_eq!(Payload::from(42).as_float(), Some(42.0));
        assert_eq!(Payload::from("code").as_text(), Some("code"));
        assert_eq!(Payload::from(true).as_bool(), Some(true));
        assert_eq!(Payload::from("code").as_int(), None);
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("title".to_string(), Payload::from("ep 3"));
        map.insert("offset".to_string(), Payload::from(1500));
        map.insert("enabled".to_string(), Payload::from(true));

        let payload = Payload::from(map);
        let keys: Vec<&str> = payload
            .as_map()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["title", "offset", "enabled"]);
    }

    #[test]
    fn test_opaque_downcast() {
        let payload = Payload::opaque(PoolSource {
            id: 7,
            title: "bilibili".to_string(),
        });

        let source = payload.downcast_ref::<PoolSource>().unwrap();
        assert_eq!(source.id, 7);
        assert_eq!(source.title, "bilibili");
        assert!(payload.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_opaque_equality_is_identity() {
        let a = Payload::opaque(1u8);
        let b = a.clone();
        let c = Payload::opaque(1u8);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{:?}", a), "Opaque(..)");
    }
}
