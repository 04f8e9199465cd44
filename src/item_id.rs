use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable identity of a category, channel or movie.
///
/// Providers send ids as numbers or as strings (sometimes numeric strings).
/// Numeric strings are normalized to `Number` so that an id read from the
/// listing compares equal to the same id read back from the favorites store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl ItemId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ItemId::Number(n) => Some(*n),
            ItemId::Text(_) => None,
        }
    }

    /// Parse user or provider text, normalizing numeric strings
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => ItemId::Number(n),
            Err(_) => ItemId::Text(trimmed.to_string()),
        }
    }
}

impl Default for ItemId {
    fn default() -> Self {
        ItemId::Number(0)
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        ItemId::Number(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::parse(s)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for ItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ItemId::Number(n) => serializer.serialize_i64(*n),
            ItemId::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ItemIdVisitor;

        impl<'de> Visitor<'de> for ItemIdVisitor {
            type Value = ItemId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or a string id")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ItemId::Number(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(v)
                    .map(ItemId::Number)
                    .map_err(|_| E::custom("id out of range"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ItemId::parse(v))
            }
        }

        deserializer.deserialize_any(ItemIdVisitor)
    }
}

/// Ratings arrive as `"7.5"`, `7.5`, `""` or `null`
pub fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|f| f as f32),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f32>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_deserialize() {
        let id: ItemId = serde_json::from_str("123").unwrap();
        assert_eq!(id, ItemId::Number(123));
        assert_eq!(id.as_i64(), Some(123));
    }

    #[test]
    fn test_numeric_string_normalizes() {
        let id: ItemId = serde_json::from_str(r#""456""#).unwrap();
        assert_eq!(id, ItemId::Number(456));
    }

    #[test]
    fn test_text_id_kept() {
        let id: ItemId = serde_json::from_str(r#""favorites""#).unwrap();
        assert_eq!(id, ItemId::Text("favorites".to_string()));
        assert_eq!(id.to_string(), "favorites");
    }

    #[test]
    fn test_null_rejected() {
        assert!(serde_json::from_str::<ItemId>("null").is_err());
    }

    #[test]
    fn test_rating_forms() {
        #[derive(Deserialize)]
        struct Rated {
            #[serde(default, deserialize_with = "deserialize_rating")]
            rating: Option<f32>,
        }
        let a: Rated = serde_json::from_str(r#"{"rating":"7.5"}"#).unwrap();
        let b: Rated = serde_json::from_str(r#"{"rating":6}"#).unwrap();
        let c: Rated = serde_json::from_str(r#"{"rating":""}"#).unwrap();
        let d: Rated = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(a.rating, Some(7.5));
        assert_eq!(b.rating, Some(6.0));
        assert_eq!(c.rating, None);
        assert_eq!(d.rating, None);
    }
}
