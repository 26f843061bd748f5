pub mod square_serde {
    use serde::{
        de::{Error, Visitor},
        Deserializer, Serializer,
    };
    use shakmaty::Square;

    pub fn serialize<S: Serializer>(sq: &Square, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(sq)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Square, D::Error> {
        struct SquareVisitor {}
        impl<'de> Visitor<'de> for SquareVisitor {
            type Value = Square;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a square name such as `e4`")
            }
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<Square>()
                    .map_err(|_| Error::custom(format!("error in parsing square `{v}`")))
            }
        }
        d.deserialize_str(SquareVisitor {})
    }
}

/// Maps keyed by [`shakmaty::Square`], written as JSON objects keyed by square name.
pub mod square_map_serde {
    use std::{collections::BTreeMap, marker::PhantomData};

    use serde::{
        de::{Error, MapAccess, Visitor},
        ser::SerializeMap,
        Deserialize, Deserializer, Serialize, Serializer,
    };
    use shakmaty::Square;

    pub fn serialize<S, V>(map: &BTreeMap<Square, V>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut out = ser.serialize_map(Some(map.len()))?;
        for (sq, value) in map {
            out.serialize_entry(&sq.to_string(), value)?;
        }
        out.end()
    }

    pub fn deserialize<'de, D, V>(d: D) -> Result<BTreeMap<Square, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct SquareMapVisitor<V>(PhantomData<V>);
        impl<'de, V: Deserialize<'de>> Visitor<'de> for SquareMapVisitor<V> {
            type Value = BTreeMap<Square, V>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a map keyed by square names")
            }
            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    let sq = key
                        .parse::<Square>()
                        .map_err(|_| Error::custom(format!("error in parsing square `{key}`")))?;
                    map.insert(sq, value);
                }
                Ok(map)
            }
        }
        d.deserialize_map(SquareMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};
    use shakmaty::Square;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Marks {
        #[serde(with = "super::square_serde")]
        origin: Square,
        #[serde(with = "super::square_map_serde")]
        marks: BTreeMap<Square, u8>,
    }

    #[test]
    fn test_squares_as_names() {
        let marks = Marks {
            origin: Square::E4,
            marks: BTreeMap::from([(Square::A1, 1), (Square::H8, 2)]),
        };
        let json = serde_json::to_value(&marks).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "origin": "e4", "marks": { "a1": 1, "h8": 2 } })
        );
        assert_eq!(serde_json::from_value::<Marks>(json).unwrap(), marks);
    }

    #[test]
    fn test_rejects_unknown_square() {
        let json = serde_json::json!({ "origin": "z9", "marks": {} });
        assert!(serde_json::from_value::<Marks>(json).is_err());

        let json = serde_json::json!({ "origin": "a1", "marks": { "j1": 0 } });
        assert!(serde_json::from_value::<Marks>(json).is_err());
    }
}
