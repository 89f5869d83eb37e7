//! This module implements the [`Serialize`] and [`Deserialize`] traits
//! for the [`Format`] and [`FixedPoint`] types.
//!
//! A format serializes as its descriptor string. A fixed point value
//! serializes as a struct carrying the real projection and the format,
//! and deserialization runs the full construction validation, so a
//! serialized value that does not fit its format is rejected.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{FixedPoint, Format};

impl Serialize for Format {
    /// Serializes the format as its `Qm.n` descriptor string.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}", self))
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FormatVisitor;

        impl<'de> Visitor<'de> for FormatVisitor {
            type Value = Format;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a format descriptor like \"Q4.8\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(|e| {
                    de::Error::custom(format!(
                        "unexpected string {}, expected a format descriptor: {}",
                        v, e
                    ))
                })
            }
        }

        deserializer.deserialize_str(FormatVisitor)
    }
}

impl Serialize for FixedPoint {
    /// Serializes the real projection together with the format, ie.
    /// `{"value": 1.5, "format": "Q3.1"}` in JSON terms.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FixedPoint", 2)?;
        state.serialize_field("value", &self.to_float())?;
        state.serialize_field("format", &self.format())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for FixedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        const FIELDS: &[&str] = &["value", "format"];

        enum Field {
            Value,
            Format,
        }

        impl<'de> Deserialize<'de> for Field {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct FieldVisitor;

                impl<'de> Visitor<'de> for FieldVisitor {
                    type Value = Field;

                    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                        formatter.write_str("`value` or `format`")
                    }

                    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                    where
                        E: de::Error,
                    {
                        match v {
                            "value" => Ok(Field::Value),
                            "format" => Ok(Field::Format),
                            _ => Err(de::Error::unknown_field(v, FIELDS)),
                        }
                    }
                }

                deserializer.deserialize_identifier(FieldVisitor)
            }
        }

        struct FixedPointVisitor;

        impl<'de> Visitor<'de> for FixedPointVisitor {
            type Value = FixedPoint;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("struct FixedPoint")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let value: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let format: Format = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;

                FixedPoint::from_parts(value, format).map_err(de::Error::custom)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut value: Option<f64> = None;
                let mut format: Option<Format> = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Value => {
                            if value.is_some() {
                                return Err(de::Error::duplicate_field("value"));
                            }
                            value = Some(map.next_value()?);
                        }
                        Field::Format => {
                            if format.is_some() {
                                return Err(de::Error::duplicate_field("format"));
                            }
                            format = Some(map.next_value()?);
                        }
                    }
                }

                let value = value.ok_or_else(|| de::Error::missing_field("value"))?;
                let format = format.ok_or_else(|| de::Error::missing_field("format"))?;

                FixedPoint::from_parts(value, format).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_struct("FixedPoint", FIELDS, FixedPointVisitor)
    }
}
