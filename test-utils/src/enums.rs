use trellis4rs_core::schema::{Schema, SchemaRef, ShapeId};
use trellis4rs_core::serde::de::{DeserializeWithSchema, Deserializer, Error};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer};
use trellis4rs_core::serde::{SchemaShape, SerializableShape};
use trellis4rs_core::{lazy_schema, traits};

lazy_schema!(
    SUIT_SCHEMA,
    Schema::create_enum(
        ShapeId::from("test#Suit"),
        Box::new(["hearts", "spades", "clubs", "diamonds"]),
        traits![]
    )
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suit {
    Hearts,
    Spades,
    Clubs,
    Diamonds,
}

impl Suit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Suit::Hearts => "hearts",
            Suit::Spades => "spades",
            Suit::Clubs => "clubs",
            Suit::Diamonds => "diamonds",
        }
    }
}

impl SchemaShape for Suit {
    fn schema(&self) -> &SchemaRef {
        &SUIT_SCHEMA
    }
}

impl SerializableShape for Suit {}

impl SerializeWithSchema for Suit {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_string(schema, self.as_str())
    }
}

impl<'de> DeserializeWithSchema<'de> for Suit {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        match deserializer.read_string(schema)?.as_str() {
            "hearts" => Ok(Suit::Hearts),
            "spades" => Ok(Suit::Spades),
            "clubs" => Ok(Suit::Clubs),
            "diamonds" => Ok(Suit::Diamonds),
            other => Err(D::Error::custom(format!("Unknown suit: {other}"))),
        }
    }
}

lazy_schema!(
    FACE_VALUE_SCHEMA,
    Schema::create_int_enum(
        ShapeId::from("test#FaceValue"),
        Box::new([1, 11, 12, 13]),
        traits![]
    )
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceValue {
    Ace,
    Jack,
    Queen,
    King,
}

impl FaceValue {
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            FaceValue::Ace => 1,
            FaceValue::Jack => 11,
            FaceValue::Queen => 12,
            FaceValue::King => 13,
        }
    }
}

impl SchemaShape for FaceValue {
    fn schema(&self) -> &SchemaRef {
        &FACE_VALUE_SCHEMA
    }
}

impl SerializableShape for FaceValue {}

impl SerializeWithSchema for FaceValue {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_integer(schema, self.value())
    }
}

impl<'de> DeserializeWithSchema<'de> for FaceValue {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        match deserializer.read_integer(schema)? {
            1 => Ok(FaceValue::Ace),
            11 => Ok(FaceValue::Jack),
            12 => Ok(FaceValue::Queen),
            13 => Ok(FaceValue::King),
            other => Err(D::Error::custom(format!("Unknown face value: {other}"))),
        }
    }
}
