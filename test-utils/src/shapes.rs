use trellis4rs_core::schema::prelude::{INTEGER, RequiredTrait, STRING};
use trellis4rs_core::schema::{
    AnyShape, Document, DynShapeBuilder, RegistryError, Schema, SchemaRef, ShapeId,
};
use trellis4rs_core::serde::correction::ErrorCorrectionDefault;
use trellis4rs_core::serde::de::{DeserializeWithSchema, Deserializer, Error};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::serde::{SchemaShape, SerializableShape, StaticSchemaShape};
use trellis4rs_core::{lazy_member_schema, lazy_schema, traits};

lazy_schema!(
    PERSON_SCHEMA,
    Schema::structure_builder(ShapeId::from("test#Person"), traits![])
        .put_member("name", &STRING, traits![RequiredTrait])
        .put_member("age", &INTEGER, traits![RequiredTrait])
        .put_member("email", &STRING, traits![])
        .build()
);
lazy_member_schema!(PERSON_NAME, PERSON_SCHEMA, "name");
lazy_member_schema!(PERSON_AGE, PERSON_SCHEMA, "age");
lazy_member_schema!(PERSON_EMAIL, PERSON_SCHEMA, "email");

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
}

impl StaticSchemaShape for Person {
    fn schema() -> &'static SchemaRef {
        &PERSON_SCHEMA
    }
}

impl SchemaShape for Person {
    fn schema(&self) -> &SchemaRef {
        &PERSON_SCHEMA
    }
}

impl SerializableShape for Person {}

impl SerializeWithSchema for Person {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 3)?;
        ser.serialize_member(&PERSON_NAME, &self.name)?;
        ser.serialize_member(&PERSON_AGE, &self.age)?;
        ser.serialize_optional_member(&PERSON_EMAIL, &self.email)?;
        ser.end(schema)
    }
}

impl<'de> DeserializeWithSchema<'de> for Person {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        let builder = deserializer.read_struct(
            schema,
            PersonBuilder::default(),
            |builder, member_schema, de| {
                match member_schema.as_member().map(|m| m.name.as_str()) {
                    Some("name") => {
                        builder.name = Some(String::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("age") => {
                        builder.age = Some(i32::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("email") => {
                        builder.email =
                            Option::<String>::deserialize_with_schema(member_schema, de)?;
                    }
                    _ => {}
                }
                Ok(())
            },
        )?;
        builder.into_shape().map_err(D::Error::custom)
    }
}

#[derive(Debug, Default)]
pub struct PersonBuilder {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
}

impl PersonBuilder {
    pub fn supplier() -> Box<dyn DynShapeBuilder> {
        Box::new(PersonBuilder::default())
    }

    fn into_shape(self) -> Result<Person, String> {
        Ok(Person {
            name: self.name.ok_or("Missing required member: name")?,
            age: self.age.ok_or("Missing required member: age")?,
            email: self.email,
        })
    }
}

impl DynShapeBuilder for PersonBuilder {
    fn schema(&self) -> &SchemaRef {
        &PERSON_SCHEMA
    }

    fn set_member(&mut self, member_name: &str, value: &Document) -> Result<(), RegistryError> {
        match member_name {
            "name" => self.name = value.as_string().map(str::to_string),
            "age" => self.age = value.as_integer(),
            "email" => self.email = value.as_string().map(str::to_string),
            _ => {}
        }
        Ok(())
    }

    fn error_correction(&mut self) {
        if self.name.is_none() {
            self.name = Some(String::correction_default());
        }
        if self.age.is_none() {
            self.age = Some(i32::correction_default());
        }
    }

    fn build(self: Box<Self>) -> Result<Box<dyn AnyShape>, RegistryError> {
        let shape = self
            .into_shape()
            .map_err(RegistryError::Build)?;
        Ok(Box::new(shape))
    }
}
