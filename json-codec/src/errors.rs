use jiter::JiterError;
use thiserror::Error;
use trellis4rs_core::schema::DocumentError;

#[derive(Error, Debug)]
pub enum JsonSerdeError {
    #[error("Failed to serialize value to JSON: {0}")]
    Serialization(String),
    #[error("Failed to deserialize value from JSON: {0}")]
    Deserialization(String),
    #[error("Unknown union member: {0}")]
    UnknownUnionMember(String),
    #[error("Failed to convert integer type")]
    IntConversion(#[from] std::num::TryFromIntError),
    #[error("Failed document conversion")]
    DocumentConversion(#[from] DocumentError),
}

impl From<JiterError> for JsonSerdeError {
    fn from(value: JiterError) -> Self {
        JsonSerdeError::Deserialization(value.to_string())
    }
}

impl trellis4rs_core::serde::se::Error for JsonSerdeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        JsonSerdeError::Serialization(msg.to_string())
    }
}
