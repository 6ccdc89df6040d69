use serde_json::Value;

pub type SerdePathError = serde_path_to_error::Error<serde_json::Error>;

/// Deserialization that reports the JSON path of the failing field.
pub trait SerdeResponseParse {
    type Error;

    fn serde_parse_custom<T>(self) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

impl SerdeResponseParse for &str {
    type Error = SerdePathError;

    fn serde_parse_custom<T>(self) -> Result<T, SerdePathError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(self))
    }
}

impl SerdeResponseParse for Value {
    type Error = SerdePathError;

    fn serde_parse_custom<T>(self) -> Result<T, SerdePathError>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_path_to_error::deserialize(self)
    }
}
