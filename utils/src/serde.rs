pub type SerdePathError = serde_path_to_error::Error<serde_json::Error>;

/// Deserializes JSON, naming the path of the first field that does not fit.
pub fn parse_with_path<T>(s: &str) -> Result<T, SerdePathError>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(s))
}
