use arbor_pc::CircuitError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Invalid serialized type `{0}`. Options are `bincode`, `yaml`, and \
        `json`."
    )]
    SerializedTypeInvalid(String),
    #[error("IoError: {0}")]
    Io(#[from] io::Error),
    #[error("YamlError: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JsonError: {0}")]
    Json(#[from] serde_json::Error),
    #[error("BincodeError: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Unsupported metadata version `{requested}`. Max supported version: {max_supported}")]
    UnsupportedMetadataVersion { requested: i32, max_supported: i32 },
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(#[from] CircuitError),
}
