//! Misc file utilities
use std::fs;
use std::io;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metadata::{Error, SerializedType};

fn extension_from_path<P: AsRef<Path>>(path: &P) -> Result<&str, Error> {
    path.as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid file type",
            ))
        })
}

pub(crate) fn serialized_type_from_path<P: AsRef<Path>>(
    path: &P,
) -> Result<SerializedType, Error> {
    let ext = extension_from_path(path)?;
    SerializedType::from_str(ext)
}

/// Serialize `obj` to `path` in the format named by the file extension
pub fn serialize_obj<T, P>(obj: &T, path: P) -> Result<(), Error>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let serialized_type = serialized_type_from_path(&path)?;

    save(obj, path, serialized_type)
}

/// Deserialize the contents of `path` in the format named by the file
/// extension
pub fn deserialize_file<T, P>(path: P) -> Result<T, Error>
where
    for<'de> T: Deserialize<'de>,
    P: AsRef<Path>,
{
    let serialized_type = serialized_type_from_path(&path)?;

    load(path, serialized_type)
}

pub(crate) fn to_bytes<T: Serialize>(
    obj: &T,
    serialized_type: SerializedType,
) -> Result<Vec<u8>, Error> {
    match serialized_type {
        SerializedType::Yaml => serde_yaml::to_string(&obj)
            .map_err(Error::Yaml)
            .map(|s| s.into_bytes()),
        SerializedType::Json => {
            serde_json::to_vec_pretty(&obj).map_err(Error::Json)
        }
        SerializedType::Bincode => {
            bincode::serialize(&obj).map_err(Error::Bincode)
        }
    }
}

pub(crate) fn from_bytes<T>(
    bytes: &[u8],
    serialized_type: SerializedType,
) -> Result<T, Error>
where
    for<'de> T: Deserialize<'de>,
{
    match serialized_type {
        SerializedType::Yaml => {
            serde_yaml::from_slice(bytes).map_err(Error::Yaml)
        }
        SerializedType::Json => {
            serde_json::from_slice(bytes).map_err(Error::Json)
        }
        SerializedType::Bincode => {
            bincode::deserialize(bytes).map_err(Error::Bincode)
        }
    }
}

pub fn save<T, P>(
    obj: &T,
    path: P,
    serialized_type: SerializedType,
) -> Result<(), Error>
where
    T: Serialize,
    P: AsRef<Path>,
{
    to_bytes(obj, serialized_type).and_then(|bytes| {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = io::BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush().map_err(Error::Io)
    })
}

pub fn load<T, P>(path: P, serialized_type: SerializedType) -> Result<T, Error>
where
    for<'de> T: Deserialize<'de>,
    P: AsRef<Path>,
{
    let bytes = read_bytes(path)?;
    from_bytes(&bytes, serialized_type)
}

pub(crate) fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let mut file = io::BufReader::new(fs::File::open(path)?);
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
