//! Saving and loading circuits and build configurations
//!
//! Circuits are written with a leading `metadata_version` so that files from
//! incompatible releases are rejected before the circuit itself is decoded.
//! The file format is chosen from the path's extension: `.yaml`/`.yml`,
//! `.json`, or `.bincode`.
mod config;
mod error;
mod utils;

pub use config::SerializedType;
pub use error::Error;
pub use utils::{deserialize_file, load, save, serialize_obj};

use std::path::Path;

use arbor_pc::{BuildConfig, Circuit, SerializedCircuit};
use log::info;
use serde::{Deserialize, Serialize};

/// The circuit file version this release reads and writes
pub const METADATA_VERSION: i32 = 1;

#[derive(Serialize)]
struct CircuitFileRef<'a> {
    metadata_version: i32,
    circuit: &'a Circuit,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CircuitFile {
    #[allow(dead_code)]
    metadata_version: i32,
    circuit: SerializedCircuit,
}

#[derive(Deserialize)]
struct VersionHeader {
    metadata_version: i32,
}

fn metadata_version(
    bytes: &[u8],
    serialized_type: SerializedType,
) -> Result<i32, Error> {
    match serialized_type {
        // bincode writes struct fields in order, so the version leads
        SerializedType::Bincode => {
            bincode::deserialize::<i32>(bytes).map_err(Error::Bincode)
        }
        _ => utils::from_bytes::<VersionHeader>(bytes, serialized_type)
            .map(|header| header.metadata_version),
    }
}

/// Save a circuit to `path` using the given format
pub fn save_circuit_as<P: AsRef<Path>>(
    circuit: &Circuit,
    path: P,
    serialized_type: SerializedType,
) -> Result<(), Error> {
    info!("Saving circuit to {:?}...", path.as_ref());
    let file = CircuitFileRef {
        metadata_version: METADATA_VERSION,
        circuit,
    };
    save(&file, path, serialized_type)?;
    info!("Circuit saved.");
    Ok(())
}

/// Save a circuit to `path` in the format named by its extension
///
/// # Example
///
/// ```
/// # use arbor::metadata::{load_circuit, save_circuit};
/// # use arbor::{build, BuildConfig, DataMatrix};
/// let data: DataMatrix = "\
/// category_counts: 3
/// 0
/// 1
/// 1
/// 2
/// "
/// .parse()
/// .unwrap();
/// # let config = BuildConfig {
/// #     min_instances_slice: 1,
/// #     independence_threshold: 0.3,
/// #     min_gain: 0.0,
/// #     max_depth: 4,
/// #     leaf_smoothing_alpha: 0.0,
/// #     variance_floor_epsilon: 1E-6,
/// #     n_threads: None,
/// # };
/// let circuit = build(&data, &config).unwrap();
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("circuit.json");
/// save_circuit(&circuit, &path).unwrap();
///
/// let loaded = load_circuit(&path).unwrap();
/// let ln_p = loaded.ln_likelihood(&[1.0]).unwrap();
/// assert!((ln_p - 0.5_f64.ln()).abs() < 1E-10);
/// ```
pub fn save_circuit<P: AsRef<Path>>(
    circuit: &Circuit,
    path: P,
) -> Result<(), Error> {
    let serialized_type = utils::serialized_type_from_path(&path)?;
    save_circuit_as(circuit, path, serialized_type)
}

/// Load a circuit from `path` using the given format
///
/// Files from other metadata versions are rejected before the circuit is
/// decoded, and a decoded circuit that is not well formed is reported as
/// [`Error::InvalidCircuit`].
pub fn load_circuit_as<P: AsRef<Path>>(
    path: P,
    serialized_type: SerializedType,
) -> Result<Circuit, Error> {
    info!("Loading circuit from {:?}...", path.as_ref());
    let bytes = utils::read_bytes(path)?;

    match metadata_version(&bytes, serialized_type)? {
        METADATA_VERSION => {
            let file: CircuitFile =
                utils::from_bytes(&bytes, serialized_type)?;
            let circuit = Circuit::try_from(file.circuit)?;
            info!("Circuit loaded.");
            Ok(circuit)
        }
        requested => Err(Error::UnsupportedMetadataVersion {
            requested,
            max_supported: METADATA_VERSION,
        }),
    }
}

/// Load a circuit from `path` in the format named by its extension
pub fn load_circuit<P: AsRef<Path>>(path: P) -> Result<Circuit, Error> {
    let serialized_type = utils::serialized_type_from_path(&path)?;
    load_circuit_as(path, serialized_type)
}

/// Load a build configuration from a YAML or JSON file
pub fn load_build_config<P: AsRef<Path>>(
    path: P,
) -> Result<BuildConfig, Error> {
    info!("Loading build config from {:?}", path.as_ref());
    deserialize_file(path)
}
