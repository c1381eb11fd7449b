//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the `params` directory of the software root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    let mut path = crate::host::get_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_from_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from_path<P, A>(path: A) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    A: AsRef<Path>,
{
    let params_str = read_to_string(path).map_err(LoadError::FileLoadError)?;

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct TestParams {
        bus: u8,
        gain: f64,
    }

    #[test]
    fn test_from_str() {
        let p: TestParams = from_str("bus = 1\ngain = 0.5\n").unwrap();
        assert_eq!(p, TestParams { bus: 1, gain: 0.5 });

        match from_str::<TestParams>("bus = \"one\"") {
            Err(LoadError::DeserialiseError(_)) => (),
            r => panic!("Expected a deserialise error, got {:?}", r),
        }
    }

    #[test]
    fn test_missing_file() {
        match load_from_path::<TestParams, _>("/does/not/exist.toml") {
            Err(LoadError::FileLoadError(_)) => (),
            r => panic!("Expected a file load error, got {:?}", r),
        }
    }
}
