//! This is the `ConfigFile` struct.
//!
//! This is for finding the right default location for the configuration files of `skytrack`.
//! It is a configuration struct neutral loading engine: it knows where to look, reads the HCL
//! file and checks its version, whatever `T` is.
//!
//! This encapsulates the configuration file, available with `.inner()`.
//!

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use eyre::Result;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, trace};

use crate::makepath;

/// Config filename
const CONFIG: &str = "config.hcl";

/// Main name for the directory base
const TAG: &str = "skytrack";

/// Any configuration struct carries a `version` field checked on load.
///
pub trait Versioned {
    /// Version this code understands.
    const CVERSION: usize;

    fn version(&self) -> usize;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Bad config file version v{0}, need v{1}")]
    BadVersion(usize, usize),
    #[error("Unknown config file {0:?} and no default in {1:?}")]
    NotFound(PathBuf, PathBuf),
    #[error("No home directory, can not continue")]
    NoHome,
}

/// A loaded configuration file along with where it came from.
///
#[derive(Debug)]
pub struct ConfigFile<T: Debug + DeserializeOwned + Versioned> {
    /// Where the file was read from.
    path: PathBuf,
    inner: T,
}

impl<T> ConfigFile<T>
where
    T: Debug + DeserializeOwned + Versioned,
{
    /// Returns the path of the default config directory, `~/.config/skytrack` on Unix.
    ///
    #[tracing::instrument]
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let base = match BaseDirs::new() {
            Some(base) => {
                #[cfg(unix)]
                let base = base.home_dir().join(".config");

                #[cfg(windows)]
                let base = base.data_local_dir().to_path_buf();

                base
            }
            None => {
                #[cfg(unix)]
                let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;

                #[cfg(windows)]
                let home = std::env::var("LOCALAPPDATA").map_err(|_| ConfigError::NoHome)?;

                makepath!(home, ".config")
            }
        };
        let base = base.join(TAG);
        debug!("base = {base:?}");
        Ok(base)
    }

    /// Returns the path of the default config file
    ///
    #[tracing::instrument]
    pub fn default_file() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_path()?.join(CONFIG))
    }

    /// Load the file and return a struct T in the right format.
    ///
    /// Use the following search path:
    /// - file specified on CLI
    /// - default file in the config directory
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&Path>) -> Result<ConfigFile<T>> {
        let default = Self::default_file()?;
        let fname = match fname {
            Some(fname) => fname.to_path_buf(),
            None => default.clone(),
        };

        if !fname.exists() {
            return Err(ConfigError::NotFound(fname, default).into());
        }
        let path = fname.canonicalize()?;

        trace!("Loading config file {path:?}");
        let data = fs::read_to_string(&path)?;
        let inner = Self::parse(&data)?;

        Ok(ConfigFile { path, inner })
    }

    /// Decode and check a configuration from its HCL text.
    ///
    pub fn parse(data: &str) -> Result<T> {
        let inner: T = hcl::from_str(data)?;
        debug!("struct data = {inner:?}");

        if inner.version() != T::CVERSION {
            return Err(ConfigError::BadVersion(inner.version(), T::CVERSION).into());
        }
        Ok(inner)
    }

    /// Where this configuration was read from.
    ///
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the inner configuration
    ///
    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Foo {
        version: usize,
        name: String,
    }

    impl Versioned for Foo {
        const CVERSION: usize = 2;

        fn version(&self) -> usize {
            self.version
        }
    }

    #[test]
    fn test_config_parse() -> Result<()> {
        let foo = ConfigFile::<Foo>::parse("version = 2\nname = \"balloon\"\n")?;
        assert_eq!("balloon", foo.name);
        Ok(())
    }

    #[test]
    fn test_config_parse_bad_version() {
        let foo = ConfigFile::<Foo>::parse("version = 1\nname = \"balloon\"\n");
        let err = foo.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::BadVersion(1, 2))
        ));
    }

    #[test]
    fn test_config_load_missing() {
        let r = ConfigFile::<Foo>::load(Some(Path::new("/nonexistent/skytrack.hcl")));
        assert!(r.is_err());
    }

    #[test]
    fn test_config_load_file() -> Result<()> {
        let fname = std::env::temp_dir().join("skytrack-test-config.hcl");
        fs::write(&fname, "version = 2\nname = \"edge\"\n")?;

        let cfg = ConfigFile::<Foo>::load(Some(&fname))?;
        assert_eq!("edge", cfg.inner().name);
        assert!(cfg.path().ends_with("skytrack-test-config.hcl"));
        Ok(())
    }
}
