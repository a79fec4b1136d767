//! Exporter configuration
//!
//! Settings live in the `[global]` section of an INI file
//! (`cdr_mongodb.conf` by default) and are read with the `config` crate.
//! Environment variables prefixed with `CDR_MONGODB_` override file values,
//! e.g. `CDR_MONGODB_GLOBAL__HOSTNAME=db1`.
//!
//! ```ini
//! [global]
//! hostname=localhost
//! port=27017
//! dbname=astriskcdrdb
//! collection=cdr
//! username=
//! password=
//! customfields=campaign, agent
//! ```

use crate::error::CdrError;
use config::{Config, Environment, File, FileFormat, Map, Value};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "cdr_mongodb.conf";

/// Default MongoDB port
pub const DEFAULT_PORT: u16 = 27017;

/// Default connect timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Characters separating names in the `customfields` list
const CUSTOM_FIELD_DELIMITERS: [char; 2] = [' ', ','];

/// Connection settings for the datastore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server hostname or IP
    pub hostname: String,

    /// Server port
    pub port: u16,

    /// Database name, also the authentication source
    pub dbname: String,

    /// Collection receiving the records
    pub collection: String,

    /// Username (empty disables authentication)
    pub username: String,

    pub password: String,

    /// Record variables exported after the fixed fields, in this order
    pub custom_fields: Vec<String>,

    /// Connect and server selection timeout
    pub timeout_secs: u64,
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_dbname() -> String {
    "astriskcdrdb".to_string()
}

fn default_collection() -> String {
    "cdr".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: DEFAULT_PORT,
            dbname: default_dbname(),
            collection: default_collection(),
            username: String::new(),
            password: String::new(),
            custom_fields: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ConnectionConfig {
    /// `dbname.collection`, always derived from the current values
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.dbname, self.collection)
    }

    /// Whether the authenticate step runs
    pub fn requires_auth(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build from the key/value pairs of the `[global]` section
    ///
    /// Missing keys take their defaults; numeric keys that do not parse fall
    /// back to their defaults with a warning.
    pub fn from_section(section: &Map<String, Value>) -> Self {
        let string = |key: &str, default: String| -> String {
            section
                .get(key)
                .and_then(|value| value.clone().into_string().ok())
                .map(|value| value.trim().to_string())
                .unwrap_or(default)
        };

        let port = number(section, "port", DEFAULT_PORT);
        let timeout_secs = number(section, "timeout", DEFAULT_TIMEOUT_SECS);
        let custom_fields = parse_custom_fields(&string("customfields", String::new()));

        let config = Self {
            hostname: string("hostname", default_hostname()),
            port,
            dbname: string("dbname", default_dbname()),
            collection: string("collection", default_collection()),
            username: string("username", String::new()),
            password: string("password", String::new()),
            custom_fields,
            timeout_secs,
        };

        debug!("Got hostname of {}", config.hostname);
        debug!("Got port of {}", config.port);
        debug!("Got dbname of {}", config.dbname);
        debug!("Got collection of {}", config.collection);
        debug!("Got user of {}", config.username);
        debug!("Got customfields of {:?}", config.custom_fields);

        config
    }
}

/// Read a numeric key, falling back to `default` when absent or malformed
fn number<T>(section: &Map<String, Value>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    let Some(raw) = section
        .get(key)
        .and_then(|value| value.clone().into_string().ok())
    else {
        return default;
    };

    leading_integer(&raw).parse().unwrap_or_else(|_| {
        warn!("Invalid {} value {:?}, using default {}", key, raw, default);
        default
    })
}

/// The optional sign and digits at the start of `raw`, ignoring anything after
///
/// `"27018 ; secondary"` reads as `27018`.
fn leading_integer(raw: &str) -> &str {
    let raw = raw.trim_start();
    let sign = usize::from(raw.starts_with(['+', '-']));
    let digits = raw[sign..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len() - sign);
    &raw[..sign + digits]
}

/// Split a `customfields` value on spaces and commas
///
/// Runs of delimiters collapse; the order of names is kept.
pub fn parse_custom_fields(value: &str) -> Vec<String> {
    value
        .split(CUSTOM_FIELD_DELIMITERS)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of reading the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// The file was read and has a `[global]` section
    Loaded(ConnectionConfig),

    /// The file does not exist or cannot be read
    Missing,

    /// The file was read but has no `[global]` section
    NoGlobal,
}

/// Reads `ConnectionConfig` from an INI file
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: String,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Modification time of the file, if it can be read
    pub fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
    }

    /// Load the configuration
    ///
    /// A missing file is not an error; it is reported as
    /// [`ConfigOutcome::Missing`]. Errors are returned only when the file
    /// exists but cannot be parsed.
    pub fn load(&self) -> Result<ConfigOutcome, CdrError> {
        if !Path::new(&self.path).is_file() {
            warn!("Unable to load config for mongodb CDR's: {}", self.path);
            return Ok(ConfigOutcome::Missing);
        }

        let config = Config::builder()
            .add_source(File::new(&self.path, FileFormat::Ini).required(true))
            .add_source(
                Environment::with_prefix("CDR_MONGODB")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let section = match config.get_table("global") {
            Ok(section) if !section.is_empty() => section,
            Ok(_) | Err(config::ConfigError::NotFound(_)) => {
                warn!("No [global] settings in {}", self.path);
                return Ok(ConfigOutcome::NoGlobal);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ConfigOutcome::Loaded(ConnectionConfig::from_section(&section)))
    }
}
