//! Parsing configuration files into snapshots.

use crate::core::ConfigSnapshot;
use crate::error::{LoggerError, Result};
use config::{File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// On-disk shape of a configuration file. All four keys are required.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    topic: String,
    broker: String,
    port: i64,
    source: String,
}

/// Reads and parses one configuration file.
///
/// The format is detected from the file extension:
/// - `.yaml`, `.yml` -> YAML
/// - `.toml` -> TOML
/// - `.json` -> JSON
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::core::SnapshotLoader;
///
/// let loader = SnapshotLoader::new("/etc/myapp/logging.yaml").unwrap();
/// let snapshot = loader.load().unwrap();
/// println!("{}", snapshot);
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    path: PathBuf,
    format: FileFormat,
}

impl SnapshotLoader {
    /// Create a loader for `path`.
    ///
    /// The file does not need to exist yet.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::UnsupportedFormat` if the extension is not recognized.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = detect_format(&path)?;
        Ok(Self { path, format })
    }

    /// The file this loader reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw file contents.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::WatcherIo` if the file cannot be read.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|source| LoggerError::WatcherIo {
            path: self.path.clone(),
            source,
        })
    }

    /// Read and parse the file.
    pub fn load(&self) -> Result<ConfigSnapshot> {
        let content = self.read()?;
        self.parse(&content)
    }

    /// Parse previously read file contents into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::ConfigParse` if the content is not valid for the
    /// detected format, a required key is missing, or the port is out of range.
    pub fn parse(&self, content: &[u8]) -> Result<ConfigSnapshot> {
        let text = std::str::from_utf8(content)
            .map_err(|e| self.parse_error(format!("file is not valid UTF-8: {}", e)))?;

        let raw = config::Config::builder()
            .add_source(File::from_str(text, self.format))
            .build()
            .map_err(|e| self.parse_error(e.to_string()))?
            .try_deserialize::<SnapshotFile>()
            .map_err(|e| self.parse_error(e.to_string()))?;

        ConfigSnapshot::from_wide_port(raw.topic, raw.broker, raw.port, raw.source)
            .map_err(|e| self.parse_error(e.to_string()))
    }

    fn parse_error(&self, reason: String) -> LoggerError {
        LoggerError::ConfigParse {
            path: self.path.clone(),
            reason,
        }
    }
}

fn detect_format(path: &Path) -> Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
        Some("toml") => Ok(FileFormat::Toml),
        Some("json") => Ok(FileFormat::Json),
        _ => Err(LoggerError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_format() {
        assert!(SnapshotLoader::new("logging.yaml").is_ok());
        assert!(SnapshotLoader::new("logging.yml").is_ok());
        assert!(SnapshotLoader::new("logging.toml").is_ok());
        assert!(SnapshotLoader::new("logging.JSON").is_ok());
    }

    #[test]
    fn test_detect_format_unknown() {
        let result = SnapshotLoader::new("logging.txt");
        assert!(matches!(result, Err(LoggerError::UnsupportedFormat(_))));

        let result = SnapshotLoader::new("logging");
        assert!(matches!(result, Err(LoggerError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_yaml() {
        let loader = SnapshotLoader::new("logging.yaml").unwrap();
        let snapshot = loader
            .parse(b"topic: logs/app\nbroker: mqtt.local\nport: 1883\nsource: billing\n")
            .unwrap();

        assert_eq!(snapshot.topic(), "logs/app");
        assert_eq!(snapshot.broker(), "mqtt.local");
        assert_eq!(snapshot.port(), 1883);
        assert_eq!(snapshot.source(), "billing");
    }

    #[test]
    fn test_parse_toml() {
        let loader = SnapshotLoader::new("logging.toml").unwrap();
        let snapshot = loader
            .parse(b"topic = \"logs\"\nbroker = \"localhost\"\nport = 8883\nsource = \"svc\"\n")
            .unwrap();
        assert_eq!(snapshot.port(), 8883);
    }

    #[test]
    fn test_parse_json() {
        let loader = SnapshotLoader::new("logging.json").unwrap();
        let snapshot = loader
            .parse(br#"{"topic": "logs", "broker": "localhost", "port": 1883, "source": "svc"}"#)
            .unwrap();
        assert_eq!(snapshot.source(), "svc");
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let loader = SnapshotLoader::new("logging.yaml").unwrap();
        let snapshot = loader
            .parse(b"topic: t\nbroker: b\nport: 1883\nsource: s\nretain: true\n")
            .unwrap();
        assert_eq!(snapshot.topic(), "t");
    }

    #[test]
    fn test_parse_missing_key() {
        let loader = SnapshotLoader::new("logging.yaml").unwrap();
        let result = loader.parse(b"topic: t\nbroker: b\nport: 1883\n");
        assert!(matches!(result, Err(LoggerError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_empty_file() {
        let loader = SnapshotLoader::new("logging.json").unwrap();
        assert!(matches!(loader.parse(b""), Err(LoggerError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_truncated_json() {
        let loader = SnapshotLoader::new("logging.json").unwrap();
        let result = loader.parse(br#"{"topic": "logs", "broker": "local"#);
        assert!(matches!(result, Err(LoggerError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_port_out_of_range() {
        let loader = SnapshotLoader::new("logging.yaml").unwrap();
        let result = loader.parse(b"topic: t\nbroker: b\nport: 70000\nsource: s\n");
        match result {
            Err(LoggerError::ConfigParse { reason, .. }) => assert!(reason.contains("port")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");
        fs::write(
            &config_path,
            r#"
topic: logs/app
broker: localhost
port: 1883
source: tests
"#,
        )
        .unwrap();

        let snapshot = SnapshotLoader::new(&config_path).unwrap().load().unwrap();
        assert_eq!(snapshot.source(), "tests");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let loader = SnapshotLoader::new("/nonexistent/logging.yaml").unwrap();
        assert!(matches!(loader.load(), Err(LoggerError::WatcherIo { .. })));
    }
}
