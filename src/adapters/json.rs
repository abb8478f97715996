//! JSON configuration files and result reports.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::SourceError;
use crate::domain::ConfigurationSpec;

/// Read a JSON configuration file.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load_configuration_spec(path: &Path) -> Result<ConfigurationSpec, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SourceError::Configuration {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `report` as pretty-printed JSON followed by a newline.
///
/// # Errors
/// Returns error if serialization or the writer fails.
pub fn write_report<T: Serialize, W: Write>(writer: &mut W, report: &T) -> crate::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CriterionKind, MetricSpec, Transformation};
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_configuration_file() {
        let mut file = NamedTempFile::new().expect("Should create temp file");
        write!(
            file,
            r#"{{"suppression_limit": 0.1, "metric": "discernibility", "criteria": ["prosecutor"]}}"#
        )
        .expect("Should write fixture");

        let parsed = load_configuration_spec(file.path()).expect("Should parse");
        assert_eq!(parsed.metric, Some(MetricSpec::Name("discernibility".to_string())));
        assert_eq!(parsed.criteria, vec![CriterionKind::Prosecutor.name().to_string()]);
        assert_eq!(parsed.suppression_limit, 0.1);
    }

    #[test]
    fn test_broken_configuration() {
        let mut file = NamedTempFile::new().expect("Should create temp file");
        write!(file, "{{").expect("Should write fixture");
        assert!(matches!(
            load_configuration_spec(file.path()),
            Err(SourceError::Configuration { .. })
        ));
    }

    #[test]
    fn test_write_report() {
        let transformation = Transformation::new(vec!["zip".to_string()], vec![1], 0);
        let mut out = Vec::new();
        write_report(&mut out, &transformation).expect("Should write");
        let text = String::from_utf8(out).expect("Should be UTF-8");
        assert!(text.ends_with('\n'));
        let parsed: Transformation = serde_json::from_str(&text).expect("Should parse back");
        assert_eq!(parsed, transformation);
    }
}
