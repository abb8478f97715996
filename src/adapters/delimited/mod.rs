//! Delimited text files (CSV-style, `;` by default).
//!
//! Datasets are stored with a header row. Hierarchy files have no header:
//! each line lists a raw value followed by its generalizations.
//!
//! Fields are neither quoted nor escaped. Loading trims every field, so
//! writing rejects values that contain the delimiter or a line break, or
//! that start or end with whitespace.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::SourceError;
use crate::domain::{Dataset, Hierarchy};
use crate::ports::{DatasetSource, HierarchyProvider};

/// Default field separator.
pub const DEFAULT_DELIMITER: char = ';';

fn read_rows(path: &Path, delimiter: char) -> Result<Vec<Vec<String>>, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<Vec<String>> = content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(delimiter).map(|v| v.trim().to_string()).collect())
        .collect();
    if rows.is_empty() {
        return Err(SourceError::EmptyFile(path.to_path_buf()));
    }
    Ok(rows)
}

/// Dataset stored as one delimited file with a header row.
#[derive(Debug, Clone)]
pub struct DelimitedFile {
    path: PathBuf,
    delimiter: char,
}

impl DelimitedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `dataset` with its header.
    ///
    /// # Errors
    /// Returns `SourceError::Unencodable` before touching the file if a value
    /// would not load back unchanged, and `SourceError::Io` if the file
    /// cannot be written.
    pub fn write_dataset(&self, dataset: &Dataset) -> Result<(), SourceError> {
        if let Some(value) = first_unencodable(dataset, self.delimiter) {
            return Err(SourceError::Unencodable {
                path: self.path.clone(),
                value: value.to_string(),
            });
        }
        let io_error = |source| SourceError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = fs::File::create(&self.path).map_err(io_error)?;
        write_delimited(&mut file, dataset, self.delimiter).map_err(io_error)
    }
}

impl DatasetSource for DelimitedFile {
    type Error = SourceError;

    fn load_dataset(&self) -> Result<Dataset, Self::Error> {
        let mut rows = read_rows(&self.path, self.delimiter)?;
        let header = rows.remove(0);
        let dataset = Dataset::new(header, rows).map_err(|source| SourceError::Data {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!("Loaded {} records from {}", dataset.len(), self.path.display());
        Ok(dataset)
    }
}

fn is_encodable(value: &str, delimiter: char) -> bool {
    !value.contains(delimiter) && !value.contains(['\n', '\r']) && value.trim() == value
}

fn first_unencodable(dataset: &Dataset, delimiter: char) -> Option<&str> {
    dataset
        .header()
        .iter()
        .chain(dataset.rows().iter().flatten())
        .map(String::as_str)
        .find(|value| !is_encodable(value, delimiter))
}

/// Write `dataset` as delimited text, header first.
fn write_delimited<W: Write>(writer: &mut W, dataset: &Dataset, delimiter: char) -> std::io::Result<()> {
    let separator = delimiter.to_string();
    writeln!(writer, "{}", dataset.header().join(&separator))?;
    for row in dataset.rows() {
        writeln!(writer, "{}", row.join(&separator))?;
    }
    writer.flush()
}

/// Hierarchies stored as one delimited file per attribute.
#[derive(Debug, Clone, Default)]
pub struct HierarchyFiles {
    files: Vec<(String, PathBuf)>,
    delimiter: Option<char>,
}

impl HierarchyFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hierarchy file of `attribute`.
    #[must_use]
    pub fn with_file(mut self, attribute: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.push((attribute.into(), path.into()));
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl HierarchyProvider for HierarchyFiles {
    type Error = SourceError;

    fn load_hierarchies(&self) -> Result<Vec<(String, Hierarchy)>, Self::Error> {
        let delimiter = self.delimiter.unwrap_or(DEFAULT_DELIMITER);
        self.files
            .iter()
            .map(|(attribute, path)| {
                let rows = read_rows(path, delimiter)?;
                let hierarchy = Hierarchy::new(rows).map_err(|source| SourceError::Hierarchy {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(
                    "Loaded hierarchy for {} with height {} from {}",
                    attribute,
                    hierarchy.height(),
                    path.display()
                );
                Ok((attribute.clone(), hierarchy))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataError;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("Should write fixture");
        path
    }

    #[test]
    fn test_load_dataset_and_hierarchy() {
        let dir = TempDir::new().expect("Should create temp dir");
        let data = write(&dir, "data.csv", "age;zip\r\n34;81667\n45;81675\n\n");
        let zip = write(&dir, "zip.csv", "81667;8166*;*\n81675;8167*;*\n");

        let dataset = DelimitedFile::new(&data).load_dataset().expect("Should load data");
        assert_eq!(dataset.header(), &["age".to_string(), "zip".to_string()]);
        assert_eq!(dataset.len(), 2);

        let hierarchies = HierarchyFiles::new()
            .with_file("zip", &zip)
            .load_hierarchies()
            .expect("Should load hierarchy");
        assert_eq!(hierarchies.len(), 1);
        assert_eq!(hierarchies[0].0, "zip");
        assert_eq!(hierarchies[0].1.height(), 2);
    }

    #[test]
    fn test_custom_delimiter() {
        let dir = TempDir::new().expect("Should create temp dir");
        let data = write(&dir, "data.csv", "a,b\n1,2\n");
        let dataset = DelimitedFile::new(&data)
            .with_delimiter(',')
            .load_dataset()
            .expect("Should load");
        assert_eq!(dataset.row(0), Some(&["1".to_string(), "2".to_string()][..]));
    }

    #[test]
    fn test_errors_name_the_file() {
        let dir = TempDir::new().expect("Should create temp dir");
        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            DelimitedFile::new(&missing).load_dataset(),
            Err(SourceError::Io { path, .. }) if path == missing
        ));

        let empty = write(&dir, "empty.csv", "\n\n");
        assert!(matches!(
            DelimitedFile::new(&empty).load_dataset(),
            Err(SourceError::EmptyFile(_))
        ));

        let ragged = write(&dir, "ragged.csv", "a;b\n1\n");
        assert!(matches!(
            DelimitedFile::new(&ragged).load_dataset(),
            Err(SourceError::Data {
                source: DataError::RaggedRow { .. },
                ..
            })
        ));

        let inconsistent = write(&dir, "h.csv", "1;a;x\n2;a;y\n");
        assert!(matches!(
            HierarchyFiles::new().with_file("v", &inconsistent).load_hierarchies(),
            Err(SourceError::Hierarchy { .. })
        ));
    }

    #[test]
    fn test_write_roundtrip() {
        let dir = TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("out.csv");
        let dataset = Dataset::new(
            vec!["zip".to_string()],
            vec![vec!["8166*".to_string()], vec!["*".to_string()]],
        )
        .expect("Should build");

        let file = DelimitedFile::new(&path);
        file.write_dataset(&dataset).expect("Should write");
        let reloaded = file.load_dataset().expect("Should reload");
        assert_eq!(reloaded.rows(), dataset.rows());
    }

    #[test]
    fn test_write_rejects_values_that_do_not_reload() {
        let dir = TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("out.csv");
        for value in ["Munich;Bavaria", " padded", "two\nlines"] {
            let dataset = Dataset::new(vec!["city".to_string()], vec![vec![value.to_string()]])
                .expect("Should build");
            assert!(matches!(
                DelimitedFile::new(&path).write_dataset(&dataset),
                Err(SourceError::Unencodable { value: v, .. }) if v == value
            ));
            assert!(!path.exists());
        }

        // The same value is fine under another delimiter.
        let dataset = Dataset::new(vec!["city".to_string()], vec![vec!["Munich;Bavaria".to_string()]])
            .expect("Should build");
        let file = DelimitedFile::new(&path).with_delimiter(',');
        file.write_dataset(&dataset).expect("Should write");
        assert_eq!(
            file.load_dataset().expect("Should reload").rows(),
            dataset.rows()
        );
    }
}
