//! LibSVM format reader
//!
//! Each line is `label index:value index:value ...` with 1-based, strictly
//! positive feature indices. Blank lines and lines starting with `#` are
//! skipped.
//!
//! ```text
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1
//! ```

use crate::core::{Dataset, Result, Sample, SolverError, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Binary classification dataset loaded from LibSVM text
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let sample = Self::parse_line(line).map_err(|e| {
                SolverError::ParseError(format!("line {}: {}", line_num + 1, e))
            })?;
            if let Some(&last) = sample.features.indices.last() {
                dimensions = dimensions.max(last + 1);
            }
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SolverError::EmptyProblem);
        }

        Ok(Self {
            samples,
            dimensions,
        })
    }

    /// All samples in file order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples per class as `(positive, negative)`
    pub fn class_counts(&self) -> (usize, usize) {
        let positive = self.samples.iter().filter(|s| s.label > 0.0).count();
        (positive, self.samples.len() - positive)
    }

    /// Parse one non-empty line
    ///
    /// Labels other than `+1`/`-1` are mapped by sign, with zero going to
    /// the negative class.
    fn parse_line(line: &str) -> std::result::Result<Sample, String> {
        let mut tokens = line.split_whitespace();
        let label_token = tokens.next().ok_or("missing label")?;
        let label: f64 = label_token
            .parse()
            .map_err(|_| format!("invalid label '{label_token}'"))?;
        let label = if label > 0.0 { 1.0 } else { -1.0 };

        let mut indices = Vec::new();
        let mut values = Vec::new();
        for token in tokens {
            let (index, value) = token
                .split_once(':')
                .ok_or_else(|| format!("expected index:value, got '{token}'"))?;
            let index: usize = index
                .parse()
                .map_err(|_| format!("invalid feature index '{index}'"))?;
            if index == 0 {
                return Err("feature indices start at 1".to_string());
            }
            let value: f64 = value
                .parse()
                .map_err(|_| format!("invalid feature value '{value}'"))?;

            indices.push(index - 1);
            values.push(value);
        }

        Ok(Sample::new(SparseVector::new(indices, values), label))
    }
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn labels(dataset: &LibSVMDataset) -> Vec<f64> {
        dataset.samples().iter().map(|s| s.label).collect()
    }

    #[test]
    fn test_parse_line() {
        let sample = LibSVMDataset::parse_line("+1 1:0.5 3:1.2").unwrap();
        assert_eq!(sample.label, 1.0);
        assert_eq!(sample.features.indices, vec![0, 2]);
        assert_eq!(sample.features.values, vec![0.5, 1.2]);

        // Out-of-order indices are sorted
        let sample = LibSVMDataset::parse_line("-1 5:2.1 2:0.3").unwrap();
        assert_eq!(sample.label, -1.0);
        assert_eq!(sample.features.indices, vec![1, 4]);
        assert_eq!(sample.features.values, vec![0.3, 2.1]);
    }

    #[test]
    fn test_labels_mapped_by_sign() {
        assert_eq!(LibSVMDataset::parse_line("2 1:1.0").unwrap().label, 1.0);
        assert_eq!(LibSVMDataset::parse_line("-3 1:1.0").unwrap().label, -1.0);
        assert_eq!(LibSVMDataset::parse_line("0 1:1.0").unwrap().label, -1.0);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(LibSVMDataset::parse_line("+1 1").is_err());
        assert!(LibSVMDataset::parse_line("+1 abc:1.0").is_err());
        assert!(LibSVMDataset::parse_line("+1 1:abc").is_err());
        assert!(LibSVMDataset::parse_line("+1 0:1.0").is_err());
        assert!(LibSVMDataset::parse_line("yes 1:1.0").is_err());
    }

    #[test]
    fn test_from_reader() {
        let data = "# header\n+1 1:0.5 3:1.2\n\n-1 2:0.3 5:2.1\n+1\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.dim(), 5);
        assert_eq!(labels(&dataset), vec![1.0, -1.0, 1.0]);
        assert_eq!(dataset.class_counts(), (2, 1));
        assert!(dataset.get_sample(2).features.is_empty());
    }

    #[test]
    fn test_from_reader_reports_line_number() {
        let data = "+1 1:0.5\n-1 2:x\n";
        match LibSVMDataset::from_reader(Cursor::new(data)) {
            Err(SolverError::ParseError(msg)) => assert!(msg.starts_with("line 2:"), "{msg}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_reader_empty() {
        let result = LibSVMDataset::from_reader(Cursor::new("# Only comments\n\n"));
        assert!(matches!(result, Err(SolverError::EmptyProblem)));
    }

    #[test]
    fn test_large_sparse_indices() {
        let data = "+1 1:1.0 1000:2.0 5000:3.0\n-1 2:1.0 500:2.0\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.dim(), 5000);
        assert_eq!(dataset.samples()[0].features.indices, vec![0, 999, 4999]);
    }

    #[test]
    fn test_from_file() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "+1 1:0.5 3:1.2").expect("Failed to write");
        writeln!(temp_file, "-1 2:0.3 5:2.1").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(labels(&dataset), vec![1.0, -1.0]);

        let missing = LibSVMDataset::from_file("/non/existent/file.libsvm");
        assert!(matches!(missing, Err(SolverError::IoError(_))));
    }
}
