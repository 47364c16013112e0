//! A file picked by the user for import.

use crate::file_size::format_file_size;

/// Extension accepted by the drag-and-drop entry point.
pub const CSV_EXTENSION: &str = ".csv";

/// File contents plus the name it is uploaded under.
///
/// Empty files are valid: the server decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.size())
    }

    /// `"Selected: products.csv (1.5 KB)"`.
    pub fn info_label(&self) -> String {
        format!("Selected: {} ({})", self.name, self.size_label())
    }

    /// Whether the name carries the `.csv` extension (case-sensitive,
    /// like the browser drop filter).
    pub fn is_csv(&self) -> bool {
        self.name.ends_with(CSV_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_label_includes_size() {
        let file = SelectedFile::new("products.csv", vec![b'a'; 1536]);
        assert_eq!(file.info_label(), "Selected: products.csv (1.5 KB)");
    }

    #[test]
    fn empty_file_reports_zero_bytes() {
        let file = SelectedFile::new("empty.csv", Vec::new());
        assert_eq!(file.size(), 0);
        assert_eq!(file.size_label(), "0 Bytes");
    }

    #[test]
    fn csv_extension_filter() {
        assert!(SelectedFile::new("a.csv", vec![]).is_csv());
        assert!(!SelectedFile::new("a.txt", vec![]).is_csv());
        assert!(!SelectedFile::new("a.CSV", vec![]).is_csv());
        assert!(!SelectedFile::new("csv", vec![]).is_csv());
    }
}
