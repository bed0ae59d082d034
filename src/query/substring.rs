use serde::{Deserialize, Serialize};

/// A parsed substring query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substring {
    pub pattern: String,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Match against file names instead of file content
    #[serde(default)]
    pub file_name: bool,
}

impl Substring {
    /// Case-insensitive content query
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive: false,
            file_name: false,
        }
    }

    /// Case-insensitive file name query
    pub fn file_name(pattern: impl Into<String>) -> Self {
        Self {
            file_name: true,
            ..Self::new(pattern)
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let q = Substring::file_name("main").case_sensitive(true);
        assert!(q.file_name);
        assert!(q.case_sensitive);
        assert_eq!(q.pattern, "main");
        assert!(!Substring::new("x").file_name);
    }

    #[test]
    fn test_deserialize_defaults() {
        let q: Substring = serde_json::from_str(r#"{"pattern": "fn main"}"#).unwrap();
        assert_eq!(q, Substring::new("fn main"));
    }
}
