//! Conversion result value

use std::path::PathBuf;

use serde::Serialize;

use super::error::Error;

/// Files produced by a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedFiles {
    /// Reverse conversion: one topology document
    Single(PathBuf),
    /// Forward conversion: the collections that were actually written
    Many(Vec<PathBuf>),
}

/// Outcome of one conversion, serialized as `{status, generated_files, error}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: bool,
    pub generated_files: Option<GeneratedFiles>,
    pub error: Option<String>,
}

impl Response {
    pub fn success(files: GeneratedFiles) -> Self {
        Self {
            status: true,
            generated_files: Some(files),
            error: None,
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            status: false,
            generated_files: None,
            error: Some(err.to_string()),
        }
    }

    /// Paths listed in the response, whichever shape it has
    pub fn paths(&self) -> Vec<PathBuf> {
        match &self.generated_files {
            Some(GeneratedFiles::Single(path)) => vec![path.clone()],
            Some(GeneratedFiles::Many(paths)) => paths.clone(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization_shapes() {
        let single = Response::success(GeneratedFiles::Single(PathBuf::from("out/wa.graph.osm.xml")));
        let json = serde_json::to_value(&single).unwrap();
        assert_eq!(json["status"], true);
        assert_eq!(json["generated_files"], "out/wa.graph.osm.xml");
        assert!(json["error"].is_null());

        let many = Response::success(GeneratedFiles::Many(vec![PathBuf::from("a"), PathBuf::from("b")]));
        let json = serde_json::to_value(&many).unwrap();
        assert_eq!(json["generated_files"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_failure_carries_message() {
        let response = Response::failure(&Error::InputUnreadable("nope".into()));
        assert!(!response.status);
        assert!(response.generated_files.is_none());
        assert_eq!(response.error.as_deref(), Some("Input unreadable: nope"));
        assert!(response.paths().is_empty());
    }
}
