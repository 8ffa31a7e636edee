//! Language to image, filename and command mapping
//!
//! Unmapped languages fall back to an image that only echoes the source,
//! so such a submission surfaces as a failing verdict rather than passing.

use std::collections::HashMap;

use crate::model::Language;

const FALLBACK_IMAGE: &str = "ubuntu:20.04";
const FALLBACK_FILENAME: &str = "solution.txt";

/// How to build and run one language inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Docker image
    pub image: String,
    /// Fixed source filename inside the workspace
    pub filename: &'static str,
    /// Command run with the workspace as working directory
    pub command: Vec<String>,
    /// Language this toolchain serves, `None` for the fallback
    pub language: Option<Language>,
}

impl Toolchain {
    /// Resolve the toolchain for a submission's language id.
    ///
    /// `overrides` maps canonical language names to replacement images.
    pub fn for_language(language: &str, overrides: &HashMap<String, String>) -> Self {
        let Ok(language) = language.parse::<Language>() else {
            return Toolchain {
                image: FALLBACK_IMAGE.to_string(),
                filename: FALLBACK_FILENAME,
                command: vec!["cat".to_string(), FALLBACK_FILENAME.to_string()],
                language: None,
            };
        };

        let (image, filename, command) = match language {
            Language::Python => ("python:3.9-slim", "solution.py", "python solution.py"),
            Language::Javascript => ("node:16-slim", "solution.js", "node solution.js"),
            Language::Cpp => (
                "gcc:9",
                "solution.cpp",
                "g++ -std=c++17 -O2 -o /tmp/solution solution.cpp && /tmp/solution",
            ),
        };

        let image = overrides
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(language.as_str()))
            .map(|(_, image)| image.clone())
            .unwrap_or_else(|| image.to_string());

        Toolchain {
            image,
            filename,
            command: vec!["sh".to_string(), "-c".to_string(), command.to_string()],
            language: Some(language),
        }
    }

    /// Whether this is the non-executing fallback
    pub fn is_fallback(&self) -> bool {
        self.language.is_none()
    }
}
