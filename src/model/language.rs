//! Supported submission languages

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Languages the synthesizer can wrap and the sandbox can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// CPython 3
    Python,
    /// Node.js
    Javascript,
    /// C++17 compiled with g++
    Cpp,
}

impl Language {
    /// Canonical spelling stored by the intake API
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Javascript => "Javascript",
            Language::Cpp => "Cpp",
        }
    }

    /// Every supported language
    pub fn all() -> [Language; 3] {
        [Language::Python, Language::Javascript, Language::Cpp]
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Language::Python),
            "javascript" | "js" | "node" => Ok(Language::Javascript),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            _ => Err(Error::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
