use std::fmt;

use serde::{Deserialize, Serialize};

/// Programming language of a snippet.
///
/// The editor offers a fixed label set; anything else read back from the
/// store is kept verbatim as [`Language::Unknown`] so it round-trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    JavaScript,
    Python,
    Java,
    Cpp,
    CSharp,
    Php,
    Ruby,
    Go,
    TypeScript,
    Swift,
    Kotlin,
    Rust,
    Html,
    Css,
    Sql,
    Bash,
    Unknown(String),
}

impl Language {
    /// The fixed label set in editor order. The first entry is the default.
    pub const ALL: [Language; 16] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::CSharp,
        Language::Php,
        Language::Ruby,
        Language::Go,
        Language::TypeScript,
        Language::Swift,
        Language::Kotlin,
        Language::Rust,
        Language::Html,
        Language::Css,
        Language::Sql,
        Language::Bash,
    ];

    pub fn label(&self) -> &str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Php => "PHP",
            Language::Ruby => "Ruby",
            Language::Go => "Go",
            Language::TypeScript => "TypeScript",
            Language::Swift => "Swift",
            Language::Kotlin => "Kotlin",
            Language::Rust => "Rust",
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Sql => "SQL",
            Language::Bash => "Bash",
            Language::Unknown(label) => label,
        }
    }

    /// Class-name slug understood by browser-side highlighters.
    pub fn slug(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::TypeScript => "typescript",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Rust => "rust",
            Language::Html => "markup",
            Language::Css => "css",
            Language::Sql => "sql",
            Language::Bash => "bash",
            Language::Unknown(_) => "plaintext",
        }
    }

    /// Resolve a label, case-insensitively, against the fixed set.
    pub fn from_label(label: &str) -> Language {
        let trimmed = label.trim();
        Language::ALL
            .iter()
            .find(|lang| lang.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Language::Unknown(trimmed.to_string()))
    }

    /// Resolve a stored label exactly, so stored text survives a round trip.
    pub fn from_stored(label: String) -> Language {
        match Language::ALL.iter().find(|lang| lang.label() == label) {
            Some(known) => known.clone(),
            None => Language::Unknown(label),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown(_))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Language {
    fn from(label: String) -> Self {
        Language::from_stored(label)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        match lang {
            Language::Unknown(label) => label,
            known => known.label().to_string(),
        }
    }
}
