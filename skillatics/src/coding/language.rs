//! Supported editor languages and their starter templates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Java,
    Cpp,
    JavaScript,
}

/// Static per-language editor settings
#[derive(Debug, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Wire id, also the key into a question's `starter_code` map
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    /// Used when a question has no starter code for this language
    pub template: &'static str,
}

const PYTHON: LanguageConfig = LanguageConfig {
    id: "python",
    name: "Python",
    icon: "🐍",
    template: "# Write your code here\ndef solution(nums, target):\n    # Example: Two Sum\n    pass\n",
};

const JAVA: LanguageConfig = LanguageConfig {
    id: "java",
    name: "Java",
    icon: "☕",
    template: "public class Main {\n    public static void main(String[] args) {\n        // Write your code here\n    }\n}",
};

const CPP: LanguageConfig = LanguageConfig {
    id: "cpp",
    name: "C++",
    icon: "⚡",
    template: "#include <iostream>\nusing namespace std;\n\nint main() {\n    // Write your code here\n    return 0;\n}",
};

const JAVASCRIPT: LanguageConfig = LanguageConfig {
    id: "javascript",
    name: "JavaScript",
    icon: "📜",
    template: "// Write your code here\nconst solution = () => {\n    \n}\n",
};

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::JavaScript,
    ];

    pub const fn config(self) -> &'static LanguageConfig {
        match self {
            Language::Python => &PYTHON,
            Language::Java => &JAVA,
            Language::Cpp => &CPP,
            Language::JavaScript => &JAVASCRIPT,
        }
    }

    pub const fn id(self) -> &'static str {
        self.config().id
    }

    pub const fn template(self) -> &'static str {
        self.config().template
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().name)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            "javascript" | "js" => Ok(Language::JavaScript),
            other => Err(format!(
                "unsupported language '{other}' (python, java, cpp, javascript)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_serde() {
        for lang in Language::ALL {
            let encoded = serde_json::to_string(&lang).unwrap();
            assert_eq!(encoded, format!("\"{}\"", lang.id()));
            assert_eq!(lang.id().parse::<Language>(), Ok(lang));
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("C++".parse::<Language>(), Ok(Language::Cpp));
        assert_eq!("js".parse::<Language>(), Ok(Language::JavaScript));
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn test_templates_are_distinct() {
        let mut templates: Vec<_> = Language::ALL.iter().map(|l| l.template()).collect();
        templates.dedup();
        assert_eq!(templates.len(), 4);
        assert!(Language::Cpp.template().contains("int main()"));
    }
}
