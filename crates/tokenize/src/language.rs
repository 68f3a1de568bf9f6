use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TokenizeError;

/// Programming languages with a dedicated lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CSharp,
    Java,
    JavaScript,
    Python,
    C,
    Cpp,
}

/// How a language delimits blocks, which drives code unit splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Braces,
    Indentation,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::CSharp,
        Language::Java,
        Language::JavaScript,
        Language::Python,
        Language::C,
        Language::Cpp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    pub fn block_style(self) -> BlockStyle {
        match self {
            Language::Python => BlockStyle::Indentation,
            Language::CSharp
            | Language::Java
            | Language::JavaScript
            | Language::C
            | Language::Cpp => BlockStyle::Braces,
        }
    }

    pub(crate) fn syntax(self) -> &'static Syntax {
        match self {
            Language::CSharp => &CSHARP,
            Language::Java => &JAVA,
            Language::JavaScript => &JAVASCRIPT,
            Language::Python => &PYTHON,
            Language::C => &C,
            Language::Cpp => &CPP,
        }
    }
}

impl FromStr for Language {
    type Err = TokenizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csharp" | "cs" | "c#" => Ok(Language::CSharp),
            "java" => Ok(Language::Java),
            "javascript" | "js" => Ok(Language::JavaScript),
            "python" | "py" | "python3" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            _ => Err(TokenizeError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static lexical rules of one language.
pub(crate) struct Syntax {
    pub keywords: &'static [&'static str],
    /// Keywords whose brace block holds members worth splitting further.
    pub containers: &'static [&'static str],
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Multi-character operators, longest first.
    pub operators: &'static [&'static str],
    /// `'x'` is a char literal rather than a string.
    pub char_literals: bool,
    /// C# `@"..."` and `$"..."` strings.
    pub verbatim_strings: bool,
    /// Python `"""..."""` strings.
    pub triple_quoted_strings: bool,
    /// JavaScript backtick templates.
    pub template_strings: bool,
    /// Identifier prefixes that glue onto a following quote (`r"..."`, `L"..."`).
    pub string_prefixes: &'static [&'static str],
    /// Extra characters allowed inside identifiers.
    pub identifier_extra: &'static [char],
}

impl Syntax {
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word)
    }

    pub fn is_container(&self, word: &str) -> bool {
        self.containers.contains(&word)
    }
}

const C_FAMILY_OPERATORS: &[&str] = &[
    ">>>=", "<<=", ">>=", ">>>", "...", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=",
    "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "::",
];

const CSHARP_OPERATORS: &[&str] = &[
    "??=", "<<=", ">>=", "...", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "??", "?.", "=>", "::",
];

const JAVASCRIPT_OPERATORS: &[&str] = &[
    ">>>=", "===", "!==", "**=", "<<=", ">>=", ">>>", "...", "&&=", "||=", "??=", "=>", "++",
    "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "??", "?.",
];

const PYTHON_OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", "**", "//", "<<", ">>", "<=", ">=", "==", "!=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", ":=",
];

static CSHARP: Syntax = Syntax {
    keywords: &[
        "abstract", "as", "async", "await", "base", "bool", "break", "byte", "case", "catch",
        "char", "checked", "class", "const", "continue", "decimal", "default", "delegate", "do",
        "double", "else", "enum", "event", "explicit", "extern", "false", "finally", "fixed",
        "float", "for", "foreach", "get", "goto", "if", "implicit", "in", "init", "int",
        "interface", "internal", "is", "lock", "long", "namespace", "new", "null", "object",
        "operator", "out", "override", "params", "private", "protected", "public", "readonly",
        "record", "ref", "return", "sbyte", "sealed", "set", "short", "sizeof", "stackalloc",
        "static", "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint",
        "ulong", "unchecked", "unsafe", "ushort", "using", "var", "virtual", "void", "volatile",
        "while", "yield",
    ],
    containers: &["class", "struct", "interface", "namespace", "record"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    operators: CSHARP_OPERATORS,
    char_literals: true,
    verbatim_strings: true,
    triple_quoted_strings: false,
    template_strings: false,
    string_prefixes: &[],
    identifier_extra: &[],
};

static JAVA: Syntax = Syntax {
    keywords: &[
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "false",
        "final", "finally", "float", "for", "goto", "if", "implements", "import", "instanceof",
        "int", "interface", "long", "native", "new", "null", "package", "private", "protected",
        "public", "record", "return", "short", "static", "strictfp", "super", "switch",
        "synchronized", "this", "throw", "throws", "transient", "true", "try", "var", "void",
        "volatile", "while",
    ],
    containers: &["class", "interface", "record"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    operators: C_FAMILY_OPERATORS,
    char_literals: true,
    verbatim_strings: false,
    triple_quoted_strings: false,
    template_strings: false,
    string_prefixes: &[],
    identifier_extra: &['$'],
};

static JAVASCRIPT: Syntax = Syntax {
    keywords: &[
        "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
        "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
        "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined",
        "var", "void", "while", "with", "yield",
    ],
    containers: &["class"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    operators: JAVASCRIPT_OPERATORS,
    char_literals: false,
    verbatim_strings: false,
    triple_quoted_strings: false,
    template_strings: true,
    string_prefixes: &[],
    identifier_extra: &['$'],
};

static PYTHON: Syntax = Syntax {
    keywords: &[
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
        "return", "try", "while", "with", "yield",
    ],
    containers: &["class"],
    line_comments: &["#"],
    block_comment: None,
    operators: PYTHON_OPERATORS,
    char_literals: false,
    verbatim_strings: false,
    triple_quoted_strings: true,
    template_strings: false,
    string_prefixes: &[
        "r", "u", "b", "f", "rb", "br", "fr", "rf", "R", "U", "B", "F", "Rb", "bR", "RB", "BR",
        "Fr", "fR", "FR", "RF", "rB", "Br",
    ],
    identifier_extra: &[],
};

static C: Syntax = Syntax {
    keywords: &[
        "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
        "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
        "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
        "typedef", "union", "unsigned", "void", "volatile", "while",
    ],
    containers: &[],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    operators: C_FAMILY_OPERATORS,
    char_literals: true,
    verbatim_strings: false,
    triple_quoted_strings: false,
    template_strings: false,
    string_prefixes: &["L", "u", "U", "u8"],
    identifier_extra: &[],
};

static CPP: Syntax = Syntax {
    keywords: &[
        "alignas", "alignof", "auto", "bool", "break", "case", "catch", "char", "class",
        "const", "constexpr", "const_cast", "continue", "decltype", "default", "delete", "do",
        "double", "dynamic_cast", "else", "enum", "explicit", "export", "extern", "false",
        "float", "for", "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace",
        "new", "noexcept", "nullptr", "operator", "private", "protected", "public", "register",
        "reinterpret_cast", "return", "short", "signed", "sizeof", "static", "static_cast",
        "struct", "switch", "template", "this", "throw", "true", "try", "typedef", "typename",
        "union", "unsigned", "using", "virtual", "void", "volatile", "while",
    ],
    containers: &["class", "struct", "namespace"],
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    operators: C_FAMILY_OPERATORS,
    char_literals: true,
    verbatim_strings: false,
    triple_quoted_strings: false,
    template_strings: false,
    string_prefixes: &["L", "u", "U", "u8"],
    identifier_extra: &[],
};
