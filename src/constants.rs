//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Documentation file layout
pub mod docs {
    /// Primary documentation file written into every source folder
    pub const FILE_NAME: &str = "README.md";

    /// Backup of the previous document (overwritten on every run)
    pub const BACKUP_FILE_NAME: &str = "README.md.backup";

    /// Marker lines delimiting the derived child reference section
    pub const CHILDREN_START: &str = "<!-- treedoc:children:start -->";
    pub const CHILDREN_END: &str = "<!-- treedoc:children:end -->";

    /// Marker lines delimiting content carried over from a previous document
    pub const RETAINED_START: &str = "<!-- treedoc:retained:start -->";
    pub const RETAINED_END: &str = "<!-- treedoc:retained:end -->";

    /// Heading of the derived child reference section
    pub const CHILDREN_HEADING: &str = "Subdirectories";

    /// Heading of the retained-content section
    pub const RETAINED_HEADING: &str = "Retained from previous documentation";

    /// Heading for disagreeing descriptions inside the retained section
    pub const CONFLICTS_HEADING: &str = "Differing descriptions";

    /// Attribution labels for disagreeing descriptions
    pub const PREVIOUS_LABEL: &str = "previous documentation";
    pub const CURRENT_LABEL: &str = "current analysis";
}

/// Directory classification defaults
pub mod classification {
    /// Recognized source and project-file extensions (lower-case, no dot)
    pub const SOURCE_EXTENSIONS: &[&str] = &[
        "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "cs", "rb", "go", "rs", "php",
        "swift", "kt", "scala", "clj", "hs", "ml", "fs", "vb", "dart", "lua", "r", "jl", "nim",
        "zig", "toml", "yaml", "yml", "json", "xml", "sql", "sh", "bash", "dockerfile",
        "makefile", "cmake", "gradle",
    ];

    /// Recognized manifest/config file names (lower-case, exact match)
    pub const MANIFEST_FILENAMES: &[&str] = &[
        "makefile",
        "dockerfile",
        "pipfile",
        "gemfile",
        "rakefile",
        "cargo.toml",
        "package.json",
        "requirements.txt",
        "setup.py",
        "pyproject.toml",
        "composer.json",
        "pom.xml",
        "build.gradle",
    ];

    /// Directories never documented nor descended into
    pub const EXCLUDED_DIRS: &[&str] = &[
        "node_modules",
        "__pycache__",
        ".git",
        ".svn",
        ".hg",
        "build",
        "dist",
        "target",
        "bin",
        "obj",
        ".venv",
        "venv",
        ".tox",
        ".pytest_cache",
        ".mypy_cache",
        "coverage",
        "logs",
        "temp",
        "tmp",
        "cache",
    ];

    /// Hidden files still shown in the rendered folder tree
    pub const VISIBLE_DOTFILES: &[&str] = &[".gitignore", ".env.example"];
}

/// Analyzer input shaping
pub mod analysis {
    /// Characters of each child document handed to the analyzer
    pub const SUMMARY_CHARS: usize = 500;

    /// Characters of each child document shown in the reference section
    pub const EXCERPT_CHARS: usize = 160;

    /// Depth of the rendered folder tree
    pub const TREE_DEPTH: usize = 3;

    /// Maximum characters of a single source file in the prompt
    pub const MAX_FILE_CHARS: usize = 8_000;

    /// Files larger than this are listed but not read (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Characters shown in dry-run content previews
    pub const PREVIEW_CHARS: usize = 100;
}

/// Analyzer retry constants
pub mod retry {
    /// Default attempts per directory (first call included)
    pub const DEFAULT_MAX_ATTEMPTS: u8 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
}
