//! Collision-free name generation for copies, duplicates and new items.
//!
//! Three suffix conventions are recognized, in priority order:
//! `"name (2).txt"`, `"name_2.txt"` and `"name-2.txt"`. A name that matches
//! none of them is treated as un-numbered and gets the parentheses style.

use std::fs;
use std::path::{Path, PathBuf};

use fileshelf_core::{DEFAULT_MAX_NUMBERING_ATTEMPTS, FileOpError};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A numbering convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberingStyle {
    /// `"base (n).ext"`
    Parentheses,
    /// `"base_n.ext"`
    Underscore,
    /// `"base-n.ext"`
    Dash,
}

impl NumberingStyle {
    /// All styles in matching priority order.
    pub const ALL: [NumberingStyle; 3] = [Self::Parentheses, Self::Underscore, Self::Dash];

    /// Text placed between the base name and the number.
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Parentheses => " (",
            Self::Underscore => "_",
            Self::Dash => "-",
        }
    }

    /// Text placed right after the number, before the extension.
    pub fn closer(&self) -> &'static str {
        match self {
            Self::Parentheses => ")",
            Self::Underscore | Self::Dash => "",
        }
    }

    fn pattern(&self, base: &str) -> String {
        format!(
            r"^(?P<base>{}){}(?P<num>\d+){}(?P<ext>\..*)?$",
            base,
            regex::escape(self.separator()),
            regex::escape(self.closer())
        )
    }
}

impl std::fmt::Display for NumberingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parentheses => write!(f, "parentheses"),
            Self::Underscore => write!(f, "underscore"),
            Self::Dash => write!(f, "dash"),
        }
    }
}

/// A file name split into its numbering parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedName {
    /// Name without number and extension.
    pub base: String,
    /// Convention the name follows (parentheses when un-numbered).
    pub style: NumberingStyle,
    /// Current number, 0 when the name carries no number yet.
    pub number: u32,
    /// Extension including its leading dot, or empty.
    pub extension: String,
}

impl NumberedName {
    /// Separator between base and number.
    pub fn separator(&self) -> &'static str {
        self.style.separator()
    }

    /// Everything after the number: the closer and the extension.
    pub fn suffix(&self) -> String {
        format!("{}{}", self.style.closer(), self.extension)
    }

    /// Switch to another convention, keeping base and extension.
    pub fn with_style(mut self, style: NumberingStyle) -> Self {
        self.style = style;
        self
    }

    /// Format the name carrying `number`.
    pub fn with_number(&self, number: u32) -> String {
        self.with_label(&number.to_string())
    }

    /// Format the name with an arbitrary label in the number slot.
    pub fn with_label(&self, label: &str) -> String {
        format!("{}{}{}{}", self.base, self.separator(), label, self.suffix())
    }
}

/// Numbered siblings found in a directory, grouped by convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingNumbering {
    pub parentheses: Vec<u32>,
    pub underscore: Vec<u32>,
    pub dash: Vec<u32>,
}

impl ExistingNumbering {
    /// Numbers found for one convention, sorted ascending.
    pub fn for_style(&self, style: NumberingStyle) -> &[u32] {
        match style {
            NumberingStyle::Parentheses => &self.parentheses,
            NumberingStyle::Underscore => &self.underscore,
            NumberingStyle::Dash => &self.dash,
        }
    }

    fn for_style_mut(&mut self, style: NumberingStyle) -> &mut Vec<u32> {
        match style {
            NumberingStyle::Parentheses => &mut self.parentheses,
            NumberingStyle::Underscore => &mut self.underscore,
            NumberingStyle::Dash => &mut self.dash,
        }
    }

    /// Check if no numbered sibling was found.
    pub fn is_empty(&self) -> bool {
        self.parentheses.is_empty() && self.underscore.is_empty() && self.dash.is_empty()
    }
}

/// Resolves destination paths that would collide with existing entries.
#[derive(Debug, Clone)]
pub struct NumberingResolver {
    max_attempts: u32,
    patterns: Vec<(NumberingStyle, Regex)>,
}

impl Default for NumberingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NUMBERING_ATTEMPTS)
    }
}

impl NumberingResolver {
    /// Create a resolver that probes at most `max_attempts` numbers.
    pub fn new(max_attempts: u32) -> Self {
        let patterns = NumberingStyle::ALL
            .iter()
            .map(|style| {
                let re = Regex::new(&style.pattern(".+?")).expect("numbering pattern is valid");
                (*style, re)
            })
            .collect();

        Self {
            max_attempts: max_attempts.max(1),
            patterns,
        }
    }

    /// Maximum number of probes before the timestamp fallback.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Split the file name of `path` into its numbering parts.
    pub fn extract_pattern(&self, path: &Path) -> NumberedName {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for (style, re) in &self.patterns {
            let Some(caps) = re.captures(&file_name) else {
                continue;
            };
            let Ok(number) = caps["num"].parse::<u32>() else {
                continue;
            };
            return NumberedName {
                base: caps["base"].to_string(),
                style: *style,
                number,
                extension: caps
                    .name("ext")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            };
        }

        let base = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        NumberedName {
            base,
            style: NumberingStyle::Parentheses,
            number: 0,
            extension,
        }
    }

    /// Shorthand for [`Self::generate_numbered_name`] keeping the detected style.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.generate_numbered_name(path, None)
    }

    /// Return `path` if it is free, otherwise the first free numbered variant.
    ///
    /// Numbers are probed upwards from the one already carried by the name.
    /// When every probe collides, a `YYYYMMDDHHMMSS` timestamp takes the place
    /// of the number.
    pub fn generate_numbered_name(
        &self,
        path: &Path,
        preferred: Option<NumberingStyle>,
    ) -> PathBuf {
        if !path_exists(path) {
            return path.to_path_buf();
        }
        if path.file_name().is_none() {
            tracing::warn!(path = %path.display(), "cannot number a path without a file name");
            return path.to_path_buf();
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let mut name = self.extract_pattern(path);
        if let Some(style) = preferred {
            name = name.with_style(style);
        }

        let mut number = name.number;
        for _ in 0..self.max_attempts {
            number = match number.checked_add(1) {
                Some(n) => n,
                None => break,
            };
            let candidate = parent.join(name.with_number(number));
            if !path_exists(&candidate) {
                return candidate;
            }
        }

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        tracing::warn!(
            path = %path.display(),
            attempts = self.max_attempts,
            "numbering exhausted, using timestamp suffix"
        );
        parent.join(name.with_label(&stamp))
    }

    /// Scan `directory` (one level) for numbered siblings of `base_name`.
    pub fn detect_existing_numbering(
        &self,
        directory: &Path,
        base_name: &str,
    ) -> Result<ExistingNumbering, FileOpError> {
        let escaped = regex::escape(base_name);
        let matchers: Vec<(NumberingStyle, Regex)> = NumberingStyle::ALL
            .iter()
            .filter_map(|style| Regex::new(&style.pattern(&escaped)).ok().map(|re| (*style, re)))
            .collect();

        let mut found = ExistingNumbering::default();
        let entries = fs::read_dir(directory).map_err(|e| FileOpError::io(directory, e))?;

        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            for (style, re) in &matchers {
                if let Some(number) = re
                    .captures(&file_name)
                    .and_then(|caps| caps["num"].parse::<u32>().ok())
                {
                    found.for_style_mut(*style).push(number);
                    break;
                }
            }
        }

        for style in NumberingStyle::ALL {
            let numbers = found.for_style_mut(style);
            numbers.sort_unstable();
            numbers.dedup();
        }

        Ok(found)
    }

    /// Next number after the highest one already used in `directory`.
    ///
    /// This is a read-only scan; the engine itself always probes with
    /// [`Self::generate_numbered_name`].
    pub fn get_next_available_number(
        &self,
        directory: &Path,
        base_name: &str,
        style: NumberingStyle,
    ) -> Result<u32, FileOpError> {
        let found = self.detect_existing_numbering(directory, base_name)?;
        Ok(found
            .for_style(style)
            .last()
            .map(|max| max.saturating_add(1))
            .unwrap_or(1))
    }
}

/// Existence check that also counts dangling symlinks as taken.
pub(crate) fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
