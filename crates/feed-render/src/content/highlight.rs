//! Syntax highlighting for fenced code blocks

use std::fmt;
use std::sync::{LazyLock, OnceLock};

use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Prefix on every highlight class, keeps theme rules away from page styles
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

const THEME: &str = "base16-ocean.dark";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static THEME_CSS: OnceLock<String> = OnceLock::new();

/// Highlighter failures; always recovered by rendering the block unhighlighted
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Highlighting failed: {0}")]
    Failed(String),
}

/// Highlights code for a declared language.
///
/// `highlight` returns markup that is injected as-is inside `<pre><code>`,
/// so implementations must escape the code they are given.
pub trait Highlighter: Send + Sync {
    /// Check if `language` is known to this highlighter
    fn supports(&self, language: &str) -> bool;

    /// Highlight `code` as `language`
    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError>;

    /// CSS rules for the classes emitted by `highlight`
    fn stylesheet(&self) -> &str {
        ""
    }
}

/// Class-based highlighter over syntect's bundled grammars
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl Highlighter for SyntectHighlighter {
    fn supports(&self, language: &str) -> bool {
        !language.is_empty() && SYNTAXES.find_syntax_by_token(language).is_some()
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        let syntax = SYNTAXES
            .find_syntax_by_token(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.to_string()))?;

        let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError::Failed(e.to_string()))?;
        }
        Ok(generator.finalize())
    }

    fn stylesheet(&self) -> &str {
        highlight_css()
    }
}

/// Theme CSS matching [`SyntectHighlighter`] output; empty if the theme is unavailable
pub fn highlight_css() -> &'static str {
    THEME_CSS.get_or_init(|| {
        let themes = ThemeSet::load_defaults();
        let Some(theme) = themes.themes.get(THEME) else {
            tracing::warn!(theme = THEME, "Highlight theme missing");
            return String::new();
        };
        css_for_theme_with_class_style(theme, CLASS_STYLE).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build highlight CSS");
            String::new()
        })
    })
}

impl fmt::Debug for dyn Highlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Highlighter")
    }
}
