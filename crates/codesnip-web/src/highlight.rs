use std::sync::LazyLock;

use codesnip_core::models::language::Language;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tera::escape_html;
use tracing::warn;

/// Dark theme matching the page palette.
const THEME: &str = "base16-ocean.dark";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Render `code` as highlighted markup: one `<span class="line">` per
/// source line inside `<pre><code class="language-{slug}">`, tokens coloured
/// with inline styles. Languages without a bundled grammar render as
/// escaped plain text.
pub fn highlight(language: &Language, code: &str) -> String {
    let mut out = format!(
        "<pre class=\"code\"><code class=\"language-{}\">",
        language.slug()
    );
    let mut lines = LineHighlighter::for_language(language);
    for (n, line) in code.lines().enumerate() {
        if n > 0 {
            out.push('\n');
        }
        out.push_str("<span class=\"line\">");
        out.push_str(&lines.render(line));
        out.push_str("</span>");
    }
    out.push_str("</code></pre>");
    out
}

/// Grammar for a language, looked up by file extension. TypeScript borrows
/// the JavaScript grammar; Swift and Kotlin have none in the default set.
fn syntax_for(language: &Language) -> Option<&'static SyntaxReference> {
    let extension = match language {
        Language::JavaScript | Language::TypeScript => "js",
        Language::Python => "py",
        Language::Java => "java",
        Language::Cpp => "cpp",
        Language::CSharp => "cs",
        Language::Php => "php",
        Language::Ruby => "rb",
        Language::Go => "go",
        Language::Rust => "rs",
        Language::Html => "html",
        Language::Css => "css",
        Language::Sql => "sql",
        Language::Bash => "sh",
        Language::Swift | Language::Kotlin | Language::Unknown(_) => return None,
    };
    SYNTAXES.find_syntax_by_extension(extension)
}

/// Highlights one snippet line by line, carrying parser state across lines.
enum LineHighlighter {
    Syntax(HighlightLines<'static>),
    Plain,
}

impl LineHighlighter {
    fn for_language(language: &Language) -> Self {
        match (syntax_for(language), THEMES.themes.get(THEME)) {
            (Some(syntax), Some(theme)) => Self::Syntax(HighlightLines::new(syntax, theme)),
            _ => Self::Plain,
        }
    }

    fn render(&mut self, line: &str) -> String {
        let Self::Syntax(highlighter) = self else {
            return escape_html(line);
        };

        // The grammars expect newline-terminated input.
        let input = format!("{line}\n");
        let styled = highlighter
            .highlight_line(&input, &SYNTAXES)
            .and_then(|ranges| {
                let ranges: Vec<_> = ranges
                    .into_iter()
                    .map(|(style, text)| (style, text.trim_end_matches('\n')))
                    .collect();
                styled_line_to_highlighted_html(&ranges, IncludeBackground::No)
            });

        match styled {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "highlighting failed, rendering plain text");
                *self = Self::Plain;
                escape_html(line)
            }
        }
    }
}
