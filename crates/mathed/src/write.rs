//! Serialization streams and export-feature collection
//!
//! Every inset knows how to write itself as LaTeX through `WriteStream`,
//! and minimally as MathML/HTML through the corresponding streams. The
//! engine only calls these interfaces correctly; the surrounding export
//! driver owns the output format.

use crate::error::{MathedError, MathedResult};
use std::fmt;
use std::fmt::Write as _;

/// LaTeX output sink with pending-space bookkeeping.
///
/// After a command token like `\alpha` a space is required before a
/// following alphanumeric character but not before `{` or `+`; callers mark
/// the requirement with `set_pending_space` and the stream resolves it on
/// the next write.
pub struct WriteStream<'a> {
    out: &'a mut dyn fmt::Write,
    pending_space: bool,
    /// Characters written so far
    count: usize,
}

impl<'a> WriteStream<'a> {
    pub fn new(out: &'a mut dyn fmt::Write) -> Self {
        Self {
            out,
            pending_space: false,
            count: 0,
        }
    }

    /// Request a separating space before the next alphanumeric output
    pub fn set_pending_space(&mut self, pending: bool) {
        self.pending_space = pending;
    }

    pub fn pending_space(&self) -> bool {
        self.pending_space
    }

    /// Write a command token `\name` and mark the pending space
    pub fn command(&mut self, name: &str) -> fmt::Result {
        self.write_str("\\")?;
        self.write_str(name)?;
        self.pending_space = true;
        Ok(())
    }

    /// Number of characters written so far
    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Write for WriteStream<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.is_empty() {
            return Ok(());
        }
        if self.pending_space {
            if s.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                self.out.write_str(" ")?;
                self.count += 1;
            }
            self.pending_space = false;
        }
        self.out.write_str(s)?;
        self.count += s.chars().count();
        Ok(())
    }
}

/// Export-feature sink: packages and CSS the produced output depends on
pub trait LaTeXFeatures {
    /// Record that the output requires a LaTeX package
    fn require(&mut self, package: &str);
    /// Record a CSS snippet needed by HTML output
    fn add_css_snippet(&mut self, snippet: &str);
}

/// Collecting implementation used by tests and headless validation
#[derive(Debug, Default)]
pub struct FeatureList {
    pub packages: Vec<String>,
    pub css: Vec<String>,
}

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p == package)
    }
}

impl LaTeXFeatures for FeatureList {
    fn require(&mut self, package: &str) {
        if !self.has_package(package) {
            self.packages.push(package.to_string());
        }
    }

    fn add_css_snippet(&mut self, snippet: &str) {
        if !self.css.iter().any(|s| s == snippet) {
            self.css.push(snippet.to_string());
        }
    }
}

/// MathML output sink with element helpers
pub struct MathMLStream<'a> {
    out: &'a mut dyn fmt::Write,
}

impl<'a> MathMLStream<'a> {
    pub fn new(out: &'a mut dyn fmt::Write) -> Self {
        Self { out }
    }

    pub fn open(&mut self, tag: &str) -> MathedResult<()> {
        write!(self.out, "<{tag}>")?;
        Ok(())
    }

    pub fn close(&mut self, tag: &str) -> MathedResult<()> {
        write!(self.out, "</{tag}>")?;
        Ok(())
    }

    pub fn text(&mut self, s: &str) -> MathedResult<()> {
        for c in s.chars() {
            match c {
                '<' => self.out.write_str("&lt;")?,
                '>' => self.out.write_str("&gt;")?,
                '&' => self.out.write_str("&amp;")?,
                _ => self.out.write_char(c)?,
            }
        }
        Ok(())
    }

    /// `<tag>text</tag>`
    pub fn element(&mut self, tag: &str, text: &str) -> MathedResult<()> {
        self.open(tag)?;
        self.text(text)?;
        self.close(tag)
    }

    /// The error raised for constructs MathML export does not support
    pub fn unsupported(construct: &'static str) -> MathedError {
        MathedError::Export {
            construct,
            format: "mathml",
        }
    }
}

/// HTML output sink with element helpers
pub struct HtmlStream<'a> {
    out: &'a mut dyn fmt::Write,
}

impl<'a> HtmlStream<'a> {
    pub fn new(out: &'a mut dyn fmt::Write) -> Self {
        Self { out }
    }

    pub fn open_span(&mut self, class: &str) -> MathedResult<()> {
        write!(self.out, "<span class=\"{class}\">")?;
        Ok(())
    }

    pub fn close_span(&mut self) -> MathedResult<()> {
        self.out.write_str("</span>")?;
        Ok(())
    }

    pub fn text(&mut self, s: &str) -> MathedResult<()> {
        for c in s.chars() {
            match c {
                '<' => self.out.write_str("&lt;")?,
                '>' => self.out.write_str("&gt;")?,
                '&' => self.out.write_str("&amp;")?,
                _ => self.out.write_char(c)?,
            }
        }
        Ok(())
    }

    /// The error raised for constructs HTML export does not support
    pub fn unsupported(construct: &'static str) -> MathedError {
        MathedError::Export {
            construct,
            format: "html",
        }
    }
}
