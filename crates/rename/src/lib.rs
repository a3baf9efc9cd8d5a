//! Selector renaming for a single stylesheet.
//!
//! [`rename`] parses a stylesheet, replaces every class and ID selector with a
//! deterministic identifier derived from the file's [`LogicalKey`], and
//! returns the rewritten CSS along with the names the file declared.

pub mod error;
mod key;
mod rewrite;
pub mod uid;

pub use crate::key::LogicalKey;
pub use crate::rewrite::Renamer;

use crate::error::{ErrorKind, Result};
use cssnames_config::Options;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::visitor::Visit;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use tracing::instrument;

/// Local name to generated identifier, for one stylesheet.
///
/// Ordered so persisted mappings are stable across runs.
pub type NameMapping = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub css: String,
    /// Names declared by the stylesheet itself; borrowed and global names
    /// never appear here.
    pub names: NameMapping,
    pub key: LogicalKey,
}

/// Rewrites every selector of `source`, the contents of the stylesheet at
/// `path`, and prints the result. Output is minified unless
/// [`Options::debug`] is set.
///
/// ```
/// use cssnames_config::Options;
/// use std::path::Path;
///
/// let renamed = cssnames_rename::rename(".bar { color: red; }", Path::new("a.css"), &Options::default()).unwrap();
/// assert_eq!(renamed.css, ".mDK9I{color:red}");
/// assert_eq!(renamed.key.as_str(), "a");
/// ```
///
/// # Errors
/// Returns [`ErrorKind::Syntax`] if the stylesheet cannot be parsed or
/// printed, or if a `:from(...)` reference is neither a path nor `global`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn rename(source: &str, path: &Path, options: &Options) -> Result<Renamed> {
    let parser_options = ParserOptions { filename: path.display().to_string(), ..ParserOptions::default() };
    let mut stylesheet = StyleSheet::parse(source, parser_options).map_err(|e| exn::Exn::from(syntax(e)))?;
    let mut renamer = Renamer::new(path, options);
    stylesheet.visit(&mut renamer).map_err(exn::Exn::from)?;
    let printed = stylesheet
        .to_css(PrinterOptions { minify: !options.debug, ..PrinterOptions::default() })
        .map_err(|e| exn::Exn::from(syntax(e)))?;
    let key = renamer.key().clone();
    let names = renamer.into_names();
    tracing::debug!(key = %key, rules = stylesheet.rules.0.len(), names = names.len(), "Renamed stylesheet");
    Ok(Renamed { css: printed.code, names, key })
}

/// Keeps the reason and position of a parser or printer error. Positions
/// are reported 1-based; an error without a location reports `0:0`.
fn syntax<T: Display>(error: lightningcss::error::Error<T>) -> ErrorKind {
    let (line, column) = error.loc.map_or((0, 0), |loc| (loc.line as usize + 1, loc.column as usize));
    ErrorKind::Syntax { reason: error.kind.to_string(), line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options::default()
    }

    #[test]
    fn test_rename_declaring_file() {
        let renamed = rename(".box { color: red; }", Path::new("a.css"), &options()).unwrap();
        assert_eq!(renamed.css, "._4QF9{color:red}");
        assert_eq!(renamed.names.get("box").map(String::as_str), Some("_4QF9"));
    }

    #[test]
    fn test_rename_referencing_file() {
        let source = r#".box:from("./a") .title { color: red; }"#;
        let renamed = rename(source, Path::new("b.css"), &options()).unwrap();
        assert_eq!(renamed.css, "._4QF9 .tG5vJ{color:red}");
        assert_eq!(renamed.names.len(), 1);
        assert_eq!(renamed.names.get("title").map(String::as_str), Some("tG5vJ"));
        assert_eq!(renamed.key.as_str(), "b");
    }

    #[test]
    fn test_rename_inside_at_rules() {
        let source = "@media (min-width: 10px) {\n  .bar { color: red; }\n}\n@supports (display: grid) { .bar, .foo { color: red } }\n";
        let renamed = rename(source, Path::new("a.css"), &options()).unwrap();
        assert!(renamed.css.starts_with("@media"), "{}", renamed.css);
        assert!(renamed.css.contains(".mDK9I{color:red}"));
        assert!(renamed.css.contains(".mDK9I,._FS3B{color:red}"));
        assert_eq!(renamed.names.len(), 2);
    }

    #[test]
    fn test_rename_url_with_closing_brace() {
        let source = ".a { background: url(x}.png) } .b{}";
        let renamed = rename(source, Path::new("a.css"), &options()).unwrap();
        let uids: Vec<&str> = renamed.names.values().map(String::as_str).collect();
        assert_eq!(renamed.names.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert!(uids.iter().all(|uid| renamed.css.contains(&format!(".{uid}"))), "{}", renamed.css);
        assert!(renamed.css.contains("x}.png"));
    }

    #[test]
    fn test_rename_keyframes_untouched() {
        let source = "@keyframes spin { from { opacity: 0 } to { opacity: 1 } }";
        let renamed = rename(source, Path::new("a.css"), &options()).unwrap();
        assert!(renamed.css.contains("spin"));
        assert!(renamed.names.is_empty());
    }

    #[test]
    fn test_rename_debug_is_not_minified() {
        let options = Options { debug: true, ..Options::default() };
        let renamed = rename(".box { color: red; }", Path::new("a.css"), &options).unwrap();
        assert_eq!(renamed.css.trim_end(), ".box-_4QF9 {\n  color: red;\n}");
    }

    #[test]
    fn test_rename_without_selectors() {
        let renamed = rename("/* nothing */\n", Path::new("a.css"), &options()).unwrap();
        assert!(renamed.css.trim().is_empty());
        assert!(renamed.names.is_empty());
    }

    #[test]
    fn test_rename_syntax_error() {
        let err = rename(".box { color: red }\n\n.a..b { color: red }", Path::new("a.css"), &options()).unwrap_err();
        let ErrorKind::Syntax { reason, line, .. } = &*err;
        assert!(!reason.is_empty());
        assert_eq!(*line, 3);
        assert!(!err.is_retryable());
    }
}
