//! Class and ID selector rewriting.
//!
//! Every class or ID component of a style rule's selectors is replaced by a
//! generated identifier. An optional `:from(...)` pseudo-class right after the
//! component decides whose identifier it is:
//!
//! | Source                      | Identifier                                  |
//! |-----------------------------|---------------------------------------------|
//! | `.name`                     | declared by this file, recorded in its map  |
//! | `.name:from(global)`        | `name` itself, never hashed                 |
//! | `.name:from("./other")`     | what `other.css` generates for `name`       |
//!
//! The `:from(...)` clause is dropped from the output. A reference keeps its
//! own namespace: it is never recorded in the referring file's name map, even
//! when the same name is also declared locally.

use crate::error::ErrorKind;
use crate::{LogicalKey, NameMapping, uid};
use cssnames_config::Options;
use lightningcss::properties::custom::{Token, TokenList, TokenOrValue};
use lightningcss::rules::CssRule;
use lightningcss::selector::{Component, PseudoClass, Selector};
use lightningcss::values::ident::Ident;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Names eligible for renaming. Anything else (escaped digits, non-ASCII
/// letters) passes through untouched.
static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").unwrap());

const UNSUPPORTED_REFERENCE: &str = "Unsupported :from() reference";

/// What a `:from(...)` clause says about the name before it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Declare,
    Global,
    Borrow(String),
}

/// Per-file rewriting context.
///
/// Keeps the file's own logical key and the first-seen identifier of every
/// name declared in it, so repeated occurrences of `.foo` across rules all
/// receive the same identifier.
pub struct Renamer<'a> {
    path: &'a Path,
    key: LogicalKey,
    options: &'a Options,
    names: NameMapping,
}

impl<'a> Renamer<'a> {
    pub fn new(path: &'a Path, options: &'a Options) -> Self {
        Self {
            path,
            key: LogicalKey::for_path(path, &options.base),
            options,
            names: NameMapping::new(),
        }
    }

    pub fn key(&self) -> &LogicalKey {
        &self.key
    }

    pub fn names(&self) -> &NameMapping {
        &self.names
    }

    pub fn into_names(self) -> NameMapping {
        self.names
    }

    /// Rewrites one selector in place.
    ///
    /// Components are stored right-to-left by compound, so the selector is
    /// rebuilt in source order once every compound has been rewritten.
    fn rewrite_selector<'i>(&mut self, selector: &mut Selector<'i>) -> Result<(), &'static str> {
        let raw: Vec<Component<'i>> = selector.iter_raw_match_order().cloned().collect();
        let combinators: Vec<_> = raw.iter().filter_map(|component| component.as_combinator()).collect();
        let compounds: Vec<&[Component<'i>]> = raw.split(|component| component.is_combinator()).collect();
        let mut parse_order = Vec::with_capacity(raw.len());
        for (index, compound) in compounds.iter().enumerate().rev() {
            self.rewrite_compound(compound, &mut parse_order)?;
            if let Some(combinator) = index.checked_sub(1).and_then(|previous| combinators.get(previous)) {
                parse_order.push(Component::Combinator(*combinator));
            }
        }
        *selector = Selector::from(parse_order);
        Ok(())
    }

    fn rewrite_compound<'i>(
        &mut self,
        compound: &[Component<'i>],
        rewritten: &mut Vec<Component<'i>>,
    ) -> Result<(), &'static str> {
        let mut components = compound.iter().peekable();
        while let Some(component) = components.next() {
            let component = match component {
                Component::Class(ident) | Component::ID(ident) if NAME.is_match(ident.0.as_ref()) => {
                    let clause = match components.peek() {
                        Some(Component::NonTSPseudoClass(PseudoClass::CustomFunction { name, arguments }))
                            if name.eq_ignore_ascii_case("from") =>
                        {
                            components.next();
                            read_clause(arguments)?
                        },
                        _ => Clause::Declare,
                    };
                    let identifier = Ident(self.substitute(ident.0.as_ref(), clause).into());
                    match component {
                        Component::ID(_) => Component::ID(identifier),
                        _ => Component::Class(identifier),
                    }
                },
                Component::Negation(selectors) => Component::Negation(self.rewrite_nested(selectors)?),
                Component::Is(selectors) => Component::Is(self.rewrite_nested(selectors)?),
                Component::Where(selectors) => Component::Where(self.rewrite_nested(selectors)?),
                Component::Has(selectors) => Component::Has(self.rewrite_nested(selectors)?),
                other => other.clone(),
            };
            rewritten.push(component);
        }
        Ok(())
    }

    fn rewrite_nested<'i>(&mut self, selectors: &[Selector<'i>]) -> Result<Box<[Selector<'i>]>, &'static str> {
        let mut selectors = selectors.to_vec();
        for selector in &mut selectors {
            self.rewrite_selector(selector)?;
        }
        Ok(selectors.into_boxed_slice())
    }

    fn substitute(&mut self, name: &str, clause: Clause) -> String {
        let identifier = match clause {
            Clause::Global => name.to_string(),
            Clause::Borrow(reference) => self.borrow(name, &reference),
            Clause::Declare => self.declare(name),
        };
        tracing::trace!(name, identifier = %identifier, "Substituted selector");
        identifier
    }

    /// Identifier owned by another file.
    fn borrow(&self, name: &str, reference: &str) -> String {
        let key = LogicalKey::for_reference(reference, self.path, &self.options.base);
        uid::generate(&key, name, self.options)
    }

    /// Identifier owned by this file; first occurrence wins.
    fn declare(&mut self, name: &str) -> String {
        if let Some(existing) = self.names.get(name) {
            return existing.clone();
        }
        let identifier = uid::generate(&self.key, name, self.options);
        self.names.insert(name.to_string(), identifier.clone());
        identifier
    }
}

impl<'i> Visitor<'i> for Renamer<'_> {
    type Error = ErrorKind;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(RULES)
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        if let CssRule::Style(style) = rule {
            // Rule locations are 0-based lines and 1-based columns.
            let (line, column) = (style.loc.line as usize + 1, style.loc.column as usize);
            for selector in style.selectors.0.iter_mut() {
                self.rewrite_selector(selector).map_err(|reason| ErrorKind::Syntax {
                    reason: reason.to_string(),
                    line,
                    column,
                })?;
            }
        }
        rule.visit_children(self)
    }
}

/// Reads the argument of a `:from(...)` pseudo-class.
///
/// A single quoted string is always a path, even `"global"`. Unquoted
/// arguments are glued back together from their tokens (`./c/c` arrives as
/// delimiters and identifiers); only the bare word `global` opts out.
fn read_clause(arguments: &TokenList<'_>) -> Result<Clause, &'static str> {
    let mut quoted = None;
    let mut bare = String::new();
    for token in &arguments.0 {
        match token {
            TokenOrValue::Token(Token::WhiteSpace(_) | Token::Comment(_)) => {},
            TokenOrValue::Token(Token::String(path)) if quoted.is_none() && bare.is_empty() => {
                quoted = Some(path.to_string());
            },
            TokenOrValue::Token(Token::Ident(part)) if quoted.is_none() => bare.push_str(part.as_ref()),
            TokenOrValue::Token(Token::Delim(part)) if quoted.is_none() => bare.push(*part),
            _ => return Err(UNSUPPORTED_REFERENCE),
        }
    }
    Ok(match (quoted, bare.as_str()) {
        (Some(path), _) => Clause::Borrow(path),
        (None, "") => Clause::Declare,
        (None, "global") => Clause::Global,
        (None, path) => Clause::Borrow(path.to_string()),
    })
}
