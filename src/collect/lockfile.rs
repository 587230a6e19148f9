// src/collect/lockfile.rs

//! Dependency versions from a `mix.lock` file.
//!
//! A lockfile is a single Elixir map literal:
//!
//! ```text
//! %{
//!   "decimal": {:hex, :decimal, "1.4.1", "ad9e501e...", [:mix], [], "hexpm"},
//!   "ecto": {:git, "https://github.com/elixir-ecto/ecto.git", "2b7a1c0e...", [branch: "master"]},
//!   "local_dep": {:path, "../local_dep", []},
//! }
//! ```
//!
//! Only the literal subset mix writes is understood: maps (both `"k": v` and
//! `"k" => v` entries), tuples, lists, keyword pairs, strings, atoms and
//! integers. Nothing is evaluated.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};

/// Deepest map/tuple/list nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 128;

/// Dependency name → identifying string (commit ref, version or path).
pub type DependencyVersions = BTreeMap<String, String>;

/// A parsed term of the literal subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Map(Vec<(Term, Term)>),
    Tuple(Vec<Term>),
    List(Vec<Term>),
    Str(String),
    Atom(String),
    Int(i64),
}

impl Term {
    fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Extract `name → version` pairs from lockfile contents.
///
/// - `{:git, url, ref, opts}` → `ref`
/// - `{:hex, name, version, ...}` → `version`
/// - `{:path, path, ...}` → `path`
///
/// Entries with any other shape are skipped.
pub fn dependency_versions(contents: &str) -> Result<DependencyVersions> {
    let Term::Map(entries) = parse_term(contents)? else {
        bail!("lockfile is not a map literal");
    };

    let mut versions = DependencyVersions::new();
    for (key, source) in entries {
        let name = match key {
            Term::Str(s) | Term::Atom(s) => s,
            _ => continue,
        };
        if let Some(id) = source_identifier(&source) {
            versions.insert(name, id.to_string());
        }
    }
    Ok(versions)
}

fn source_identifier(source: &Term) -> Option<&str> {
    let Term::Tuple(items) = source else {
        return None;
    };
    let Some(Term::Atom(tag)) = items.first() else {
        return None;
    };
    match tag.as_str() {
        "git" | "hex" => items.get(2).and_then(Term::as_str),
        "path" => items.get(1).and_then(Term::as_str),
        _ => None,
    }
}

/// Parse a single term that spans the whole input.
pub fn parse_term(input: &str) -> Result<Term> {
    let mut parser = Parser::new(input);
    let term = parser.term()?;
    parser.skip_trivia();
    if let Some(c) = parser.peek() {
        bail!("unexpected trailing input at byte {}: {c:?}", parser.pos);
    }
    Ok(term)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, depth: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(anyhow!("expected {s:?} at byte {}", self.pos))
        }
    }

    /// Whitespace and `#` comments.
    fn skip_trivia(&mut self) {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.src.len() - trimmed.len();
            if trimmed.starts_with('#') {
                let line_end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += line_end;
            } else {
                break;
            }
        }
    }

    fn term(&mut self) -> Result<Term> {
        self.skip_trivia();
        match self.peek() {
            Some('%' | '{' | '[') => self.compound(),
            Some('"') => Ok(Term::Str(self.string()?)),
            Some(':') => {
                self.bump();
                Ok(Term::Atom(self.atom_body()?))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => self.integer(),
            Some(c) if is_ident_start(c) => {
                let ident = self.identifier();
                // true / false / nil are bare atoms.
                Ok(Term::Atom(ident))
            }
            Some(c) => Err(anyhow!("unexpected {c:?} at byte {}", self.pos)),
            None => Err(anyhow!("unexpected end of input")),
        }
    }

    /// A map, tuple or list, bounded by [`MAX_DEPTH`].
    fn compound(&mut self) -> Result<Term> {
        if self.depth >= MAX_DEPTH {
            bail!("nesting deeper than {MAX_DEPTH} at byte {}", self.pos);
        }
        self.depth += 1;
        let term = match self.bump() {
            Some('%') => self.expect("{").and_then(|_| self.pairs("}")).map(Term::Map),
            Some('{') => self.sequence("}").map(Term::Tuple),
            _ => self.sequence("]").map(Term::List),
        };
        self.depth -= 1;
        term
    }

    /// Comma-separated terms up to `close`; keyword pairs become 2-tuples.
    fn sequence(&mut self, close: &str) -> Result<Vec<Term>> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.element()?);
            self.skip_trivia();
            if !self.eat(",") {
                self.skip_trivia();
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn element(&mut self) -> Result<Term> {
        if let Some(key) = self.keyword_key()? {
            let value = self.term()?;
            return Ok(Term::Tuple(vec![key, value]));
        }
        self.term()
    }

    /// Map entries up to `close`.
    fn pairs(&mut self, close: &str) -> Result<Vec<(Term, Term)>> {
        let mut pairs = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(pairs);
            }

            let (key, value) = match self.keyword_key()? {
                Some(key) => (key, self.term()?),
                None => {
                    let key = self.term()?;
                    self.skip_trivia();
                    self.expect("=>")?;
                    (key, self.term()?)
                }
            };
            pairs.push((key, value));

            self.skip_trivia();
            if !self.eat(",") {
                self.skip_trivia();
                self.expect(close)?;
                return Ok(pairs);
            }
        }
    }

    /// `name:` or `"name":` followed by whitespace, as an atom key.
    fn keyword_key(&mut self) -> Result<Option<Term>> {
        self.skip_trivia();
        let start = self.pos;

        let key = match self.peek() {
            Some('"') => self.string()?,
            Some(c) if is_ident_start(c) => self.identifier(),
            _ => return Ok(None),
        };

        let rest = self.rest();
        if rest.starts_with(':') && rest[1..].starts_with(char::is_whitespace) {
            self.pos += 1;
            Ok(Some(Term::Atom(key)))
        } else {
            self.pos = start;
            Ok(None)
        }
    }

    fn string(&mut self) -> Result<String> {
        self.expect("\"")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => bail!("unterminated escape"),
                },
                Some(c) => out.push(c),
                None => bail!("unterminated string"),
            }
        }
    }

    fn atom_body(&mut self) -> Result<String> {
        match self.peek() {
            Some('"') => self.string(),
            Some(c) if is_ident_start(c) => Ok(self.identifier()),
            other => Err(anyhow!("invalid atom at byte {}: {other:?}", self.pos)),
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '?' || c == '!' || c == '.' || c == '@' {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn integer(&mut self) -> Result<Term> {
        let start = self.pos;
        self.eat("-");
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        let digits: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        digits
            .parse()
            .map(Term::Int)
            .map_err(|e| anyhow!("invalid integer {digits:?}: {e}"))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
