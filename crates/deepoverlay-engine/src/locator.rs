//! Selector Resolver.
//!
//! A locator is a CSS child-combinator path that any standard selector engine
//! can evaluate:
//!
//! ```text
//! #sidebar                                   element with an id
//! #main > div:nth-of-type(2) > p:nth-of-type(1)   path below an ancestor id
//! html > body:nth-of-type(1) > div:nth-of-type(3)  path from the root
//! ```
//!
//! `nth-of-type` indices are 1-based and count preceding siblings with the
//! same tag. Identifiers are CSS-escaped, and the built-in resolver parses the
//! same escapes, so a computed locator resolves back to its element as long as
//! the document has not changed.

use std::fmt::Write as _;

use deepoverlay_core::Locator;

use crate::dom::PageDom;
use crate::error::LocatorParseError;

/// Where a locator path starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStart {
    /// The document element.
    Root,
    /// The element carrying this id.
    Id(String),
}

/// One `tag:nth-of-type(n)` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    pub nth: usize,
}

/// Structured form of a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorPath {
    pub start: PathStart,
    pub steps: Vec<PathStep>,
}

impl LocatorPath {
    pub fn parse(raw: &str) -> Result<Self, LocatorParseError> {
        Parser::new(raw).locator()
    }

    pub fn to_locator(&self) -> Locator {
        let mut out = match &self.start {
            PathStart::Root => "html".to_string(),
            PathStart::Id(id) => format!("#{}", escape_ident(id)),
        };
        for step in &self.steps {
            let _ = write!(out, " > {}:nth-of-type({})", escape_ident(&step.tag), step.nth);
        }
        Locator::new(out)
    }
}

/// Derives a locator for `node`.
///
/// Returns `None` for the document root and body, and for detached elements.
pub fn compute_locator<D: PageDom>(dom: &D, node: D::Node) -> Option<Locator> {
    if dom.is_root_or_body(node) {
        return None;
    }

    let mut steps = Vec::new();
    let mut current = node;
    let start = loop {
        if Some(current) == dom.document_element() {
            break PathStart::Root;
        }
        if let Some(id) = unique_id(dom, current) {
            break PathStart::Id(id);
        }

        let parent = dom.parent(current)?;
        let tag = dom.tag_name(current);
        let nth = dom
            .children(parent)
            .into_iter()
            .take_while(|sibling| *sibling != current)
            .filter(|sibling| dom.tag_name(*sibling).eq_ignore_ascii_case(&tag))
            .count()
            + 1;

        steps.push(PathStep { tag, nth });
        current = parent;
    };

    steps.reverse();
    Some(LocatorPath { start, steps }.to_locator())
}

/// Resolves a locator against the live document.
///
/// `None` is a normal outcome: the element was removed or the page changed
/// shape, or the locator is malformed.
pub fn resolve_locator<D: PageDom>(dom: &D, locator: &Locator) -> Option<D::Node> {
    let path = match LocatorPath::parse(locator.as_str()) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("Unparseable locator '{}': {}", locator, e);
            return None;
        }
    };

    let mut current = match &path.start {
        PathStart::Root => dom.document_element()?,
        PathStart::Id(id) => dom.element_by_id(id)?,
    };

    for step in &path.steps {
        current = dom
            .children(current)
            .into_iter()
            .filter(|child| dom.tag_name(*child).eq_ignore_ascii_case(&step.tag))
            .nth(step.nth - 1)?;
    }

    Some(current)
}

/// The element's id if it is non-empty and resolves back to this element.
fn unique_id<D: PageDom>(dom: &D, node: D::Node) -> Option<String> {
    let id = dom.element_id(node).filter(|id| !id.is_empty())?;
    (dom.element_by_id(&id) == Some(node)).then_some(id)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// CSS identifier escaping, as `CSS.escape` does it.
pub fn escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let starts_with_dash = value.starts_with('-');

    for (i, c) in value.chars().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && starts_with_dash));
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if c.is_ascii_control() || leading_digit {
            let _ = write!(out, "\\{:x} ", c as u32);
        } else if i == 0 && c == '-' && value.len() == 1 {
            out.push_str("\\-");
        } else if is_name_char(c) {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

enum Segment {
    Id(String),
    Tag { tag: String, nth: Option<usize> },
}

struct Parser {
    chars: Vec<(usize, char)>,
    len: usize,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.char_indices().collect(),
            len: input.len(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.len, |(o, _)| *o)
    }

    fn unexpected(&self) -> LocatorParseError {
        match self.peek() {
            Some(ch) => LocatorParseError::UnexpectedChar {
                offset: self.offset(),
                ch,
            },
            None => LocatorParseError::UnexpectedEnd,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, literal: &str) -> Result<(), LocatorParseError> {
        for expected in literal.chars() {
            if self.peek() != Some(expected) {
                return Err(self.unexpected());
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn locator(&mut self) -> Result<LocatorPath, LocatorParseError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(LocatorParseError::Empty);
        }

        let start = match self.segment()? {
            Segment::Id(id) => PathStart::Id(id),
            Segment::Tag { tag, nth } if tag == "html" && nth.unwrap_or(1) == 1 => PathStart::Root,
            Segment::Tag { tag, .. } => return Err(LocatorParseError::UnsupportedStart(tag)),
        };

        let mut steps = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            self.expect(">")?;
            self.skip_whitespace();
            match self.segment()? {
                Segment::Id(id) => return Err(LocatorParseError::MisplacedId(id)),
                Segment::Tag { tag, nth } => steps.push(PathStep {
                    tag,
                    nth: nth.unwrap_or(1),
                }),
            }
        }

        Ok(LocatorPath { start, steps })
    }

    fn segment(&mut self) -> Result<Segment, LocatorParseError> {
        if self.peek() == Some('#') {
            self.pos += 1;
            return Ok(Segment::Id(self.ident()?));
        }

        let tag = self.ident()?.to_ascii_lowercase();
        let nth = if self.peek() == Some(':') {
            self.expect(":nth-of-type(")?;
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                digits.push(c);
                self.pos += 1;
            }
            self.expect(")")?;
            match digits.parse::<usize>() {
                Ok(n) if n >= 1 => Some(n),
                _ => return Err(LocatorParseError::InvalidIndex(digits)),
            }
        } else {
            None
        };

        Ok(Segment::Tag { tag, nth })
    }

    fn ident(&mut self) -> Result<String, LocatorParseError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    out.push(self.escape()?);
                }
                Some(c) if is_name_char(c) => {
                    self.pos += 1;
                    out.push(c);
                }
                _ => break,
            }
        }

        if out.is_empty() {
            Err(self.unexpected())
        } else {
            Ok(out)
        }
    }

    fn escape(&mut self) -> Result<char, LocatorParseError> {
        let first = self.peek().ok_or(LocatorParseError::UnexpectedEnd)?;
        if !first.is_ascii_hexdigit() {
            self.pos += 1;
            return Ok(first);
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(h);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        // one whitespace character terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }

        Ok(u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}'))
    }
}
