//! Line ranges that may prefix an Ex command (`:%d`, `:2,4d`, `:.,$-1d`).

use crate::editor::Editor;

use super::error::ExError;

/// Base of one line address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBase {
    /// `.`
    Current,
    /// `$`
    Last,
    /// An absolute 1-based line number.
    Number(usize),
}

/// A line address with an optional signed offset (`$-1`, `.+2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub base: LineBase,
    pub offset: i64,
}

impl Address {
    fn resolve(&self, editor: &Editor) -> Result<usize, ExError> {
        let base = match self.base {
            LineBase::Current => editor.cursor_line() as i64,
            LineBase::Last => editor.line_count() as i64,
            LineBase::Number(n) => i64::try_from(n).map_err(|_| ExError::InvalidRange)?,
        };
        match base.checked_add(self.offset) {
            Some(line) if line >= 0 && line as usize <= editor.line_count() => Ok(line as usize),
            _ => Err(ExError::InvalidRange),
        }
    }
}

/// The range prefix of a command; empty when none was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranges {
    addresses: Vec<Address>,
}

impl Ranges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Split a leading range off `text`.  Returns the range and the rest.
    pub fn parse(text: &str) -> (Ranges, &str) {
        let mut ranges = Ranges::new();
        let mut rest = text.trim_start();

        if let Some(r) = rest.strip_prefix('%') {
            ranges.addresses.push(Address {
                base: LineBase::Number(1),
                offset: 0,
            });
            ranges.addresses.push(Address {
                base: LineBase::Last,
                offset: 0,
            });
            return (ranges, r);
        }

        while let Some((address, r)) = parse_address(rest) {
            ranges.addresses.push(address);
            rest = r.trim_start();
            match rest.strip_prefix([',', ';']) {
                Some(r) => rest = r.trim_start(),
                None => break,
            }
        }
        (ranges, rest)
    }

    /// Resolve to an inclusive 1-based `(first, last)` pair.
    ///
    /// With no addresses the cursor line is used.  A backwards range is an
    /// error.
    pub fn line_range(&self, editor: &Editor) -> Result<(usize, usize), ExError> {
        let (first, last) = match self.addresses.as_slice() {
            [] => {
                let line = editor.cursor_line();
                (line, line)
            }
            [only] => {
                let line = only.resolve(editor)?;
                (line, line)
            }
            [.., a, b] => (a.resolve(editor)?, b.resolve(editor)?),
        };
        if first > last {
            return Err(ExError::InvalidRange);
        }
        Ok((first, last))
    }
}

fn parse_address(text: &str) -> Option<(Address, &str)> {
    let (base, mut rest) = if let Some(r) = text.strip_prefix('.') {
        (Some(LineBase::Current), r)
    } else if let Some(r) = text.strip_prefix('$') {
        (Some(LineBase::Last), r)
    } else {
        let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
        if end == 0 {
            (None, text)
        } else {
            // Too many digits still names a line; resolving it fails.
            let n = text[..end].parse().unwrap_or(usize::MAX);
            (Some(LineBase::Number(n)), &text[end..])
        }
    };

    let mut offset = 0i64;
    let mut saw_offset = false;
    while let Some(sign) = rest.chars().next().filter(|c| matches!(c, '+' | '-')) {
        let after = &rest[1..];
        let end = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
        // A bare sign counts one; an overflowing count saturates so that
        // resolving the address fails.
        let n: i64 = match &after[..end] {
            "" => 1,
            digits => digits.parse().unwrap_or(i64::MAX),
        };
        offset = offset.saturating_add(if sign == '+' { n } else { -n });
        rest = &after[end..];
        saw_offset = true;
    }

    match base {
        Some(base) => Some((Address { base, offset }, rest)),
        // A bare offset is relative to the cursor.
        None if saw_offset => Some((
            Address {
                base: LineBase::Current,
                offset,
            },
            rest,
        )),
        None => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
