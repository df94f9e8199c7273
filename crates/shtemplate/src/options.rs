use bstr::BString;

use crate::error::ScanError;

/// Buffer capacity used when none is configured.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Delimiter opening a code block when none is configured.
pub const DEFAULT_OPEN: &[u8] = b"%{";

/// Delimiter closing a code block when none is configured.
pub const DEFAULT_CLOSE: &[u8] = b"}%";

/// Configuration for a [`BlockProcessor`](crate::BlockProcessor).
///
/// # Examples
///
/// ```rust
/// use shtemplate::Options;
///
/// let options = Options {
///     open: "{{".into(),
///     close: "}}".into(),
///     ..Default::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
///
/// # Default
///
/// `%{` and `}%` with a 4 KiB buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Byte sequence that starts a code block.
    ///
    /// Matched byte for byte; it is never escaped or re-derived at runtime.
    ///
    /// # Default
    ///
    /// `%{`
    pub open: BString,

    /// Byte sequence that ends a code block.
    ///
    /// Only the first occurrence after an open delimiter ends the block, so
    /// blocks do not nest.
    ///
    /// # Default
    ///
    /// `}%`
    pub close: BString,

    /// Size of the single buffer the scanner reads into.
    ///
    /// Memory use of a run is bounded by this value plus whatever the capture
    /// accumulator holds. Both delimiters must fit in it.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            open: BString::from(DEFAULT_OPEN),
            close: BString::from(DEFAULT_CLOSE),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl Options {
    /// Check both delimiters against the buffer capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::EmptyDelimiter`] or [`ScanError::DelimiterTooLong`]
    /// for the first delimiter that cannot be searched for.
    pub fn validate(&self) -> Result<(), ScanError> {
        check_delimiter(&self.open, self.buffer_capacity)?;
        check_delimiter(&self.close, self.buffer_capacity)
    }
}

pub(crate) fn check_delimiter(delimiter: &[u8], capacity: usize) -> Result<(), ScanError> {
    if delimiter.is_empty() {
        return Err(ScanError::EmptyDelimiter);
    }
    if delimiter.len() > capacity {
        return Err(ScanError::DelimiterTooLong {
            len: delimiter.len(),
            capacity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = Options::default();
        assert_eq!(options.open, "%{");
        assert_eq!(options.close, "}%");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn close_delimiter_longer_than_buffer_is_rejected() {
        let options = Options {
            close: "}}}}".into(),
            buffer_capacity: 3,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ScanError::DelimiterTooLong { len: 4, capacity: 3 })
        ));
    }

    #[test]
    fn empty_open_delimiter_is_rejected() {
        let options = Options {
            open: BString::default(),
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(ScanError::EmptyDelimiter)));
    }

    #[test]
    fn delimiter_as_long_as_buffer_is_accepted() {
        assert!(check_delimiter(b"abcd", 4).is_ok());
    }
}
