use crate::SrcId;
use std::fmt;
use std::ops::Range;

/// A byte range inside one source.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    src: SrcId,
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(src: SrcId, range: Range<usize>) -> Self {
        assert!(range.start <= range.end);
        Span {
            src,
            start: range.start,
            end: range.end,
        }
    }

    pub fn src(&self) -> SrcId {
        self.src
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{:?}", self.src, self.range())
    }
}

impl chumsky::Span for Span {
    type Context = SrcId;
    type Offset = usize;

    fn new(src: SrcId, range: Range<usize>) -> Self {
        Span::new(src, range)
    }

    fn context(&self) -> SrcId {
        self.src
    }

    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

impl ariadne::Span for Span {
    type SourceId = SrcId;

    fn source(&self) -> &SrcId {
        &self.src
    }

    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_range() {
        let span = Span::new(SrcId::repl(), 3..9);
        assert_eq!(span.range(), 3..9);
        assert_eq!(span.src(), SrcId::repl());
    }

    #[test]
    #[should_panic]
    fn test_span_rejects_reversed_range() {
        #[allow(clippy::reversed_empty_ranges)]
        Span::new(SrcId::empty(), 9..3);
    }
}
