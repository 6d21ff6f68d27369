use crate::direction::Direction;

///
/// SearchWindow
///
/// The `(min, max]` ID range one search query is restricted to.
///
/// `span` is the width the window was built with. Bounds are signed because a
/// descending window is allowed to slide below zero; the search ends once
/// its lower bound is at or below zero. All arithmetic saturates.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchWindow {
    pub min: i64,
    pub max: i64,
    pub span: i64,
}

impl SearchWindow {
    /// First window of a search.
    ///
    /// Ascending starts at the head of the list, `(0, span]`. Descending
    /// starts at the tail, `(last_row - span, last_row]`.
    #[must_use]
    pub const fn initial(direction: Direction, last_row: i64, span: i64) -> Self {
        match direction {
            Direction::Asc => Self {
                min: 0,
                max: span,
                span,
            },
            Direction::Desc => Self {
                min: last_row.saturating_sub(span),
                max: last_row,
                span,
            },
        }
    }

    /// Next window after a successful query: double the span, then slide
    /// past the range just searched.
    #[must_use]
    pub const fn grow(self, direction: Direction) -> Self {
        let span = self.span.saturating_mul(2);

        match direction {
            Direction::Asc => Self {
                min: self.max,
                max: self.max.saturating_add(span),
                span,
            },
            Direction::Desc => Self {
                min: self.min.saturating_sub(span),
                max: self.min,
                span,
            },
        }
    }

    /// Retry window after a threshold failure: same starting edge, span reset
    /// to `span`.
    #[must_use]
    pub const fn reset(self, direction: Direction, span: i64) -> Self {
        match direction {
            Direction::Asc => Self {
                min: self.min,
                max: self.min.saturating_add(span),
                span,
            },
            Direction::Desc => Self {
                min: self.max.saturating_sub(span),
                max: self.max,
                span,
            },
        }
    }

    /// True once this window covers the far end of the list in the search
    /// direction.
    #[must_use]
    pub const fn reaches_end(&self, direction: Direction, last_row: i64) -> bool {
        match direction {
            Direction::Asc => self.max >= last_row,
            Direction::Desc => self.min <= 0,
        }
    }
}

///
/// TESTS
///
