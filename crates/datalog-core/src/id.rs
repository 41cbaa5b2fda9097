use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide unique identifier for terms and predicates.
///
/// Two terms are "the same" exactly when their ids are equal; payload
/// equality never enters into it. Ids are minted from a single atomic
/// counter, so they stay distinct for the life of the process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Id(u64);

impl Id {
    pub(crate) fn fresh() -> Id {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Id(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::LowerHex for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_distinct() {
        let a = Id::fresh();
        let b = Id::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_rendering() {
        let id = Id(255);
        assert_eq!(format!("{:x}", id), "ff");
    }
}
