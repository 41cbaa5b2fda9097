use internment::Intern;
use std::fmt;
use std::path::Path;

/// Identifies the source a span points into: a file path, the REPL, or
/// nothing (tests).
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SrcId(Intern<String>);

impl SrcId {
    pub fn empty() -> Self {
        SrcId(Intern::new(String::new()))
    }

    pub fn repl() -> Self {
        SrcId(Intern::new("repl".to_string()))
    }

    pub fn from_name(name: &str) -> Self {
        SrcId(Intern::new(name.to_string()))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        SrcId(Intern::new(path.as_ref().to_string_lossy().into_owned()))
    }
}

impl fmt::Display for SrcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "?")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for SrcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
