use internment::Intern;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Intern<String>);

impl Symbol {
    pub fn new(string: &str) -> Symbol {
        Symbol(Intern::new(String::from(string)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::new(value)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

/// Names the resolver treats specially.
pub mod names {
    use super::Symbol;

    pub const INVOKE: &str = "invoke";

    /// Extensions with these names may shadow members of the same shape.
    pub const HIDES_MEMBERS: [&str; 2] = ["forEach", "addSuppressed"];

    pub fn invoke() -> Symbol {
        Symbol::new(INVOKE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interned_symbols_compare_by_identity() {
        let a = Symbol::new("foo");
        let b = Symbol::from("foo");
        assert_eq!(a, b);
        assert_ne!(a, Symbol::new("bar"));
        assert_eq!(a.as_str(), "foo");
        assert_eq!(format!("{a}"), "foo");
        assert_eq!(format!("{a:?}"), "\"foo\"");
    }

    #[test]
    fn test_invoke_name() {
        assert_eq!(names::invoke().as_str(), "invoke");
    }
}
