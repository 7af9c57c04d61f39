use std::{collections::BTreeMap, fmt};

///
/// ErrorTree
///
/// Route-aware collection of validation messages. Each node holds the
/// messages raised at that route plus child trees keyed by route segment,
/// so every problem in a descriptor is reported in one pass.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, ErrorTree>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl fmt::Display) {
        self.messages.push(message.to_string());
    }

    /// Record the error side of a result, if any.
    pub fn add_result<E: fmt::Display>(&mut self, result: Result<(), E>) {
        if let Err(e) = result {
            self.add(e);
        }
    }

    /// Record a message under a child route.
    pub fn add_at(&mut self, route: &str, message: impl fmt::Display) {
        self.child_mut(route).add(message);
    }

    /// Merge another tree at this level.
    pub fn merge(&mut self, other: Self) {
        self.messages.extend(other.messages);
        for (key, child) in other.children {
            self.children.entry(key).or_default().merge(child);
        }
    }

    /// Merge another tree under a dotted route; an empty route merges here.
    pub fn merge_at(&mut self, route: &str, other: Self) {
        if route.is_empty() {
            self.merge(other);
        } else {
            self.child_mut(route).merge(other);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Total number of messages in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// `(route, message)` pairs in route order; root messages have an
    /// empty route.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);

        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for message in &self.messages {
            out.push((prefix.to_string(), message.clone()));
        }
        for (key, child) in &self.children {
            let route = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            child.flatten_into(&route, out);
        }
    }

    fn child_mut(&mut self, route: &str) -> &mut Self {
        route
            .split('.')
            .fold(self, |node, segment| node.children.entry(segment.to_string()).or_default())
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (route, message)) in self.flatten().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if route.is_empty() {
                write!(f, "{message}")?;
            } else {
                write!(f, "{route}: {message}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

/// Push a formatted message onto an `ErrorTree`.
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}
