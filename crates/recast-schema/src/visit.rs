use crate::{error::ErrorTree, node::VisitableNode};

///
/// Event
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    Enter,
    Exit,
}

///
/// Visitor
///

pub trait Visitor {
    fn visit<T: VisitableNode + ?Sized>(&mut self, node: &T, event: Event);

    fn push(&mut self, _: &str) {}
    fn pop(&mut self) {}
}

///
/// ValidateVisitor
///
/// Runs each node's local validation and files failures under the node's
/// route.
///

#[derive(Debug, Default)]
pub struct ValidateVisitor {
    route: Vec<String>,
    pub errors: ErrorTree,
}

impl ValidateVisitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn current_route(&self) -> String {
        self.route.join(".")
    }
}

impl Visitor for ValidateVisitor {
    fn visit<T: VisitableNode + ?Sized>(&mut self, node: &T, event: Event) {
        if event == Event::Enter
            && let Err(errs) = node.validate()
        {
            let route = self.current_route();
            self.errors.merge_at(&route, errs);
        }
    }

    fn push(&mut self, key: &str) {
        self.route.push(key.to_string());
    }

    fn pop(&mut self) {
        self.route.pop();
    }
}
