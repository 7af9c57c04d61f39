use convert_case::{Case, Casing};
use std::fmt::Debug;

///
/// MemberNameMatchStrategy
///
/// Decides when two names refer to the same thing while binding a
/// projection: constructor parameters against target members and source
/// members, and target members against source members.
///

pub trait MemberNameMatchStrategy: Debug + Send + Sync {
    /// Does constructor parameter `param` initialise target member `member`?
    fn parameter_matches_member(&self, param: &str, member: &str) -> bool;

    /// Can constructor parameter `param` be fed from source member `source`?
    fn parameter_matches_source_member(&self, param: &str, source: &str) -> bool;

    /// Does target member `member` take its value from source member `source`?
    fn member_matches_source_member(&self, member: &str, source: &str) -> bool;
}

///
/// CamelCaseMatchStrategy
///
/// Names match when equal, or when their camel-case forms are equal, so
/// `orderId`, `OrderId` and `order_id` all name the same member.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct CamelCaseMatchStrategy;

impl CamelCaseMatchStrategy {
    fn same(a: &str, b: &str) -> bool {
        a == b || a.to_case(Case::Camel) == b.to_case(Case::Camel)
    }
}

impl MemberNameMatchStrategy for CamelCaseMatchStrategy {
    fn parameter_matches_member(&self, param: &str, member: &str) -> bool {
        Self::same(param, member)
    }

    fn parameter_matches_source_member(&self, param: &str, source: &str) -> bool {
        Self::same(param, source)
    }

    fn member_matches_source_member(&self, member: &str, source: &str) -> bool {
        Self::same(member, source)
    }
}

///
/// ExactMatchStrategy
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ExactMatchStrategy;

impl MemberNameMatchStrategy for ExactMatchStrategy {
    fn parameter_matches_member(&self, param: &str, member: &str) -> bool {
        param == member
    }

    fn parameter_matches_source_member(&self, param: &str, source: &str) -> bool {
        param == source
    }

    fn member_matches_source_member(&self, member: &str, source: &str) -> bool {
        member == source
    }
}
