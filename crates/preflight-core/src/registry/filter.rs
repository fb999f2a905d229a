//! Tag and name filters selecting which checks run

use std::fmt;

use super::CheckDescriptor;

/// Selection criteria over registered checks
///
/// An empty filter selects everything. Criteria combine with AND:
/// every `required` tag, at least one `any_of` tag when any are given,
/// none of the `excluded` tags, and a listed name when names are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    required: Vec<String>,
    any_of: Vec<String>,
    excluded: Vec<String>,
    names: Vec<String>,
}

impl TagFilter {
    /// Select every check
    pub fn all() -> Self {
        Self::default()
    }

    /// Select checks carrying `tag`
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::default().with_tag(tag)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.required.push(tag.into());
        self
    }

    pub fn with_any_tag(mut self, tag: impl Into<String>) -> Self {
        self.any_of.push(tag.into());
        self
    }

    pub fn without_tag(mut self, tag: impl Into<String>) -> Self {
        self.excluded.push(tag.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_unrestricted(&self) -> bool {
        self.required.is_empty()
            && self.any_of.is_empty()
            && self.excluded.is_empty()
            && self.names.is_empty()
    }

    pub fn matches(&self, descriptor: &CheckDescriptor) -> bool {
        if !self.names.is_empty() && !self.names.iter().any(|n| n == descriptor.name()) {
            return false;
        }
        if !self.required.iter().all(|t| descriptor.has_tag(t)) {
            return false;
        }
        if !self.any_of.is_empty() && !self.any_of.iter().any(|t| descriptor.has_tag(t)) {
            return false;
        }
        !self.excluded.iter().any(|t| descriptor.has_tag(t))
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unrestricted() {
            return write!(f, "all");
        }

        let mut parts = Vec::new();
        if !self.required.is_empty() {
            parts.push(format!("tag={}", self.required.join("+")));
        }
        if !self.any_of.is_empty() {
            parts.push(format!("any={}", self.any_of.join("|")));
        }
        if !self.excluded.is_empty() {
            parts.push(format!("exclude={}", self.excluded.join(",")));
        }
        if !self.names.is_empty() {
            parts.push(format!("check={}", self.names.join(",")));
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckContext, CheckOutcome};

    async fn body(_ctx: CheckContext) -> CheckOutcome {
        Ok(())
    }

    fn descriptor(name: &str, tags: &[&str]) -> CheckDescriptor {
        CheckDescriptor::from_fn(name, tags.iter().copied(), body)
    }

    #[test]
    fn test_all_matches_everything() {
        assert!(TagFilter::all().matches(&descriptor("a", &[])));
        assert_eq!(TagFilter::all().to_string(), "all");
    }

    #[test]
    fn test_required_tags() {
        let filter = TagFilter::tag("azure").with_tag("permissions");
        assert!(filter.matches(&descriptor("a", &["azure", "permissions"])));
        assert!(!filter.matches(&descriptor("b", &["azure", "infra"])));
    }

    #[test]
    fn test_any_and_excluded_tags() {
        let filter = TagFilter::all()
            .with_any_tag("aws")
            .with_any_tag("gcp")
            .without_tag("slow");
        assert!(filter.matches(&descriptor("a", &["gcp", "infra"])));
        assert!(!filter.matches(&descriptor("b", &["azure"])));
        assert!(!filter.matches(&descriptor("c", &["aws", "slow"])));
        assert_eq!(filter.to_string(), "any=aws|gcp exclude=slow");
    }

    #[test]
    fn test_names() {
        let filter = TagFilter::all().with_name("a");
        assert!(filter.matches(&descriptor("a", &["aws"])));
        assert!(!filter.matches(&descriptor("b", &["aws"])));
    }
}
