//! Check descriptors

use std::fmt;
use std::sync::Arc;

use crate::check::CheckFn;
use crate::client::Provider;
use crate::report::{UNASSIGNED_PROVIDER, UNCATEGORIZED};

/// Immutable metadata plus the body of one registered check
pub struct CheckDescriptor {
    name: String,
    tags: Vec<String>,
    description: Option<String>,
    body: Arc<dyn CheckFn>,
}

impl CheckDescriptor {
    /// Build a descriptor; tags are trimmed, deduplicated and keep their order
    pub fn new<I, T>(name: impl Into<String>, tags: I, body: Arc<dyn CheckFn>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into().trim().to_string();
            if !tag.is_empty() && !unique.contains(&tag) {
                unique.push(tag);
            }
        }

        Self {
            name: name.into(),
            tags: unique,
            description: None,
            body,
        }
    }

    pub fn from_fn<I, T, F>(name: impl Into<String>, tags: I, body: F) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: CheckFn + 'static,
    {
        Self::new(name, tags, Arc::new(body))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub(crate) fn body(&self) -> Arc<dyn CheckFn> {
        Arc::clone(&self.body)
    }

    /// First tag naming a cloud provider
    pub fn provider(&self) -> Option<Provider> {
        self.tags.iter().find_map(|t| Provider::from_tag(t))
    }

    pub fn provider_label(&self) -> &str {
        self.provider()
            .map(|p| p.as_str())
            .unwrap_or(UNASSIGNED_PROVIDER)
    }

    /// First tag that is not a provider tag
    pub fn category(&self) -> Option<&str> {
        self.tags
            .iter()
            .map(String::as_str)
            .find(|t| Provider::from_tag(t).is_none())
    }

    pub fn category_label(&self) -> &str {
        self.category().unwrap_or(UNCATEGORIZED)
    }
}

impl fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Default check name for a function: the last segment of its type path
pub(crate) fn function_name<F>() -> &'static str {
    let full = std::any::type_name::<F>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckContext, CheckOutcome};

    async fn aws_sample_check(_ctx: CheckContext) -> CheckOutcome {
        Ok(())
    }

    #[test]
    fn test_function_name() {
        fn name_of<F>(_: &F) -> &'static str {
            function_name::<F>()
        }
        assert_eq!(name_of(&aws_sample_check), "aws_sample_check");
    }

    #[test]
    fn test_tags_are_deduplicated_in_order() {
        let d = CheckDescriptor::from_fn("c", ["azure", " permissions ", "azure", ""], aws_sample_check);
        assert_eq!(d.tags(), &["azure".to_string(), "permissions".to_string()]);
    }

    #[test]
    fn test_provider_and_category() {
        let d = CheckDescriptor::from_fn("c", ["infra", "aws", "storage"], aws_sample_check);
        assert_eq!(d.provider(), Some(Provider::Aws));
        assert_eq!(d.category(), Some("infra"));

        let bare = CheckDescriptor::from_fn("c", Vec::<String>::new(), aws_sample_check);
        assert_eq!(bare.provider_label(), UNASSIGNED_PROVIDER);
        assert_eq!(bare.category_label(), UNCATEGORIZED);
    }
}
