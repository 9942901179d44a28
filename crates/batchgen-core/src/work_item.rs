use uuid::Uuid;

/// A single unit of catalog work to submit to the remote text-generation
/// service.
///
/// Constructed only through [`WorkItem::new`], which enforces the
/// invariant that `name` is non-empty after trimming: a `WorkItem` in hand
/// is always valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    id: Uuid,
    name: String,
    extra: Option<String>,
}

/// Errors that can occur while constructing a [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkItemError {
    #[error("work item name must not be empty")]
    EmptyName,
}

impl WorkItem {
    /// Builds a new work item, rejecting a blank `name`.
    pub fn new(id: Uuid, name: impl Into<String>, extra: Option<String>) -> Result<Self, WorkItemError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WorkItemError::EmptyName);
        }
        Ok(Self { id, name, extra })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_name() {
        let id = Uuid::nil();
        assert_eq!(WorkItem::new(id, "   ", None), Err(WorkItemError::EmptyName));
        assert_eq!(WorkItem::new(id, "", None), Err(WorkItemError::EmptyName));
    }

    #[test]
    fn accepts_trimmed_non_empty_name() {
        let id = Uuid::nil();
        let item = WorkItem::new(id, "Miles Davis", Some("jazz".to_string())).unwrap();
        assert_eq!(item.name(), "Miles Davis");
        assert_eq!(item.extra(), Some("jazz"));
        assert_eq!(item.id(), id);
    }
}
