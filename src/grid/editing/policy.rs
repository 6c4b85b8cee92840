// src/grid/editing/policy.rs

use crate::grid::definitions::Row;

/// Which fields of a system row (`deletable == false`) are locked.
///
/// Only the listed fields are protected; every other field of a system row stays editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBlockPolicy {
    protected_fields: Vec<String>,
}

impl Default for EditBlockPolicy {
    fn default() -> Self {
        Self {
            protected_fields: vec!["name".to_string()],
        }
    }
}

impl EditBlockPolicy {
    pub fn with_protected_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_edit_blocked(&self, row: &Row, field: &str) -> bool {
        !row.deletable && self.protected_fields.iter().any(|f| f == field)
    }

    pub fn is_delete_blocked(&self, row: &Row) -> bool {
        !row.deletable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_rows_lock_only_the_name_field() {
        let policy = EditBlockPolicy::default();
        let system = Row::new("s1").protected();
        assert!(policy.is_edit_blocked(&system, "name"));
        assert!(!policy.is_edit_blocked(&system, "email"));
        assert!(policy.is_delete_blocked(&system));

        let regular = Row::new("r1");
        assert!(!policy.is_edit_blocked(&regular, "name"));
        assert!(!policy.is_delete_blocked(&regular));
    }
}
