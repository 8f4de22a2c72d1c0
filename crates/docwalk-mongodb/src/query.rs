//! Equality filter builder

use bson::{Bson, Document as BsonDocument};
use docwalk_common::Result;

use crate::validation::ValidatedFieldName;

/// Builds `{ field: value, ... }` filters that match on exact equality
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Bson)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching every document (`{}`)
    pub fn all() -> BsonDocument {
        BsonDocument::new()
    }

    /// Require `field` to equal `value`. A repeated field replaces the earlier value.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.conditions.iter_mut().find(|(name, _)| *name == field) {
            Some(existing) => existing.1 = value,
            None => self.conditions.push((field, value)),
        }
        self
    }

    /// Validate field names and produce the filter document
    pub fn build(self) -> Result<BsonDocument> {
        let mut filter = BsonDocument::new();
        for (field, value) in self.conditions {
            let field = ValidatedFieldName::new(&field)?;
            filter.insert(field.into_string(), value);
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docwalk_common::DocwalkError;

    #[test]
    fn test_filter_all_is_empty() {
        assert!(Filter::all().is_empty());
        assert!(Filter::new().build().unwrap().is_empty());
    }

    #[test]
    fn test_filter_eq() {
        let filter = Filter::new().eq("name", "Tim").build().unwrap();
        assert_eq!(filter, doc! { "name": "Tim" });
    }

    #[test]
    fn test_filter_chaining_keeps_order() {
        let filter = Filter::new()
            .eq("name", "Tim")
            .eq("age", 25)
            .build()
            .unwrap();
        assert_eq!(filter, doc! { "name": "Tim", "age": 25 });
    }

    #[test]
    fn test_filter_repeated_field_replaces() {
        let filter = Filter::new().eq("name", "Tim").eq("name", "Ann").build().unwrap();
        assert_eq!(filter, doc! { "name": "Ann" });
    }

    #[test]
    fn test_filter_rejects_operator_field() {
        let err = Filter::new().eq("$where", "true").build().unwrap_err();
        assert!(matches!(err, DocwalkError::Validation(_)));
    }
}
