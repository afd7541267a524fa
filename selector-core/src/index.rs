//! Index specification.

use crate::error::{SelectorError, SelectorResult};

/// Composite index over an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    fields: Vec<String>,
    name: Option<String>,
    ddoc: Option<String>,
}

/// Builds an index specification over `fields`, in order.
pub fn new_index<I, S>(fields: I) -> SelectorResult<IndexSpec>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
    if fields.is_empty() {
        return Err(SelectorError::EmptyIndex);
    }
    if fields.iter().any(|f| f.is_empty()) {
        return Err(SelectorError::EmptyFieldName("index"));
    }
    Ok(IndexSpec {
        fields,
        name: None,
        ddoc: None,
    })
}

impl IndexSpec {
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Design document the index is stored in.
    pub fn in_design_doc(mut self, ddoc: &str) -> Self {
        self.ddoc = Some(ddoc.to_string());
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ddoc(&self) -> Option<&str> {
        self.ddoc.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_index_keeps_order() {
        let spec = new_index(["name", "age"]).unwrap();
        assert_eq!(spec.fields(), &["name".to_string(), "age".to_string()]);
        assert!(spec.name().is_none());
        assert!(spec.ddoc().is_none());
    }

    #[test]
    fn test_new_index_validation() {
        assert_eq!(
            new_index(Vec::<String>::new()).unwrap_err(),
            SelectorError::EmptyIndex
        );
        assert_eq!(
            new_index(["name", ""]).unwrap_err(),
            SelectorError::EmptyFieldName("index")
        );
    }
}
