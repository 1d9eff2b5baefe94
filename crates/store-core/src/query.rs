//! Query descriptions for point-in-time reads and standing subscriptions.

use serde_json::Value;

use crate::document::CollectionRef;

/// A predicate over one document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the given value. Documents missing the field do not
    /// match.
    Eq { field: String, value: Value },
}

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Server-side ordering of a query's result set.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query over one collection: zero or more filters plus an optional
/// ordering. The same description is used for point-in-time reads
/// ([`DocumentStore::query`](crate::DocumentStore::query)) and standing
/// subscriptions ([`DocumentStore::subscribe`](crate::DocumentStore::subscribe)).
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionRef,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// A query matching every document in `collection`.
    pub fn collection(collection: CollectionRef) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Add an equality filter.
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order results by `field`, ascending.
    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    /// Order results by `field`, descending.
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }
}
