//! Query Facade
//!
//! Fluent, caller-owned builder for one collection. Condition methods only record;
//! terminal methods (`find`, `insert`, `save`, `update`, `remove`, `truncate`)
//! dispatch a request. A facade can dispatch any number of times; each terminal
//! call uses the conditions recorded up to that point.

use crate::condition::{Condition, ConditionSet, Field, Operator};
use crate::error::QueryError;
use crate::retry::RetryPolicy;
use crate::transport::Transport;
use crate::types::{FindResult, ItemIds, Items, QueryResult, RequestOptions};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Fluent query over a single collection
#[derive(Debug, Clone)]
pub struct Query {
    collection: String,
    transport: Transport,
    conditions: ConditionSet,
    options: RequestOptions,
}

impl Query {
    pub(crate) fn new(collection: impl Into<String>, transport: Transport) -> Self {
        Self {
            collection: collection.into(),
            transport,
            conditions: ConditionSet::new(),
            options: RequestOptions::default(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Per-attempt deadline applied to terminal calls.
    pub fn timeout(&self) -> Duration {
        self.transport.timeout()
    }

    fn push(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn filter(self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Condition::filter(Field::Name(field.into()), operator, value))
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Eq, value)
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Ne, value)
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Gt, value)
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Gte, value)
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Lt, value)
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Lte, value)
    }

    pub fn contains(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Contains, value)
    }

    pub fn starts_with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::StartsWith, value)
    }

    pub fn ends_with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::EndsWith, value)
    }

    /// Inclusive range on `field`: `low` travels as `value`, `high` as `extraValue`.
    pub fn between(
        self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.push(Condition::between(Field::Name(field.into()), low, high))
    }

    pub fn has_some<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(field, Operator::HasSome, values)
    }

    pub fn has_all<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(field, Operator::HasAll, values)
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn is_empty(self, field: impl Into<String>) -> Self {
        self.push(Condition::presence(Field::Name(field.into()), Operator::IsEmpty))
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn is_not_empty(self, field: impl Into<String>) -> Self {
        self.push(Condition::presence(Field::Name(field.into()), Operator::IsNotEmpty))
    }

    pub fn ascending(self, field: impl Into<String>) -> Self {
        self.push(Condition::sort(Field::Name(field.into()), Operator::Ascending))
    }

    pub fn descending(self, field: impl Into<String>) -> Self {
        self.push(Condition::sort(Field::Name(field.into()), Operator::Descending))
    }

    /// Include referenced fields in returned items.
    pub fn include<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.push(Condition::projection(Operator::Include, names))
    }

    /// Restrict returned items to the named fields.
    pub fn fields<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.push(Condition::projection(Operator::Fields, names))
    }

    /// Page size. Fails immediately unless `n` is positive.
    pub fn limit(self, n: i64) -> Result<Self, QueryError> {
        Ok(self.push(Condition::limit(n)?))
    }

    /// Items to skip. Fails immediately when `n` is negative.
    pub fn skip(self, n: i64) -> Result<Self, QueryError> {
        Ok(self.push(Condition::skip(n)?))
    }

    /// Record a condition by operator name. The name is checked against the
    /// operator table when the query is dispatched.
    pub fn where_operator(
        mut self,
        operator: impl Into<String>,
        field: Option<Field>,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push_named(operator, field, value.into(), None);
        self
    }

    /// [`Query::where_operator`] for two-bound operators such as `between`.
    pub fn where_range(
        mut self,
        operator: impl Into<String>,
        field: Option<Field>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        self.conditions
            .push_named(operator, field, lower.into(), Some(upper.into()));
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.transport = self.transport.with_retry_policy(retry);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.with_timeout(timeout);
        self
    }

    /// Run the recorded conditions against the query route.
    pub async fn find(&self) -> Result<QueryResult<FindResult>, QueryError> {
        self.find_as::<Value>().await
    }

    /// [`Query::find`] with items decoded into `T`.
    pub async fn find_as<T: DeserializeOwned>(
        &self,
    ) -> Result<QueryResult<FindResult<T>>, QueryError> {
        let conditions = self.conditions.resolve()?;
        self.transport
            .find(&self.collection, conditions, self.options.clone())
            .await
    }

    /// Insert one item (JSON object) or a batch (array of objects).
    pub async fn insert(&self, item: impl Into<Items>) -> Result<QueryResult<Value>, QueryError> {
        let item = validate_items(item.into())?;
        self.transport
            .insert(&self.collection, item, self.options.clone())
            .await
    }

    /// Insert or replace one item or a batch.
    pub async fn save(&self, item: impl Into<Items>) -> Result<QueryResult<Value>, QueryError> {
        let item = validate_items(item.into())?;
        self.transport
            .save(&self.collection, item, self.options.clone())
            .await
    }

    /// Update a single item identified by its id field.
    pub async fn update(&self, item: Value) -> Result<QueryResult<Value>, QueryError> {
        if !item.is_object() {
            return Err(QueryError::Validation(
                "update requires a JSON object item".to_string(),
            ));
        }
        self.transport
            .update(&self.collection, item, self.options.clone())
            .await
    }

    /// Remove one item or a batch by id.
    pub async fn remove(&self, item_id: impl Into<ItemIds>) -> Result<QueryResult<Value>, QueryError> {
        let item_id = item_id.into();
        if item_id.is_empty() || item_id.has_blank() {
            return Err(QueryError::Validation(
                "remove requires non-empty item ids".to_string(),
            ));
        }
        self.transport
            .remove(&self.collection, item_id, self.options.clone())
            .await
    }

    /// Remove every item in the collection.
    pub async fn truncate(&self) -> Result<QueryResult<Value>, QueryError> {
        self.transport
            .truncate(&self.collection, self.options.clone())
            .await
    }
}

fn validate_items(items: Items) -> Result<Items, QueryError> {
    let valid = match &items {
        Items::One(item) => item.is_object(),
        Items::Many(batch) => !batch.is_empty() && batch.iter().all(Value::is_object),
    };
    if !valid {
        return Err(QueryError::Validation(
            "items must be a JSON object or a non-empty array of objects".to_string(),
        ));
    }
    Ok(items)
}
