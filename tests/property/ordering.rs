//! Recorded conditions replay in call order

use proptest::prelude::*;
use serde_json::{json, Value};
use sitequery::{Query, SiteClient};

#[derive(Debug, Clone)]
enum Call {
    Eq(String, i64),
    Ne(String, i64),
    Contains(String, String),
    Between(String, i64, i64),
    IsEmpty(String),
    Ascending(String),
    Descending(String),
    Limit(i64),
    Skip(i64),
}

fn call_strategy() -> impl Strategy<Value = Call> {
    let field = "[a-z]{1,8}";
    prop_oneof![
        (field, any::<i64>()).prop_map(|(f, v)| Call::Eq(f, v)),
        (field, any::<i64>()).prop_map(|(f, v)| Call::Ne(f, v)),
        (field, "[a-zA-Z ]{0,12}").prop_map(|(f, v)| Call::Contains(f, v)),
        (field, any::<i64>(), any::<i64>()).prop_map(|(f, a, b)| Call::Between(f, a, b)),
        field.prop_map(Call::IsEmpty),
        field.prop_map(Call::Ascending),
        field.prop_map(Call::Descending),
        (1..10_000i64).prop_map(Call::Limit),
        (0..10_000i64).prop_map(Call::Skip),
    ]
}

fn apply(query: Query, call: &Call) -> Query {
    match call.clone() {
        Call::Eq(f, v) => query.eq(f, v),
        Call::Ne(f, v) => query.ne(f, v),
        Call::Contains(f, v) => query.contains(f, v),
        Call::Between(f, a, b) => query.between(f, a, b),
        Call::IsEmpty(f) => query.is_empty(f),
        Call::Ascending(f) => query.ascending(f),
        Call::Descending(f) => query.descending(f),
        Call::Limit(n) => query.limit(n).unwrap(),
        Call::Skip(n) => query.skip(n).unwrap(),
    }
}

fn expected(call: &Call) -> Value {
    match call {
        Call::Eq(f, v) => json!({"field": f, "operator": "eq", "value": v}),
        Call::Ne(f, v) => json!({"field": f, "operator": "ne", "value": v}),
        Call::Contains(f, v) => json!({"field": f, "operator": "contains", "value": v}),
        Call::Between(f, a, b) => {
            json!({"field": f, "operator": "between", "value": a, "extraValue": b})
        }
        Call::IsEmpty(f) => json!({"field": f, "operator": "isEmpty", "value": null}),
        Call::Ascending(f) => json!({"field": f, "operator": "ascending", "value": null}),
        Call::Descending(f) => json!({"field": f, "operator": "descending", "value": null}),
        Call::Limit(n) => json!({"field": null, "operator": "limit", "value": n}),
        Call::Skip(n) => json!({"field": null, "operator": "skip", "value": n}),
    }
}

proptest! {
    #[test]
    fn test_conditions_serialize_in_call_order(calls in prop::collection::vec(call_strategy(), 0..24)) {
        let client = SiteClient::new("acme", "shop", "t1").unwrap();
        let query = calls
            .iter()
            .fold(client.query("Posts").unwrap(), apply);

        let resolved = query.conditions().resolve().unwrap();
        prop_assert_eq!(resolved.len(), calls.len());

        let serialized = serde_json::to_value(&resolved).unwrap();
        let wanted = Value::Array(calls.iter().map(expected).collect());
        prop_assert_eq!(serialized, wanted);
    }
}
