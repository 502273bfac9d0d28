//! End-to-end find scenarios against a recording transport

use super::test_utils::{client_with, ok, MockTransport};
use serde::Deserialize;
use serde_json::json;
use sitequery::{QueryError, QueryResult, RequestOptions, SiteClient};

#[tokio::test]
async fn test_find_posts_exact_wire_body() {
    let mock = MockTransport::new(vec![ok(
        r#"{"status":"success","result":{"items":[{"title":"Hello"}],"pagination":{"total_items":1,"total_pages":1,"per_page":10,"current_page":0,"has_next_page":false,"has_prev_page":false}}}"#,
    )]);
    let client = client_with(mock.clone());

    let result = client
        .query("Posts")
        .unwrap()
        .eq("status", "published")
        .limit(10)
        .unwrap()
        .find()
        .await
        .unwrap();

    let found = result.into_result().unwrap();
    assert_eq!(found.items, vec![json!({"title": "Hello"})]);
    assert!(!found.has_next_page());

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        "https://acme.wixsite.com/shop/_functions/query"
    );
    assert_eq!(
        requests[0].body,
        json!({
            "collection": "Posts",
            "token": "t1",
            "conditions": [
                {"field": "status", "operator": "eq", "value": "published"},
                {"field": null, "operator": "limit", "value": 10}
            ],
            "options": {}
        })
    );
}

#[tokio::test]
async fn test_find_empty_items() {
    let mock = MockTransport::new(vec![ok(
        r#"{"status":"success","result":{"items":[],"pagination":{"total_items":0}}}"#,
    )]);
    let result = client_with(mock)
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap();

    match result {
        QueryResult::Success(found) => {
            assert!(found.is_empty());
            assert_eq!(found.pagination.unwrap().total_items, 0);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_find_as_typed_items() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        title: String,
        views: u32,
    }

    let mock = MockTransport::new(vec![ok(
        r#"{"status":"success","result":{"items":[{"title":"a","views":3},{"title":"b","views":9}]}}"#,
    )]);
    let found = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .gt("views", 2)
        .descending("views")
        .find_as::<Post>()
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(
        found.items,
        vec![
            Post {
                title: "a".to_string(),
                views: 3
            },
            Post {
                title: "b".to_string(),
                views: 9
            },
        ]
    );
    assert_eq!(found.pagination, None);
    assert_eq!(
        mock.requests()[0].body["conditions"][1],
        json!({"field": "views", "operator": "descending", "value": null})
    );
}

#[tokio::test]
async fn test_application_failure_is_a_result_not_an_error() {
    let mock = MockTransport::new(vec![ok(
        r#"{"status":"failed","error":"unauthorized"}"#,
    )]);
    let result = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap();

    let failure = result.failure().unwrap();
    assert_eq!(failure.code, "unauthorized");
    assert_eq!(failure.message, "The request token was rejected by the site");
    assert_eq!(mock.call_count(), 1);

    assert!(matches!(
        result.into_result(),
        Err(QueryError::Application(_))
    ));
}

#[tokio::test]
async fn test_malformed_response_surfaces_once() {
    let mock = MockTransport::new(vec![ok(r#"{"result":{"items":[]}}"#)]);
    let err = client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .find()
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::MalformedResponse(_)));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_paging_validation_produces_no_network_call() {
    let mock = MockTransport::new(Vec::new());
    let client = client_with(mock.clone());

    assert!(client.query("Posts").unwrap().limit(0).is_err());
    assert!(client.query("Posts").unwrap().limit(-5).is_err());
    assert!(client.query("Posts").unwrap().skip(-1).is_err());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_options_are_forwarded() {
    let mock = MockTransport::new(Vec::new());
    client_with(mock.clone())
        .query("Posts")
        .unwrap()
        .with_options(RequestOptions {
            suppress_auth: Some(true),
            suppress_hooks: None,
        })
        .find()
        .await
        .unwrap();

    assert_eq!(
        mock.requests()[0].body["options"],
        json!({"suppressAuth": true})
    );
}

#[tokio::test]
async fn test_concurrent_facades_do_not_share_conditions() {
    let mock = MockTransport::new(Vec::new());
    let client = client_with(mock.clone());

    let posts = client.query("Posts").unwrap().eq("status", "draft");
    let authors = client.query("Authors").unwrap().is_not_empty("email");

    let (a, b) = futures::future::join(posts.find(), authors.find()).await;
    assert!(a.unwrap().is_success());
    assert!(b.unwrap().is_success());

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    for request in requests {
        let conditions = request.body["conditions"].as_array().unwrap().clone();
        assert_eq!(conditions.len(), 1);
        match request.body["collection"].as_str().unwrap() {
            "Posts" => assert_eq!(conditions[0]["operator"], "eq"),
            "Authors" => assert_eq!(conditions[0]["operator"], "isNotEmpty"),
            other => panic!("unexpected collection {}", other),
        }
    }
}

#[test]
fn test_client_rejects_empty_identity() {
    assert!(SiteClient::new("", "shop", "t1").unwrap_err().is_validation());
    assert!(SiteClient::new("acme", "", "t1").unwrap_err().is_validation());
    assert!(SiteClient::new("acme", "shop", "").unwrap_err().is_validation());
}
