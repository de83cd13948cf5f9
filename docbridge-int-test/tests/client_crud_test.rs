use docbridge::errors::ErrorKind;
use docbridge::reference::Endpoint;
use docbridge_int_test::test_util::{cleanup, create_test_context, run_test, Profile};
use serde_json::json;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_set_then_get_round_trip() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            let profile = Profile::new("p1", "ada", "UK", 36)
                .verified()
                .interested_in(&["math", "engines"]);
            client.set_doc(ctx.endpoint(), &profile).await?;

            let fetched: Option<Profile> = client.get_doc(ctx.endpoint(), "p1").await?;
            assert_eq!(fetched, Some(profile));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_set_replaces_whole_document() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            client
                .set_doc(ctx.endpoint(), &json!({"_id": "d1", "a": 1, "b": 2}))
                .await?;
            client.set_doc(ctx.endpoint(), &json!({"_id": "d1", "c": 3})).await?;

            let fetched: Option<serde_json::Value> = client.get_doc(ctx.endpoint(), "d1").await?;
            assert_eq!(fetched, Some(json!({"_id": "d1", "c": 3})));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_merges_fields() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            client
                .set_doc(ctx.endpoint(), &json!({"_id": "d1", "a": 1, "b": 2}))
                .await?;
            client.update_doc(ctx.endpoint(), &json!({"_id": "d1", "b": 3})).await?;

            let fetched: Option<serde_json::Value> = client.get_doc(ctx.endpoint(), "d1").await?;
            assert_eq!(fetched, Some(json!({"_id": "d1", "a": 1, "b": 3})));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_missing_document_is_not_found() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            let result = client.update_doc(ctx.endpoint(), &json!({"_id": "ghost", "b": 3})).await;
            assert_eq!(result.unwrap_err().kind(), &ErrorKind::NotFound);

            let fetched: Option<serde_json::Value> = client.get_doc(ctx.endpoint(), "ghost").await?;
            assert!(fetched.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_get_missing_document_is_none() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let fetched: Option<Profile> = ctx.client().get_doc(ctx.endpoint(), "missing").await?;
            assert!(fetched.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_missing_document_succeeds() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            client.delete_doc(ctx.endpoint(), "missing").await?;

            client.set_doc(ctx.endpoint(), &Profile::new("p1", "ada", "UK", 36)).await?;
            client.delete_doc(ctx.endpoint(), "p1").await?;
            client.delete_doc(ctx.endpoint(), "p1").await?;
            let fetched: Option<Profile> = client.get_doc(ctx.endpoint(), "p1").await?;
            assert!(fetched.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_identity_is_validated() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();

            let missing = client.set_doc(ctx.endpoint(), &json!({"name": "x"})).await;
            assert_eq!(missing.unwrap_err().kind(), &ErrorKind::InvalidId);

            let empty = client.set_doc(ctx.endpoint(), &json!({"_id": ""})).await;
            assert_eq!(empty.unwrap_err().kind(), &ErrorKind::InvalidId);

            let numeric = client.set_doc(ctx.endpoint(), &json!({"_id": 7})).await;
            assert_eq!(numeric.unwrap_err().kind(), &ErrorKind::InvalidId);

            let slash = client.get_doc::<Profile>(ctx.endpoint(), "a/b").await;
            assert_eq!(slash.unwrap_err().kind(), &ErrorKind::InvalidId);

            let not_an_object = client.set_doc(ctx.endpoint(), &vec![1, 2, 3]).await;
            assert_eq!(not_an_object.unwrap_err().kind(), &ErrorKind::ObjectMappingError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_endpoint_is_validated() {
    assert_eq!(Endpoint::new("").unwrap_err().kind(), &ErrorKind::InvalidEndpoint);
    assert_eq!(Endpoint::new("a/b").unwrap_err().kind(), &ErrorKind::InvalidEndpoint);
}

#[test]
fn test_record_shape_mismatch_is_mapping_error() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            client.set_doc(ctx.endpoint(), &json!({"_id": "p1", "username": 5})).await?;

            let result = client.get_doc::<Profile>(ctx.endpoint(), "p1").await;
            assert_eq!(result.unwrap_err().kind(), &ErrorKind::ObjectMappingError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_clients_share_store() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let writer = ctx.client();
            let reader = writer.clone();
            writer.set_doc(ctx.endpoint(), &Profile::new("p1", "ada", "UK", 36)).await?;

            let fetched: Option<Profile> = reader.get_doc(ctx.endpoint(), "p1").await?;
            assert_eq!(fetched.map(|p| p.username), Some("ada".to_string()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
