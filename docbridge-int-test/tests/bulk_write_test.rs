use docbridge::errors::ErrorKind;
use docbridge_int_test::test_util::{
    cleanup, create_batch_limited_context, create_test_context, create_test_profiles, run_test, Profile,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_bulk_write_then_collection() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            let profiles = create_test_profiles(120);
            client.set_bulk_docs(ctx.endpoint(), &profiles).await?;

            let mut all: Vec<Profile> = client.get_collection(ctx.endpoint()).await?;
            assert_eq!(all.len(), 120);

            all.sort_by(|a, b| a.id.cmp(&b.id));
            assert_eq!(all, profiles);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_write_overwrites_existing() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            client.set_doc(ctx.endpoint(), &Profile::new("p0000", "old", "NL", 99)).await?;
            client.set_bulk_docs(ctx.endpoint(), &create_test_profiles(3)).await?;

            let fetched: Option<Profile> = client.get_doc(ctx.endpoint(), "p0000").await?;
            assert_eq!(fetched.map(|p| p.username), Some("user0".to_string()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_bulk_write_is_noop() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            client.set_bulk_docs::<Profile>(ctx.endpoint(), &[]).await?;

            let all: Vec<Profile> = client.get_collection(ctx.endpoint()).await?;
            assert!(all.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_oversized_bulk_write_writes_nothing() {
    run_test(
        || create_batch_limited_context(10),
        |ctx| async move {
            let client = ctx.client();
            let result = client.set_bulk_docs(ctx.endpoint(), &create_test_profiles(11)).await;
            assert_eq!(result.unwrap_err().kind(), &ErrorKind::BatchTooLarge);

            let all: Vec<Profile> = client.get_collection(ctx.endpoint()).await?;
            assert!(all.is_empty());

            client.set_bulk_docs(ctx.endpoint(), &create_test_profiles(10)).await?;
            let all: Vec<Profile> = client.get_collection(ctx.endpoint()).await?;
            assert_eq!(all.len(), 10);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_write_with_invalid_record_writes_nothing() {
    run_test(
        || create_test_context(),
        |ctx| async move {
            let client = ctx.client();
            let mut profiles = create_test_profiles(5);
            profiles[3].id = String::new();

            let result = client.set_bulk_docs(ctx.endpoint(), &profiles).await;
            assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidId);

            let all: Vec<Profile> = client.get_collection(ctx.endpoint()).await?;
            assert!(all.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
