//! End-to-end identity lifecycle against the in-memory stores.

use std::sync::Arc;

use chrono::TimeDelta;
use identity_backend::domain::ports::{
    CredentialHasher, IdentityCommand, RecordFailedLoginRequest,
};
use identity_backend::domain::{
    AccountStatus, Error, ErrorCode, IdentityUpdate, RecordKind, UniqueField, UserId,
};
use identity_backend::test_support::{
    MemoryIdentityService, MemoryStores, MutableClock, fast_hasher, fixture_now, other_request,
    valid_request,
};
use rstest::{fixture, rstest};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

struct World {
    stores: MemoryStores,
    clock: Arc<MutableClock>,
    service: MemoryIdentityService,
    cancel: CancellationToken,
}

#[fixture]
fn world() -> World {
    let stores = MemoryStores::default();
    let clock = Arc::new(MutableClock::new(fixture_now()));
    let service = stores.service(Arc::clone(&clock));
    World {
        stores,
        clock,
        service,
        cancel: CancellationToken::new(),
    }
}

#[rstest]
#[tokio::test]
async fn creating_an_identity_links_three_documents(world: World) {
    let identity = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("create succeeds");

    assert_eq!(identity.profile.user_id, identity.id);
    assert_eq!(identity.credential.user_id, identity.id);
    assert_eq!(identity.profile.details.first_name, "João");
    assert_eq!(identity.credential.username, "joao.silva");
    assert_eq!(identity.credential.account_status, AccountStatus::Active);
    assert_eq!(identity.credential.status_reason, "");
    assert_eq!(identity.credential.failed_login_attempts, 0);
    assert_eq!(identity.credential.created_at, fixture_now());
    assert_eq!(world.stores.profiles.len().await, 1);
    assert_eq!(world.stores.credentials.len().await, 1);
    assert_eq!(world.stores.identities.len().await, 1);

    let hasher = fast_hasher();
    let password = SecretString::from("ValidPass123!".to_owned());
    assert!(
        hasher
            .verify(&password, &identity.credential.password_hash)
            .expect("verify")
    );
}

#[rstest]
#[tokio::test]
async fn reads_are_repeatable_and_hide_the_password(world: World) {
    let created = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("create succeeds");

    let first = world
        .service
        .get_identity(&created.id, &world.cancel)
        .await
        .expect("first read");
    let second = world
        .service
        .get_identity(&created.id, &world.cancel)
        .await
        .expect("second read");
    assert_eq!(first, second);
    assert_eq!(first, created);

    let json = serde_json::to_string(&first).expect("serialise identity");
    assert!(json.contains("\"firstName\":\"João\""));
    assert!(json.contains("\"failedLoginAttempts\":0"));
    assert!(!json.contains("ValidPass123!"));
}

#[rstest]
#[tokio::test]
async fn identities_are_found_by_any_spelling_of_their_id(world: World) {
    let created = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("create succeeds");

    let shouted = UserId::new(created.id.as_ref().to_uppercase()).expect("valid id");
    let found = world
        .service
        .get_identity(&shouted, &world.cancel)
        .await
        .expect("uppercase id resolves");
    assert_eq!(found, created);
}

#[rstest]
#[tokio::test]
async fn unknown_identities_are_not_found(world: World) {
    let err = world
        .service
        .get_identity(&UserId::random(), &world.cancel)
        .await
        .expect_err("nothing stored");
    assert!(matches!(
        err,
        Error::NotFound {
            record: RecordKind::Identity,
            ..
        }
    ));
}

#[rstest]
#[tokio::test]
async fn email_and_username_stay_unique(world: World) {
    world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("first create");

    let mut same_email = other_request();
    same_email.profile.email = "JOAO@X.COM".to_owned();
    let err = world
        .service
        .create_identity(same_email, &world.cancel)
        .await
        .expect_err("email taken");
    assert!(matches!(
        err,
        Error::AlreadyExists {
            field: UniqueField::Email
        }
    ));

    let mut same_username = other_request();
    same_username.credential.username = "joao.silva".to_owned();
    let err = world
        .service
        .create_identity(same_username, &world.cancel)
        .await
        .expect_err("username taken");
    assert_eq!(err.code(), ErrorCode::Conflict);

    world
        .service
        .create_identity(other_request(), &world.cancel)
        .await
        .expect("distinct user");
    assert_eq!(world.stores.identities.len().await, 2);
}

#[rstest]
#[tokio::test]
async fn updates_persist_and_bump_the_change_instant(world: World) {
    let created = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("create succeeds");

    world.clock.advance(TimeDelta::hours(1));
    let mut update = IdentityUpdate::from(created.clone())
        .with_password("N3w$ecretPass");
    update.profile.last_name = "Silva Santos".to_owned();
    update.credential.username = "joao.santos".to_owned();
    let updated = world
        .service
        .update_identity(update, &world.cancel)
        .await
        .expect("update succeeds");

    assert_eq!(updated.profile.details.last_name, "Silva Santos");
    assert_eq!(updated.credential.username, "joao.santos");
    assert_eq!(updated.credential.created_at, created.credential.created_at);
    assert_eq!(
        updated.credential.updated_at,
        fixture_now() + TimeDelta::hours(1)
    );
    assert_ne!(
        updated.credential.password_hash,
        created.credential.password_hash
    );

    let hasher = fast_hasher();
    let hash = &updated.credential.password_hash;
    assert!(
        hasher
            .verify(&SecretString::from("N3w$ecretPass".to_owned()), hash)
            .expect("verify")
    );
    assert!(
        !hasher
            .verify(&SecretString::from("ValidPass123!".to_owned()), hash)
            .expect("verify")
    );

    let reloaded = world
        .service
        .get_identity(&created.id, &world.cancel)
        .await
        .expect("reload");
    assert_eq!(reloaded, updated);
}

#[rstest]
#[tokio::test]
async fn unchanged_updates_leave_the_identity_alone(world: World) {
    let created = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("create succeeds");

    world.clock.advance(TimeDelta::hours(1));
    let updated = world
        .service
        .update_identity(IdentityUpdate::from(created.clone()), &world.cancel)
        .await
        .expect("update succeeds");
    assert_eq!(updated, created);
}

#[rstest]
#[tokio::test]
async fn repeated_failed_logins_lock_the_account(world: World) {
    let created = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect("create succeeds");
    let threshold = world.service.policy().max_failed_login_attempts;
    let lockout = world.service.policy().lockout;

    let mut latest = created;
    for attempt in 1..=threshold {
        world.clock.advance(TimeDelta::minutes(1));
        latest = world
            .service
            .record_failed_login(
                RecordFailedLoginRequest::new("joao.silva", format!("bad password #{attempt}")),
                &world.cancel,
            )
            .await
            .expect("failure recorded");
    }

    let now = fixture_now() + TimeDelta::minutes(i64::from(threshold));
    assert_eq!(
        latest.credential.failed_login_attempts,
        i32::try_from(threshold).expect("small threshold")
    );
    assert_eq!(latest.credential.last_failed_login, Some(now));
    assert_eq!(
        latest.credential.last_failed_login_reason,
        format!("bad password #{threshold}")
    );
    assert_eq!(latest.credential.account_locked_until, Some(now + lockout));
}

#[rstest]
#[tokio::test]
async fn cancelled_callers_write_nothing(world: World) {
    world.cancel.cancel();
    let err = world
        .service
        .create_identity(valid_request(), &world.cancel)
        .await
        .expect_err("cancelled");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(world.stores.profiles.is_empty().await);
    assert!(world.stores.identities.is_empty().await);
}
