//! Tests for the key registry service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockIdentityRepository;
use crate::domain::{DomainId, HostId, PublicKey, UserId};

const IDENTIFIER: &str = "alice@host1.example.com";

struct Hierarchy {
    domain: Domain,
    host: Host,
    user: User,
}

#[fixture]
fn hierarchy() -> Hierarchy {
    let domain = Domain {
        id: DomainId::random(),
        name: "example.com".to_owned(),
        comment: None,
    };
    let host = Host {
        id: HostId::random(),
        domain_id: domain.id,
        name: "host1".to_owned(),
        comment: None,
    };
    let user = User {
        id: UserId::random(),
        host_id: host.id,
        name: "alice".to_owned(),
        pub_key: key("KEY1"),
        comment: None,
    };
    Hierarchy { domain, host, user }
}

fn key(text: &str) -> PublicKey {
    PublicKey::new(text).expect("valid key")
}

fn make_service(repo: MockIdentityRepository) -> KeyRegistryService<MockIdentityRepository> {
    KeyRegistryService::new(Arc::new(repo))
}

fn expect_domain_and_host_created(repo: &mut MockIdentityRepository, hierarchy: &Hierarchy) {
    let domain = hierarchy.domain.clone();
    let host = hierarchy.host.clone();
    repo.expect_create_domain()
        .withf(|new_domain| new_domain.name == "example.com")
        .times(1)
        .return_once(move |_| Ok(domain));
    let domain_id = hierarchy.domain.id;
    repo.expect_create_host()
        .withf(move |new_host| new_host.domain_id == domain_id && new_host.name == "host1")
        .times(1)
        .return_once(move |_| Ok(host));
}

#[rstest]
#[tokio::test]
async fn creates_every_level_when_absent(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    expect_domain_and_host_created(&mut repo, &hierarchy);
    let host_id = hierarchy.host.id;
    let user = hierarchy.user.clone();
    repo.expect_create_user()
        .withf(move |new_user| {
            new_user.host_id == host_id
                && new_user.name == "alice"
                && new_user.pub_key.as_ref() == "KEY1"
                && new_user.comment.as_deref() == Some("laptop")
        })
        .times(1)
        .return_once(move |_| Ok(user));

    let registered = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new(IDENTIFIER, key("KEY1")).with_comment("laptop"))
        .await
        .expect("registration succeeds");

    assert_eq!(registered.outcome, RegistrationOutcome::Created);
    assert_eq!(registered.user, hierarchy.user);
}

#[rstest]
#[tokio::test]
async fn conflicts_on_domain_and_host_fall_back_to_scoped_fetch(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    let domain = hierarchy.domain.clone();
    let host = hierarchy.host.clone();
    let domain_id = hierarchy.domain.id;
    repo.expect_create_domain()
        .times(1)
        .return_once(|_| Err(IdentityPersistenceError::conflict("domains_name_key")));
    repo.expect_find_domain_by_name()
        .withf(|name| name == "example.com")
        .times(1)
        .return_once(move |_| Ok(Some(domain)));
    repo.expect_create_host()
        .times(1)
        .return_once(|_| Err(IdentityPersistenceError::conflict("hosts_domain_id_name_key")));
    repo.expect_find_host_by_domain_and_name()
        .withf(move |id, name| *id == domain_id && name == "host1")
        .times(1)
        .return_once(move |_, _| Ok(Some(host)));
    let user = User {
        name: "bob".to_owned(),
        ..hierarchy.user.clone()
    };
    repo.expect_create_user()
        .times(1)
        .return_once(move |_| Ok(user));

    let registered = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new("bob@host1.example.com", key("KEY3")))
        .await
        .expect("registration succeeds");

    assert_eq!(registered.outcome, RegistrationOutcome::Created);
    assert_eq!(registered.user.host_id, hierarchy.host.id);
}

#[rstest]
#[tokio::test]
async fn existing_user_without_update_is_rejected(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    expect_domain_and_host_created(&mut repo, &hierarchy);
    repo.expect_create_user()
        .times(1)
        .return_once(|_| Err(IdentityPersistenceError::conflict("users_host_id_name_key")));
    repo.expect_update_user_pub_key().never();

    let error = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new(IDENTIFIER, key("KEY2")))
        .await
        .expect_err("user exists");

    assert_eq!(
        error,
        RegistryError::UserExists {
            identifier: IDENTIFIER.to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn existing_user_with_update_replaces_key(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    expect_domain_and_host_created(&mut repo, &hierarchy);
    repo.expect_create_user()
        .times(1)
        .return_once(|_| Err(IdentityPersistenceError::conflict("users_host_id_name_key")));
    let existing = hierarchy.user.clone();
    let host_id = hierarchy.host.id;
    repo.expect_find_user_by_host_and_name()
        .withf(move |id, name| *id == host_id && name == "alice")
        .times(1)
        .return_once(move |_, _| Ok(Some(existing)));
    let user_id = hierarchy.user.id;
    let updated = User {
        pub_key: key("KEY2"),
        ..hierarchy.user.clone()
    };
    repo.expect_update_user_pub_key()
        .withf(move |id, pub_key| *id == user_id && pub_key.as_ref() == "KEY2")
        .times(1)
        .return_once(move |_, _| Ok(updated));

    let registered = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new(IDENTIFIER, key("KEY2")).with_allow_update(true))
        .await
        .expect("update succeeds");

    assert_eq!(registered.outcome, RegistrationOutcome::Updated);
    assert_eq!(registered.user.id, hierarchy.user.id);
    assert_eq!(registered.user.pub_key.as_ref(), "KEY2");
}

#[rstest]
#[tokio::test]
async fn malformed_identifier_never_touches_storage() {
    let repo = MockIdentityRepository::new();

    let error = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new("not-an-identifier", key("KEY1")))
        .await
        .expect_err("invalid identifier");

    assert!(matches!(error, RegistryError::InvalidIdentifier(_)));
}

#[rstest]
#[tokio::test]
async fn non_conflict_storage_errors_propagate() {
    let mut repo = MockIdentityRepository::new();
    repo.expect_create_domain()
        .times(1)
        .return_once(|_| Err(IdentityPersistenceError::connection("refused")));
    repo.expect_find_domain_by_name().never();

    let error = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new(IDENTIFIER, key("KEY1")))
        .await
        .expect_err("storage failure");

    assert_eq!(
        error,
        RegistryError::StorageFailure(IdentityPersistenceError::connection("refused"))
    );
}

#[rstest]
#[tokio::test]
async fn conflict_followed_by_missing_row_is_storage_failure() {
    let mut repo = MockIdentityRepository::new();
    repo.expect_create_domain()
        .times(1)
        .return_once(|_| Err(IdentityPersistenceError::conflict("domains_name_key")));
    repo.expect_find_domain_by_name()
        .times(1)
        .return_once(|_| Ok(None));

    let error = make_service(repo)
        .add_user_and_key(RegisterKeyRequest::new(IDENTIFIER, key("KEY1")))
        .await
        .expect_err("vanished domain");

    assert!(matches!(
        error,
        RegistryError::StorageFailure(IdentityPersistenceError::Query { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn fetch_key_resolves_through_scoped_lookups(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    let domain = hierarchy.domain.clone();
    let host = hierarchy.host.clone();
    let user = hierarchy.user.clone();
    let domain_id = hierarchy.domain.id;
    let host_id = hierarchy.host.id;
    repo.expect_find_domain_by_name()
        .times(1)
        .return_once(move |_| Ok(Some(domain)));
    repo.expect_find_host_by_domain_and_name()
        .withf(move |id, _| *id == domain_id)
        .times(1)
        .return_once(move |_, _| Ok(Some(host)));
    repo.expect_find_user_by_host_and_name()
        .withf(move |id, _| *id == host_id)
        .times(1)
        .return_once(move |_, _| Ok(Some(user)));

    let user = make_service(repo)
        .fetch_key(&format!("  {IDENTIFIER} "))
        .await
        .expect("user found");

    assert_eq!(user, hierarchy.user);
}

#[rstest]
#[tokio::test]
async fn fetch_key_reports_unknown_host(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    let domain = hierarchy.domain.clone();
    repo.expect_find_domain_by_name()
        .times(1)
        .return_once(move |_| Ok(Some(domain)));
    repo.expect_find_host_by_domain_and_name()
        .times(1)
        .return_once(|_, _| Ok(None));
    repo.expect_find_user_by_host_and_name().never();

    let error = make_service(repo)
        .fetch_key(IDENTIFIER)
        .await
        .expect_err("unknown identity");

    assert_eq!(
        error,
        RegistryError::UnknownIdentity {
            identifier: IDENTIFIER.to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn remove_user_deletes_resolved_user(hierarchy: Hierarchy) {
    let mut repo = MockIdentityRepository::new();
    let domain = hierarchy.domain.clone();
    let host = hierarchy.host.clone();
    let user = hierarchy.user.clone();
    let user_id = hierarchy.user.id;
    repo.expect_find_domain_by_name()
        .return_once(move |_| Ok(Some(domain)));
    repo.expect_find_host_by_domain_and_name()
        .return_once(move |_, _| Ok(Some(host)));
    repo.expect_find_user_by_host_and_name()
        .return_once(move |_, _| Ok(Some(user)));
    repo.expect_delete_user()
        .withf(move |id| *id == user_id)
        .times(1)
        .return_once(|_| Ok(true));
    repo.expect_delete_host().never();

    make_service(repo)
        .remove_user(IDENTIFIER)
        .await
        .expect("user removed");
}

#[rstest]
#[tokio::test]
async fn remove_user_reports_unknown_domain() {
    let mut repo = MockIdentityRepository::new();
    repo.expect_find_domain_by_name()
        .times(1)
        .return_once(|_| Ok(None));
    repo.expect_delete_user().never();

    let error = make_service(repo)
        .remove_user(IDENTIFIER)
        .await
        .expect_err("unknown identity");

    assert!(matches!(error, RegistryError::UnknownIdentity { .. }));
}
