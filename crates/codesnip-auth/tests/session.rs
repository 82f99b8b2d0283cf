use codesnip_auth::memory::MemoryAccounts;
use codesnip_auth::session::{
    Identity, SessionCell, SessionFactory, SessionProvider, SessionStatus, SignIn,
};

fn accounts() -> MemoryAccounts {
    MemoryAccounts::new().with_user("ada", "lovelace")
}

#[test]
fn cell_only_notifies_on_real_changes() {
    let cell = SessionCell::new(SessionStatus::Unknown);
    let mut watch = cell.subscribe();
    assert!(!watch.has_changed());

    cell.set(SessionStatus::Unknown);
    assert!(!watch.has_changed());

    cell.set(SessionStatus::Anonymous);
    assert!(watch.has_changed());
    assert_eq!(watch.mark_seen(), SessionStatus::Anonymous);
    assert!(!watch.has_changed());
}

#[tokio::test]
async fn changed_resolves_with_the_new_status() {
    let cell = SessionCell::new(SessionStatus::Anonymous);
    let mut watch = cell.subscribe();

    cell.set(SessionStatus::Authenticated(Identity::new("u1")));
    let status = watch.changed().await.unwrap();
    assert_eq!(status.identity().map(|i| i.user_id.as_str()), Some("u1"));
}

#[tokio::test]
async fn changed_ends_when_the_provider_is_gone() {
    let cell = SessionCell::new(SessionStatus::Anonymous);
    let mut watch = cell.subscribe();
    drop(cell);
    assert!(watch.changed().await.is_none());
}

#[tokio::test]
async fn sign_in_and_out_publish_status() {
    let session = accounts().open(None);
    assert_eq!(session.current(), SessionStatus::Anonymous);

    let mut watch = session.subscribe();
    let outcome = session.sign_in("ada", "lovelace").await.unwrap();
    let SignIn::Complete(identity) = outcome else {
        panic!("local accounts never ask for MFA");
    };
    assert_eq!(identity.user_id, "local-ada");
    assert!(watch.has_changed());
    assert_eq!(watch.mark_seen(), SessionStatus::Authenticated(identity));

    session.sign_out().await.unwrap();
    assert_eq!(watch.changed().await, Some(SessionStatus::Anonymous));
    assert!(session.remember_token().is_none());
}

#[tokio::test]
async fn wrong_password_leaves_session_anonymous() {
    let session = accounts().open(None);
    assert!(session.sign_in("ada", "babbage").await.is_err());
    assert!(session.sign_in("nobody", "lovelace").await.is_err());
    assert_eq!(session.current(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn remembered_session_is_unknown_until_restored() {
    let accounts = accounts();
    let first = accounts.open(None);
    first.sign_in("ada", "lovelace").await.unwrap();
    let token = first.remember_token().unwrap();

    let restored = accounts.open(Some(token));
    let mut watch = restored.subscribe();
    assert_eq!(watch.current(), SessionStatus::Unknown);

    let status = watch.changed().await.unwrap();
    assert_eq!(status.identity().map(Identity::display_name), Some("ada"));
}

#[tokio::test]
async fn bad_remembered_token_resolves_to_anonymous() {
    let session = accounts().open(Some("memory:ghost".to_string()));
    let mut watch = session.subscribe();
    assert_eq!(watch.changed().await, Some(SessionStatus::Anonymous));
}

#[tokio::test]
async fn made_up_token_for_a_real_user_is_refused() {
    let accounts = accounts();
    let session = accounts.open(Some("memory:ada".to_string()));
    let mut watch = session.subscribe();
    assert_eq!(watch.changed().await, Some(SessionStatus::Anonymous));
    assert!(session.remember_token().is_none());
}

#[tokio::test]
async fn sign_out_revokes_the_remember_token() {
    let accounts = accounts();
    let first = accounts.open(None);
    first.sign_in("ada", "lovelace").await.unwrap();
    let token = first.remember_token().unwrap();
    assert!(!token.contains("ada"));
    assert_eq!(accounts.live_tokens(), 1);

    first.sign_out().await.unwrap();
    assert_eq!(accounts.live_tokens(), 0);

    let replay = accounts.open(Some(token));
    let mut watch = replay.subscribe();
    assert_eq!(watch.changed().await, Some(SessionStatus::Anonymous));
}

#[tokio::test]
async fn each_sign_in_replaces_the_previous_token() {
    let accounts = accounts();
    let session = accounts.open(None);
    session.sign_in("ada", "lovelace").await.unwrap();
    let first = session.remember_token().unwrap();
    session.sign_in("ada", "lovelace").await.unwrap();
    let second = session.remember_token().unwrap();

    assert_ne!(first, second);
    assert_eq!(accounts.live_tokens(), 1);
}
