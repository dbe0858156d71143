use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use quiz_gate::{
    ACCESS_TOKEN_KEY, CredentialStore, Decision, GateError, MemoryCredentialStore, Navigator,
    RedirectReason, RedirectTarget, Role, RouteTable, TokenDecoder, navigator::evaluate,
};
use serde_json::json;
use std::sync::Arc;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn token_for(role: &str) -> String {
    let claims = json!({
        "sub": { "id": 1, "role": role },
        "exp": Utc::now().timestamp() + 3600,
    });
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn navigator_with(store: Arc<MemoryCredentialStore>) -> Navigator {
    Navigator::new(
        Arc::new(RouteTable::quiz_master().unwrap()),
        Arc::new(TokenDecoder::new(TEST_JWT_SECRET)),
        store,
    )
}

// --- Store Tests ---

#[test]
fn test_memory_store_read_write_delete() {
    let store = MemoryCredentialStore::new();
    assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

    store.set(ACCESS_TOKEN_KEY, "abc".to_string());
    assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("abc"));

    store.set(ACCESS_TOKEN_KEY, "def".to_string());
    assert_eq!(store.remove(ACCESS_TOKEN_KEY).as_deref(), Some("def"));
    assert_eq!(store.remove(ACCESS_TOKEN_KEY), None);
}

#[test]
fn test_access_token_key_is_fixed() {
    assert_eq!(ACCESS_TOKEN_KEY, "accessToken");

    let store = MemoryCredentialStore::with_access_token("t");
    assert_eq!(store.get("accessToken").as_deref(), Some("t"));
}

// --- Navigator Tests ---

#[test]
fn test_allowed_navigation_keeps_requested_location() {
    let store = Arc::new(MemoryCredentialStore::with_access_token(token_for("admin")));
    let navigator = navigator_with(store.clone());

    let navigation = navigator.navigate("/admin/users").unwrap();

    assert_eq!(navigation.decision, Decision::Allow);
    assert_eq!(navigation.location, "/admin/users");
    assert!(store.get(ACCESS_TOKEN_KEY).is_some());
}

#[test]
fn test_logged_out_navigation_lands_on_login() {
    let navigator = navigator_with(Arc::new(MemoryCredentialStore::new()));

    let navigation = navigator.navigate("/scores").unwrap();

    assert_eq!(navigation.requested, "/scores");
    assert_eq!(navigation.location, "/login");
    assert_eq!(
        navigation.decision,
        Decision::redirect(RedirectTarget::Login, RedirectReason::Unauthenticated)
    );
}

#[test]
fn test_public_pages_need_no_login() {
    let navigator = navigator_with(Arc::new(MemoryCredentialStore::new()));

    for path in ["/", "/login", "/register"] {
        let navigation = navigator.navigate(path).unwrap();
        assert!(navigation.decision.is_allowed());
        assert_eq!(navigation.location, path);
    }
}

#[test]
fn test_invalid_credential_is_purged() {
    let store = Arc::new(MemoryCredentialStore::with_access_token("tampered.token.value"));
    let navigator = navigator_with(store.clone());

    let navigation = navigator.navigate("/dashboard").unwrap();

    assert_eq!(navigation.location, "/login");
    assert!(navigation.decision.purges_credential());
    assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

    // With the credential gone the next attempt is a plain unauthenticated redirect.
    let again = navigator.navigate("/dashboard").unwrap();
    assert_eq!(
        again.decision,
        Decision::redirect(RedirectTarget::Login, RedirectReason::Unauthenticated)
    );
}

#[test]
fn test_empty_stored_credential_counts_as_logged_out() {
    let store = Arc::new(MemoryCredentialStore::with_access_token(""));
    let navigator = navigator_with(store.clone());

    assert!(!navigator.is_logged_in());
    assert_eq!(navigator.current_claim(), None);

    let navigation = navigator.navigate("/dashboard").unwrap();
    assert_eq!(
        navigation.decision,
        Decision::redirect(RedirectTarget::Login, RedirectReason::Unauthenticated)
    );
    assert!(!navigation.decision.purges_credential());

    let table = RouteTable::quiz_master().unwrap();
    let decoder = TokenDecoder::new(TEST_JWT_SECRET);
    let evaluated = evaluate(&table, &decoder, "/admin/users", Some("")).unwrap();
    assert_eq!(
        evaluated.decision,
        Decision::redirect(RedirectTarget::Login, RedirectReason::Unauthenticated)
    );
}

#[test]
fn test_invalid_credential_survives_public_navigation() {
    let store = Arc::new(MemoryCredentialStore::with_access_token("tampered.token.value"));
    let navigator = navigator_with(store.clone());

    assert!(navigator.navigate("/").unwrap().decision.is_allowed());
    assert!(store.get(ACCESS_TOKEN_KEY).is_some());
}

#[test]
fn test_role_mismatch_redirects_to_role_dashboard() {
    let navigator = navigator_with(Arc::new(MemoryCredentialStore::new()));

    navigator.login(token_for("admin"));
    let navigation = navigator.navigate("/quiz/4").unwrap();
    assert_eq!(navigation.location, "/admin/dashboard");
    assert!(navigator.is_logged_in());

    navigator.login(token_for("user"));
    let navigation = navigator.navigate("/admin/quizzes/4/questions").unwrap();
    assert_eq!(navigation.location, "/dashboard");
    assert!(navigator.is_logged_in());
}

#[test]
fn test_unrecognized_role_is_purged() {
    let store = Arc::new(MemoryCredentialStore::new());
    let navigator = navigator_with(store.clone());

    navigator.login(token_for("guest"));
    let navigation = navigator.navigate("/dashboard").unwrap();

    assert_eq!(navigation.location, "/login");
    assert!(!navigator.is_logged_in());
}

#[test]
fn test_login_logout_and_current_claim() {
    let navigator = navigator_with(Arc::new(MemoryCredentialStore::new()));
    assert!(navigator.current_claim().is_none());

    navigator.login(token_for("user"));
    let claim = navigator.current_claim().unwrap();
    assert_eq!(claim.known_role(), Some(Role::User));
    assert_eq!(claim.user_id, Some(1));

    navigator.logout();
    assert!(!navigator.is_logged_in());
    assert!(navigator.current_claim().is_none());
}

#[test]
fn test_unknown_path_is_an_error() {
    let navigator = navigator_with(Arc::new(MemoryCredentialStore::new()));

    assert!(matches!(
        navigator.navigate("/missing"),
        Err(GateError::RouteNotFound(path)) if path == "/missing"
    ));
}

#[test]
fn test_evaluate_is_side_effect_free_and_idempotent() {
    let table = RouteTable::quiz_master().unwrap();
    let decoder = TokenDecoder::new(TEST_JWT_SECRET);

    let first = evaluate(&table, &decoder, "/admin/dashboard", Some("junk")).unwrap();
    let second = evaluate(&table, &decoder, "/admin/dashboard", Some("junk")).unwrap();

    assert_eq!(first, second);
    assert!(first.decision.purges_credential());
}
