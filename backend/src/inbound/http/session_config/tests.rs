//! Unit tests for session configuration parsing.

use std::collections::HashMap;
use std::io::Write as _;

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&vec![b'k'; len]).expect("write key");
    file
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

struct ReleaseEnv {
    _key: NamedTempFile,
    vars: HashMap<&'static str, String>,
}

impl ReleaseEnv {
    fn with(mut self, name: &'static str, value: &str) -> Self {
        self.vars.insert(name, value.to_owned());
        self
    }

    fn without(mut self, name: &'static str) -> Self {
        self.vars.remove(name);
        self
    }

    fn settings(&self, mode: BuildMode) -> Result<SessionSettings, SessionConfigError> {
        session_settings_from_env(&mock_env(self.vars.clone()), mode)
    }
}

#[fixture]
fn release_env() -> ReleaseEnv {
    let key = key_file(SESSION_KEY_MIN_LEN);
    let vars = HashMap::from([
        (KEY_FILE_ENV, key.path().to_string_lossy().into_owned()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);
    ReleaseEnv { _key: key, vars }
}

#[rstest]
fn release_valid_settings_succeed(release_env: ReleaseEnv) {
    let settings = release_env
        .settings(BuildMode::Release)
        .expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.fingerprint().len(), 16);
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_env: ReleaseEnv, #[case] name: &'static str) {
    let error = release_env
        .without(name)
        .settings(BuildMode::Release)
        .err()
        .expect("missing toggle fails");

    assert!(matches!(error, SessionConfigError::MissingEnv { name: missing } if missing == name));
}

#[rstest]
#[case("maybe")]
#[case("")]
fn release_rejects_malformed_cookie_secure(release_env: ReleaseEnv, #[case] value: &str) {
    let error = release_env
        .with(COOKIE_SECURE_ENV, value)
        .settings(BuildMode::Release)
        .err()
        .expect("malformed flag fails");

    assert!(matches!(
        error,
        SessionConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            ..
        }
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_env: ReleaseEnv) {
    let error = release_env
        .with(ALLOW_EPHEMERAL_ENV, "yes")
        .settings(BuildMode::Release)
        .err()
        .expect("ephemeral keys fail");

    assert!(matches!(error, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_insecure_same_site_none(release_env: ReleaseEnv) {
    let error = release_env
        .with(COOKIE_SECURE_ENV, "0")
        .with(SAMESITE_ENV, "None")
        .settings(BuildMode::Release)
        .err()
        .expect("insecure None fails");

    assert!(matches!(error, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_rejects_short_key(release_env: ReleaseEnv) {
    let short = key_file(32);
    let error = release_env
        .with(KEY_FILE_ENV, &short.path().to_string_lossy())
        .settings(BuildMode::Release)
        .err()
        .expect("short key fails");

    assert!(matches!(error, SessionConfigError::KeyTooShort { length: 32, .. }));
}

#[rstest]
fn release_rejects_unreadable_key(release_env: ReleaseEnv) {
    let error = release_env
        .with(KEY_FILE_ENV, "/nonexistent/session_key")
        .settings(BuildMode::Release)
        .err()
        .expect("missing key fails");

    assert!(matches!(error, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn debug_defaults_allow_ephemeral_key() {
    let settings = session_settings_from_env(&mock_env(HashMap::new()), BuildMode::Debug)
        .expect("debug defaults succeed");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("unexpected", SameSite::Lax)]
#[case("strict", SameSite::Strict)]
#[case("NONE", SameSite::None)]
fn debug_same_site_parsing(
    release_env: ReleaseEnv,
    #[case] value: &str,
    #[case] expected: SameSite,
) {
    let settings = release_env
        .with(SAMESITE_ENV, value)
        .settings(BuildMode::Debug)
        .expect("debug tolerates values");

    assert_eq!(settings.same_site, expected);
}

#[rstest]
fn debug_short_key_falls_back_to_temporary_key() {
    let short = key_file(8);
    let vars = HashMap::from([(KEY_FILE_ENV, short.path().to_string_lossy().into_owned())]);

    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug tolerates short keys");

    assert_eq!(settings.fingerprint().len(), 16);
}
