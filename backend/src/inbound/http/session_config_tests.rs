//! Tests for session configuration parsing.

use std::collections::HashMap;
use std::io::Write;

use mockable::MockEnv;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

use super::*;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create key file");
    file.write_all(&vec![b'k'; len]).expect("write key file");
    file
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |name| vars.get(name).cloned());
    env
}

#[fixture]
fn release_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn release_vars(key: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path().to_string_lossy().into_owned()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release configuration should be rejected"),
        Err(error) => error,
    }
}

#[rstest]
fn release_accepts_complete_configuration(release_key: NamedTempFile) {
    let env = mock_env(release_vars(&release_key));
    let settings =
        session_settings_from_env(&env, BuildMode::Release).expect("valid release settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_key: NamedTempFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&release_key);
    vars.remove(missing);

    let error = release_error(vars);

    assert!(matches!(error, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(ALLOW_EPHEMERAL_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
fn release_rejects_malformed_toggles(
    release_key: NamedTempFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&release_key);
    vars.insert(name, value.to_owned());

    let error = release_error(vars);

    assert!(matches!(error, SessionConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
fn release_refuses_insecure_same_site_none(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::InsecureSameSiteNone
    ));
}

#[rstest]
fn release_refuses_ephemeral_keys(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = key_file(SESSION_KEY_MIN_LEN - 1);

    let error = release_error(release_vars(&short));

    assert!(matches!(
        error,
        SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_reports_unreadable_key_files(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(KEY_FILE_ENV, "/nonexistent/rewear/session_key".to_owned());

    assert!(matches!(release_error(vars), SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let mut vars = HashMap::new();
    vars.insert(KEY_FILE_ENV, "/nonexistent/rewear/session_key".to_owned());
    vars.insert(COOKIE_SECURE_ENV, "perhaps".to_owned());

    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug builds tolerate bad toggles");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_tolerates_short_key_files() {
    let short = key_file(8);
    let vars = HashMap::from([(KEY_FILE_ENV, short.path().to_string_lossy().into_owned())]);

    let result = session_settings_from_env(&mock_env(vars), BuildMode::Debug);

    assert!(result.is_ok());
}

#[rstest]
#[case("1", Some(true))]
#[case(" YES ", Some(true))]
#[case("n", Some(false))]
#[case("False", Some(false))]
#[case("2", None)]
fn parses_boolean_spellings(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}
