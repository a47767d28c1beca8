//! End-to-end chains built through the public API with real call-site
//! capture, and a code table loaded from `fixtures/codes/`.

use std::io;
use std::sync::Once;

use errchain_core::{
    codes, decode_err, new, wrap, Code, ErrorStack, RenderMode, ResultExt, Source,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

const CONFIGURATION_NOT_VALID: Code = Code(1000);
const CONFIGURATION_MISSING: Code = Code(1001);
const RELOAD_RACE: Code = Code(1002);

fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/codes");
    p.push(name);
    p
}

fn load_codes() {
    static LOAD: Once = Once::new();
    LOAD.call_once(|| {
        let table = std::fs::read_to_string(fixture_path("config-codes.json")).expect("fixture not found");
        let count = codes().load_json(&table).expect("invalid code table");
        assert_eq!(count, 3);
    });
}

fn load_config() -> Result<(), ErrorStack> {
    decode_config().map_err(|err| wrap(err, CONFIGURATION_NOT_VALID, "service configuration could not be loaded"))
}

fn decode_config() -> Result<(), ErrorStack> {
    read_config().map_err(|err| wrap(err, Code::INVALID_JSON, "could not decode configuration data"))
}

fn read_config() -> Result<(), ErrorStack> {
    let res: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::UnexpectedEof, "read: end of input"));
    res.from_err(Code::UNKNOWN)
}

// ─── Scenario ─────────────────────────────────────────────────────────────────

#[test]
fn config_chain_keeps_cause_and_top_code() {
    load_codes();
    let err = load_config().unwrap_err();

    assert_eq!(err.code(), CONFIGURATION_NOT_VALID);
    assert_eq!(err.root_cause().unwrap().to_string(), "read: end of input");
    assert_eq!(err.len(), 3);
    assert_eq!(err.to_string(), "Configuration not valid (code:1000)");
    assert_eq!(err.http_status(), 500);
    assert_eq!(err.detail(), "the configuration is invalid");
}

#[test]
fn frames_record_their_call_sites() {
    load_codes();
    let err = load_config().unwrap_err();
    let functions: Vec<String> = err.trace().iter().map(|l| l.function().to_owned()).collect();

    assert!(functions[2].contains("load_config"), "got {functions:?}");
    assert!(functions[1].contains("decode_config"), "got {functions:?}");
    assert!(functions[0].contains("read_config"), "got {functions:?}");
    // file and line only exist when the build carries line tables
    assert!(err.trace().iter().filter(|l| l.ok()).all(|l| l.file_name() == "scenario.rs"));
}

#[test]
fn caller_is_named_in_every_build_profile() {
    let err = new(Code(1), "located");
    let caller = err.caller().unwrap();
    assert!(caller.function().contains("caller_is_named_in_every_build_profile"), "got {caller}");
    assert!(err.render(RenderMode::Condensed).contains("caller_is_named_in_every_build_profile"));
}

#[test]
fn condensed_render_lists_frames_top_down() {
    load_codes();
    let out = load_config().unwrap_err().render(RenderMode::Condensed);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("#2 - caller: \""));
    assert!(lines[0].contains("load_config"));
    assert!(lines[0].ends_with(
        "error: \"service configuration could not be loaded\" detail: \"the configuration is invalid (code:1000)\""
    ));
    assert!(lines[1].ends_with("detail: \"could not decode configuration data (code:108)\""));
    assert!(lines[2].starts_with("#0 - "));
    assert!(lines[2].ends_with("error: \"read: end of input\" detail: \"read: end of input (code:1)\""));
}

#[test]
fn with_attaches_history_without_reclassifying() {
    load_codes();
    let err = load_config().unwrap_err();
    let before = err.len();
    let cleanup = new(Code::FATAL, "failed to release lock");

    let err = err.with(cleanup, "load_config returned an error");
    assert_eq!(err.len(), before + 2);
    assert_eq!(err.code(), CONFIGURATION_NOT_VALID);
    assert_eq!(err.to_string(), "Configuration not valid (code:1000)");
    assert_eq!(err.root_cause().unwrap().to_string(), "read: end of input");
}

#[test]
fn fixture_codes_fall_back_correctly() {
    load_codes();
    let missing = new(CONFIGURATION_MISSING, "no file at /etc/app.toml");
    assert_eq!(missing.http_status(), 404);
    // no internal text: detail is the frame's own message
    assert_eq!(missing.detail(), "no file at /etc/app.toml");

    let race = new(RELOAD_RACE, "reload aborted");
    assert_eq!(race.http_status(), 200);
    // no external text: user-facing text is the frame's own message
    assert_eq!(race.to_string(), "reload aborted (code:1002)");
    assert_eq!(race.detail(), "configuration reload raced with shutdown");
}

#[test]
fn decode_at_the_boundary() {
    load_codes();
    let err = load_config().unwrap_err();
    assert_eq!(
        decode_err(Some(&err)),
        (CONFIGURATION_NOT_VALID, "Configuration not valid (code:1000)".to_owned())
    );
    let foreign = io::Error::new(io::ErrorKind::Other, "raw");
    assert_eq!(decode_err(Some(&foreign)).0, Code::UNKNOWN);
    assert_eq!(decode_err(None).0, Code::SUCCESS);
}

#[test]
fn wrapping_nil_starts_a_chain() {
    let err = wrap(Source::Nil, Code(3000), "first");
    assert_eq!(err.len(), 1);
    assert!(!err.last().unwrap().backtrace().is_empty());
    let err = wrap(err, Code(3001), "second");
    assert_eq!(err.len(), 2);
    assert_eq!(err.root_cause().unwrap().to_string(), "first");
}
