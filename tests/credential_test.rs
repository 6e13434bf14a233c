use chrono::TimeDelta;
use paycode::application::credential::{CREDENTIAL_SCHEME, CredentialTokenizer};
use paycode::error::CredentialError;
use paycode::infrastructure::clock::ManualClock;
use std::sync::Arc;

fn tokenizer(lifetime_minutes: u32) -> (CredentialTokenizer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let tokenizer = CredentialTokenizer::new("shared-secret", lifetime_minutes, clock.clone()).unwrap();
    (tokenizer, clock)
}

#[test]
fn test_round_trip_for_many_subjects() {
    let (tokenizer, _) = tokenizer(5);
    let long = "x".repeat(256);
    for subject in ["c1", "client@example.com", "a@@b", "客户-42", long.as_str()] {
        let credential = tokenizer.encode(subject).unwrap();
        assert!(credential.starts_with(CREDENTIAL_SCHEME));
        assert_eq!(tokenizer.decode(&credential).unwrap(), subject);
    }
}

#[test]
fn test_round_trip_keeps_multiline_subject() {
    let (tokenizer, _) = tokenizer(5);
    for subject in ["client\n42", "line one\r\nline two\n"] {
        let credential = tokenizer.encode(subject).unwrap();
        assert_eq!(tokenizer.decode(&credential).unwrap(), subject);
    }
}

#[test]
fn test_decode_is_not_single_use() {
    let (tokenizer, clock) = tokenizer(5);
    let credential = tokenizer.encode("c1").unwrap();
    for _ in 0..3 {
        clock.advance(TimeDelta::minutes(1));
        assert_eq!(tokenizer.decode(&credential).unwrap(), "c1");
    }
}

#[test]
fn test_expiry_honours_configured_lifetime() {
    let (tokenizer, clock) = tokenizer(10);
    let credential = tokenizer.encode("c1").unwrap();

    clock.advance(TimeDelta::minutes(9));
    assert!(tokenizer.decode(&credential).is_ok());

    clock.advance(TimeDelta::minutes(1));
    assert!(matches!(
        tokenizer.decode(&credential),
        Err(CredentialError::Expired { .. })
    ));
}

#[test]
fn test_credentials_from_another_key_are_malformed() {
    let (issuer, _) = tokenizer(5);
    let other = CredentialTokenizer::new("other-secret", 5, Arc::new(ManualClock::default())).unwrap();

    let credential = issuer.encode("c1").unwrap();
    assert!(matches!(
        other.decode(&credential),
        Err(CredentialError::Malformed(_))
    ));
}

#[test]
fn test_tampered_credentials_are_malformed() {
    let (tokenizer, _) = tokenizer(5);
    let credential = tokenizer.encode("c1").unwrap();

    let mut bytes = credential.into_bytes();
    let last = bytes.len() - 3;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    assert!(matches!(
        tokenizer.decode(&tampered),
        Err(CredentialError::Malformed(_))
    ));
    for garbage in ["", "paycode://", "https://example.com", "paycode://!!!"] {
        assert!(matches!(
            tokenizer.decode(garbage),
            Err(CredentialError::Malformed(_))
        ));
    }
}
