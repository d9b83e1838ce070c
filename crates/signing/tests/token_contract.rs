use std::sync::Arc;
use std::thread;

use error_stack::Report;
use mapletree_signing::{codec, HashAlgorithm, Signing, SigningError};
use serde_json::{json, Value};

fn signing(key: &str) -> Signing {
    Signing::new(key).expect("should build signing context")
}

fn assert_invalid(result: Result<Value, Report<SigningError>>) {
    let report = result.expect_err("should reject token");
    assert_eq!(
        report.current_context(),
        &SigningError::InvalidSignedMessage
    );
}

fn sample_payloads() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(0),
        json!(-42),
        json!(3.25),
        json!(""),
        json!("plain"),
        json!("dots.in.the.body."),
        json!("unicode: ñ 日本 🍁"),
        json!([]),
        json!({}),
        json!([1, "two", 3.5, null, false]),
        json!({"a": 1}),
        json!({"user": {"id": 7, "roles": ["admin", "editor"]}, "next": "/dashboard?x=1&y=2"}),
        json!({"z": 1, "a": 2, "m": [{"k": "v"}]}),
    ]
}

#[test]
fn round_trip() {
    let signing = signing("round-trip-key");
    for data in sample_payloads() {
        let token = signing.sign(&data).expect("should sign");
        let decoded: Value = signing.unsign(&token).expect("should verify");
        assert_eq!(decoded, data);
    }
}

#[test]
fn round_trip_every_algorithm() {
    for algorithm in [
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ] {
        let signing = Signing::with_hash_algorithm("key", algorithm)
            .expect("should build signing context");
        let data = json!({"algorithm": algorithm.name()});

        let token = signing.sign(&data).expect("should sign");
        let message = codec::decode(&token).expect("should decode");
        let (_, signature) = message.rsplit_once('.').expect("should have separator");
        assert_eq!(signature.len(), algorithm.signature_len());

        let decoded: Value = signing.unsign(&token).expect("should verify");
        assert_eq!(decoded, data);
    }
}

#[test]
fn tokens_are_url_safe() {
    let signing = signing("url-key");
    for data in sample_payloads() {
        let token = signing.sign(&data).expect("should sign");
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "token {token} should only use the URL-safe alphabet"
        );
    }
}

#[test]
fn tamper_detection() {
    let signing = signing("tamper-key");
    let token = signing
        .sign(&json!({"user": "ana", "admin": false}))
        .expect("should sign");

    for (index, original) in token.char_indices() {
        let replacement = if original == 'A' { 'B' } else { 'A' };
        let mut tampered = token.clone();
        tampered.replace_range(index..=index, &replacement.to_string());

        assert_invalid(signing.unsign(&tampered));
    }
}

#[test]
fn wrong_key_rejection() {
    let alice = signing("alice-key");
    let mallory = signing("mallory-key");

    for data in sample_payloads() {
        let token = alice.sign(&data).expect("should sign");
        assert_invalid(mallory.unsign(&token));
    }
}

#[test]
fn determinism() {
    let signing = signing("deterministic-key");
    for data in sample_payloads() {
        let first = signing.sign(&data).expect("should sign");
        let second = signing.sign(&data).expect("should sign");
        assert_eq!(first, second);
    }
}

#[test]
fn malformed_input_handling() {
    let signing = signing("k");
    let token = signing.sign(&json!({"a": 1})).expect("should sign");

    assert_invalid(signing.unsign(""));
    assert_invalid(signing.unsign("not-base64!!!"));
    assert_invalid(signing.unsign(&format!("{token}x")));
    assert_invalid(signing.unsign(&token[..token.len() - 1]));
    assert_invalid(signing.unsign(&codec::encode(".")));
    assert_invalid(signing.unsign(&codec::encode("{\"a\":1}")));
}

#[test]
fn concrete_example() {
    let signing = signing("k");
    let token = signing.sign(&json!({"a": 1})).expect("should sign");
    assert_eq!(
        token,
        "eyJhIjoxfS5jM2E5MmZmOWUyNzRjZGNjZTI3YTU4YzE1YTc4ZWM2ZGNiYmRiZDAwMzhhODdlN2ExMWJhZWYyMDI4ZmQ4YmZm"
    );

    let data: Value = signing.unsign(&token).expect("should verify");
    assert_eq!(data, json!({"a": 1}));
}

#[test]
fn reference_tokens_are_reproduced() {
    // Produced by an independent implementation of the same token format.
    let cases = [
        (
            "k",
            HashAlgorithm::Sha512,
            json!({"a": 1}),
            "eyJhIjoxfS5mNTI3NDIyNjg2NTU1YjY1MjhhMmU3ZjdlYzgyYjJmNTQ1MmIwMDMwM2JiMjg2Zjg3NGUwNzViYTc3ODk3NGE2ZDgxYWRmZmY1MjM2NDJmYzczYjY5NjBmNzU5YjkyYTNiYWQxMzhiZTExMGJmNTkyMjNlNzlmZDFiNWM2ODI1ZA",
        ),
        (
            "secret",
            HashAlgorithm::Sha256,
            json!({"name": "café", "n": [1, 2.5, null, true]}),
            "eyJuYW1lIjoiY2FmXHUwMGU5IiwibiI6WzEsMi41LG51bGwsdHJ1ZV19LjM3YzZiYWY1MjlmYTEzNTRkNzI2MDBlYjljN2ZlYTA1MzRkOWM5YjA4ZDVkMWU3NGZlNmM4NzNjOWYyODE0YzY",
        ),
        (
            "k",
            HashAlgorithm::Sha256,
            json!({"b": 1, "a": 2}),
            "eyJiIjoxLCJhIjoyfS5lYjY3NGVkNjk3ZTcwNDUwZjZjNjg2MWI4ZWE5ZTU0ZjRlZDc4YTg4NThmMjE5NDk3Y2I4M2YxYjczNzM0YzVl",
        ),
    ];

    for (key, algorithm, data, expected) in cases {
        let signing =
            Signing::with_hash_algorithm(key, algorithm).expect("should build signing context");
        assert_eq!(signing.sign(&data).expect("should sign"), expected);

        let decoded: Value = signing.unsign(expected).expect("should verify");
        assert_eq!(decoded, data);
    }
}

#[test]
fn codec_round_trip() {
    for text in ["", "a", "ab", "abc", "abcd", "a.b", "ü", "🍁🍁", "\u{0}\u{1f}\u{7f}"] {
        assert_eq!(codec::decode(&codec::encode(text)).expect("should decode"), text);
    }
}

#[test]
fn shared_across_threads() {
    let signing = Arc::new(signing("shared-key"));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let signing = Arc::clone(&signing);
            thread::spawn(move || {
                for i in 0..32 {
                    let data = json!({"worker": worker, "i": i});
                    let token = signing.sign(&data).expect("should sign");
                    let decoded: Value = signing.unsign(&token).expect("should verify");
                    assert_eq!(decoded, data);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker should not panic");
    }
}

#[test]
fn independent_contexts_coexist() {
    let first = signing("first");
    let second = signing("second");
    let data = json!({"same": "payload"});

    let first_token = first.sign(&data).expect("should sign");
    let second_token = second.sign(&data).expect("should sign");
    assert_ne!(first_token, second_token);

    assert_eq!(first.unsign::<Value>(&first_token).expect("should verify"), data);
    assert_eq!(second.unsign::<Value>(&second_token).expect("should verify"), data);
}

#[test]
fn non_finite_floats_are_not_signed() {
    let signing = signing("float-key");
    for data in [vec![f64::NAN, 1.0], vec![f64::INFINITY], vec![f64::NEG_INFINITY]] {
        let report = signing
            .sign(&data)
            .expect_err("should refuse a value JSON cannot carry");
        assert!(matches!(
            report.current_context(),
            SigningError::Serialization { .. }
        ));
    }
}
