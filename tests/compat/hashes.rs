//! Hash commands, replayed against every hash strategy

use std::collections::BTreeMap;

use redshim::{HashBatch, TtlStatus};

use crate::common::*;

fn map(pairs: &[(&str, &str)]) -> BTreeMap<Vec<u8>, Vec<u8>> {
    pairs
        .iter()
        .map(|(f, v)| (f.as_bytes().to_vec(), v.as_bytes().to_vec()))
        .collect()
}

fn binary_blob() -> Vec<u8> {
    let mut blob = vec![0x78, 0x9c, 0x00, 0xff, 0xfe];
    blob.extend((0..4096u32).map(|i| (i * 7 % 251) as u8));
    blob
}

// ============================================================================
// Round trips through every layout
// ============================================================================

#[test]
fn test_text_value() {
    for (name, r) in clients_per_strategy() {
        r.del("myKey").unwrap();
        r.hset("myKey", "a", "b").unwrap();
        assert_eq!(r.hget("myKey", "a").unwrap(), Some(b"b".to_vec()), "{}", name);
        assert_eq!(r.hgetall("myKey").unwrap(), map(&[("a", "b")]), "{}", name);
        assert_eq!(r.hmget("myKey", &["a"]).unwrap(), vec![Some(b"b".to_vec())], "{}", name);
    }
}

#[test]
fn test_integer_value_reads_as_decimal() {
    for (name, r) in clients_per_strategy() {
        r.hset("myKey", "a", 42).unwrap();
        assert_eq!(r.hget("myKey", "a").unwrap(), Some(b"42".to_vec()), "{}", name);
        assert_eq!(r.hgetall("myKey").unwrap(), map(&[("a", "42")]), "{}", name);
        assert_eq!(r.hmget("myKey", &["a"]).unwrap(), vec![Some(b"42".to_vec())], "{}", name);
    }
}

#[test]
fn test_binary_value() {
    let blob = binary_blob();
    for (name, r) in clients_per_strategy() {
        r.hset("myKey", "a", blob.clone()).unwrap();
        assert_eq!(r.hget("myKey", "a").unwrap(), Some(blob.clone()), "{}", name);
        assert_eq!(r.hgetall("myKey").unwrap(), BTreeMap::from([(b"a".to_vec(), blob.clone())]), "{}", name);
        assert_eq!(r.hmget("myKey", &["a"]).unwrap(), vec![Some(blob.clone())], "{}", name);
    }
}

#[test]
fn test_hmset_then_partial_hdel() {
    for (name, r) in clients_per_strategy() {
        r.hmset("user", [("name", "Alice"), ("city", "Paris"), ("lang", "fr")])
            .unwrap();
        assert_eq!(r.hdel("user", "city").unwrap(), 1, "{}", name);
        assert_eq!(r.hdel("user", "city").unwrap(), 0, "{}", name);
        assert_eq!(
            r.hgetall("user").unwrap(),
            map(&[("lang", "fr"), ("name", "Alice")]),
            "{}",
            name
        );
        assert_eq!(
            r.hmget("user", &["name", "city"]).unwrap(),
            vec![Some(b"Alice".to_vec()), None],
            "{}",
            name
        );
    }
}

#[test]
fn test_del_then_recreate() {
    for (name, r) in clients_per_strategy() {
        r.hset("h", "old", "1").unwrap();
        assert_eq!(r.del("h").unwrap(), 1, "{}", name);
        assert_eq!(r.hget("h", "old").unwrap(), None, "{}", name);
        assert_eq!(r.hset("h", "new", "2").unwrap(), 1, "{}", name);
        assert_eq!(r.hgetall("h").unwrap(), map(&[("new", "2")]), "{}", name);
    }
}

// ============================================================================
// Counters and TTL
// ============================================================================

#[test]
fn test_hincrby_and_batch() {
    for (name, r) in clients_per_strategy() {
        assert_eq!(r.hincrby("stats", "hits", 3).unwrap(), 3, "{}", name);
        let batch = HashBatch::new().incr("hits", 2).incr("misses", 1).expire(600);
        assert_eq!(r.hbatch("stats", &batch).unwrap(), vec![5, 1], "{}", name);
        assert_eq!(r.ttl("stats").unwrap(), TtlStatus::Expires(600), "{}", name);
        assert_eq!(r.hget("stats", "hits").unwrap(), Some(b"5".to_vec()), "{}", name);
    }
}

#[test]
fn test_hincrby_on_field_set_as_text() {
    for (name, r) in clients_per_strategy() {
        r.hset("stats", "hits", "10").unwrap();
        assert_eq!(r.hincrby("stats", "hits", 1).unwrap(), 11, "{}", name);
        assert_eq!(r.hincrby_ex("stats", "hits", 4, 300).unwrap(), 15, "{}", name);
        assert_eq!(r.ttl("stats").unwrap(), TtlStatus::Expires(300), "{}", name);

        r.hset("stats", "label", "warm").unwrap();
        let err = r.hincrby("stats", "label", 1).unwrap_err();
        assert!(is_type_error(&err), "{}", name);
    }
}

#[test]
fn test_hash_default_ttl_and_expire() {
    for (name, r) in clients_per_strategy() {
        r.hset("h", "f", "v").unwrap();
        assert_eq!(r.ttl("h").unwrap(), TtlStatus::Expires(2_678_400), "{}", name);
        assert!(r.set_timeout("h", 30).unwrap(), "{}", name);
        assert_eq!(r.ttl("h").unwrap(), TtlStatus::Expires(30), "{}", name);
        assert!(r.set_timeout("h", 0).unwrap(), "{}", name);
        assert!(r.hgetall("h").unwrap().is_empty(), "{}", name);
    }
}

// ============================================================================
// Layout limits
// ============================================================================

#[test]
fn test_only_expanded_takes_any_field_name() {
    let long_field = "a-field-name-well-past-the-bin-name-limit";
    for (name, r) in clients_per_strategy() {
        let result = r.hset("h", long_field, "v");
        if name == "direct" {
            assert!(result.is_err(), "direct must reject long field names");
        } else {
            result.unwrap();
            assert_eq!(r.hget("h", long_field).unwrap(), Some(b"v".to_vec()), "{}", name);
        }
    }
}
