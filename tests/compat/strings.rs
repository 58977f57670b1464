//! Strings, counters, TTL and flushdb

use std::thread::sleep;
use std::time::Duration;

use redshim::TtlStatus;

use crate::common::*;

// ============================================================================
// Get / Set
// ============================================================================

#[test]
fn test_get_set_del() {
    let r = client();
    r.del("myKey").unwrap();

    assert_eq!(r.get("myKey").unwrap(), None);
    r.set("myKey", "a").unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"a".to_vec()));
    r.set("myKey", 12).unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"12".to_vec()));
    r.set("myKey2", 13).unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"12".to_vec()));
    assert_eq!(r.get("myKey2").unwrap(), Some(b"13".to_vec()));

    assert_eq!(r.del("myKey").unwrap(), 1);
    assert_eq!(r.del("myKey").unwrap(), 0);
    assert_eq!(r.del("myKey2").unwrap(), 1);
    assert_eq!(r.get("myKey").unwrap(), None);
    assert_eq!(r.get("myKey2").unwrap(), None);
}

#[test]
fn test_get_set_binary() {
    let r = client();
    r.set("myKey", "toto\r\ntiti").unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"toto\r\ntiti".to_vec()));

    r.set("myKey", b"toto\x00\x01\x02tata").unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"toto\x00\x01\x02tata".to_vec()));

    // Looks like an escaped value but is plain client text
    r.set("myKey", "__64__aGVsbG8=").unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"__64__aGVsbG8=".to_vec()));
}

#[test]
fn test_big_values() {
    let r = client();
    let json: String = (0..20_000)
        .map(|i| format!("{{\"id\":{},\"tag\":\"t{}\"}},", i, i % 7))
        .collect();
    let compressed: Vec<u8> = json.bytes().map(|b| b.wrapping_mul(31) ^ 0x5a).collect();

    r.set("myKey", json.as_str()).unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(json.as_bytes().to_vec()));
    assert_eq!(r.del("myKey").unwrap(), 1);
    assert_eq!(r.rpush("myKey", json.as_str()).unwrap(), 1);
    assert_eq!(r.rpop("myKey").unwrap(), Some(json.as_bytes().to_vec()));

    r.set("myKey", compressed.clone()).unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(compressed.clone()));
    assert_eq!(r.del("myKey").unwrap(), 1);
    assert_eq!(r.rpush("myKey", compressed.clone()).unwrap(), 1);
    assert_eq!(r.rpop("myKey").unwrap(), Some(compressed));
}

#[test]
fn test_flushdb() {
    let r = client();
    r.set("myKey1", "a").unwrap();
    r.set("myKey2", "b").unwrap();
    r.hset("myHash", "f", "v").unwrap();
    assert!(r.flushdb().unwrap() >= 3);
    assert_eq!(r.get("myKey1").unwrap(), None);
    assert_eq!(r.get("myKey2").unwrap(), None);
    assert!(r.hgetall("myHash").unwrap().is_empty());
}

// ============================================================================
// Conditional writes
// ============================================================================

#[test]
fn test_setnx() {
    let r = client();
    assert!(r.setnx("myKey", "a").unwrap());
    assert!(!r.setnx("myKey", "b").unwrap());
    assert_eq!(r.get("myKey").unwrap(), Some(b"a".to_vec()));
}

#[test]
fn test_setnxex_expires() {
    let r = client();
    assert!(r.setnxex("myKey", 1, "a").unwrap());
    assert!(!r.setnxex("myKey", 1, "b").unwrap());
    assert_eq!(r.get("myKey").unwrap(), Some(b"a".to_vec()));
    sleep(Duration::from_millis(1_200));
    assert_eq!(r.get("myKey").unwrap(), None);
    assert!(r.setnxex("myKey", 1, "c").unwrap());
}

#[test]
fn test_zero_ttl_is_rejected() {
    let r = client();
    assert!(r.setex("myKey", 0, "a").is_err());
    assert!(r.setnxex("myKey", 0, "a").is_err());
    assert_eq!(r.get("myKey").unwrap(), None);
}

// ============================================================================
// TTL
// ============================================================================

#[test]
fn test_setex_ttl_countdown() {
    let r = client();
    r.setex("myKey", 2, "a").unwrap();
    assert_eq!(r.get("myKey").unwrap(), Some(b"a".to_vec()));
    assert_eq!(r.ttl("myKey").unwrap(), TtlStatus::Expires(2));
    sleep(Duration::from_secs(1));
    assert_eq!(r.ttl("myKey").unwrap(), TtlStatus::Expires(1));
    sleep(Duration::from_millis(1_200));
    assert_eq!(r.get("myKey").unwrap(), None);
    assert_eq!(r.ttl("myKey").unwrap(), TtlStatus::Missing);
}

#[test]
fn test_set_timeout_on_persistent_key() {
    let r = client();
    r.set("myKey", "a").unwrap();
    assert_eq!(r.ttl("myKey").unwrap(), TtlStatus::Persistent);
    assert!(r.set_timeout("myKey", 1).unwrap());
    assert_eq!(r.ttl("myKey").unwrap(), TtlStatus::Expires(1));
    sleep(Duration::from_millis(1_200));
    assert_eq!(r.get("myKey").unwrap(), None);
    assert!(!r.set_timeout("myKey", 1).unwrap());
}

#[test]
fn test_set_timeout_zero_deletes() {
    let r = client();
    r.set("myKey", "a").unwrap();
    assert!(r.set_timeout("myKey", 0).unwrap());
    assert_eq!(r.get("myKey").unwrap(), None);
}

#[test]
fn test_set_clears_ttl() {
    let r = client();
    r.setex("myKey", 100, "a").unwrap();
    r.set("myKey", "b").unwrap();
    assert_eq!(r.ttl("myKey").unwrap(), TtlStatus::Persistent);
}

// ============================================================================
// Counters
// ============================================================================

#[test]
fn test_counters() {
    let r = client();
    assert_eq!(r.incr("n").unwrap(), 1);
    assert_eq!(r.incrby("n", 10).unwrap(), 11);
    assert_eq!(r.decr("n").unwrap(), 10);
    assert_eq!(r.decrby("n", 15).unwrap(), -5);
    assert_eq!(r.get("n").unwrap(), Some(b"-5".to_vec()));
}

#[test]
fn test_incr_on_numeric_text_and_int() {
    let r = client();
    r.set("n", "41").unwrap();
    assert_eq!(r.incr("n").unwrap(), 42);
    r.set("m", 7).unwrap();
    assert_eq!(r.incrby("m", 3).unwrap(), 10);
}

#[test]
fn test_incr_on_text_or_list_fails() {
    let r = client();
    r.set("text", "abc").unwrap();
    assert!(is_type_error(&r.incr("text").unwrap_err()));
    assert_eq!(r.get("text").unwrap(), Some(b"abc".to_vec()));

    r.rpush("list", "a").unwrap();
    assert!(is_type_error(&r.incr("list").unwrap_err()));
    assert!(is_type_error(&r.get("list").unwrap_err()));
}

#[test]
fn test_incr_keeps_ttl() {
    let r = client();
    r.setex("n", 100, 1).unwrap();
    assert_eq!(r.incr("n").unwrap(), 2);
    assert_eq!(r.ttl("n").unwrap(), TtlStatus::Expires(100));
}
