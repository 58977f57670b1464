//! Push, pop, range and trim sequences

use redshim::Client;

use crate::common::*;

fn strs(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|s| s.as_bytes().to_vec()).collect()
}

fn push_all(r: &Client, items: &[&str]) {
    for (i, item) in items.iter().enumerate() {
        assert_eq!(r.rpush("myKey", *item).unwrap(), i as i64 + 1);
    }
}

fn pop(r: &Client, left: bool) -> Option<String> {
    let popped = if left { r.lpop("myKey") } else { r.rpop("myKey") };
    popped
        .unwrap()
        .map(|bytes| String::from_utf8(bytes).unwrap())
}

// ============================================================================
// Push / Pop
// ============================================================================

#[test]
fn test_push_pop_sequence() {
    let r = client();
    assert_eq!(pop(&r, false), None);
    assert_eq!(pop(&r, true), None);
    assert_eq!(r.lsize("myKey").unwrap(), 0);

    push_all(&r, &["a", "b", "c"]);
    assert_eq!(r.rpush("myKey", 12).unwrap(), 4);
    assert_eq!(r.lsize("myKey").unwrap(), 4);
    assert_eq!(pop(&r, false).as_deref(), Some("12"));
    assert_eq!(r.lsize("myKey").unwrap(), 3);
    assert_eq!(r.rpush("myKey", "e").unwrap(), 4);
    assert_eq!(pop(&r, false).as_deref(), Some("e"));
    assert_eq!(pop(&r, true).as_deref(), Some("a"));
    assert_eq!(r.lsize("myKey").unwrap(), 2);
    assert_eq!(pop(&r, false).as_deref(), Some("c"));
    assert_eq!(r.lsize("myKey").unwrap(), 1);
    assert_eq!(r.lpush("myKey", "z").unwrap(), 2);
    assert_eq!(pop(&r, false).as_deref(), Some("b"));
    assert_eq!(pop(&r, false).as_deref(), Some("z"));
    assert_eq!(r.lsize("myKey").unwrap(), 0);
    assert_eq!(pop(&r, false), None);
}

#[test]
fn test_duplicate_elements() {
    let r = client();
    r.rpush("myKey", 1).unwrap();
    r.rpush("myKey", 1).unwrap();
    assert_eq!(pop(&r, false).as_deref(), Some("1"));
    assert_eq!(pop(&r, false).as_deref(), Some("1"));
}

// ============================================================================
// Range / Trim
// ============================================================================

#[test]
fn test_single_element_windows() {
    let r = client();
    assert!(r.lrange("myKey", 0, 0).unwrap().is_empty());
    push_all(&r, &["a"]);
    for (start, end) in [(0, 0), (0, -1), (-1, -1), (-1, 0)] {
        assert_eq!(r.lrange("myKey", start, end).unwrap(), strs(&["a"]));
        r.ltrim("myKey", start, end).unwrap();
        assert_eq!(r.lsize("myKey").unwrap(), 1, "ltrim({}, {})", start, end);
    }

    assert_eq!(r.rpush("myKey", "b").unwrap(), 2);
    assert_eq!(r.rpush("myKey", "c").unwrap(), 3);
    assert_eq!(r.lrange("myKey", 0, 12).unwrap(), strs(&["a", "b", "c"]));
    r.ltrim("myKey", 0, 12).unwrap();
    assert_eq!(r.lsize("myKey").unwrap(), 3);
    assert_eq!(r.lrange("myKey", 2, 2).unwrap(), strs(&["c"]));
    r.ltrim("myKey", 2, 2).unwrap();
    assert_eq!(pop(&r, false).as_deref(), Some("c"));
    assert_eq!(r.lsize("myKey").unwrap(), 0);
    assert!(r.lrange("myKey", 2, 2).unwrap().is_empty());
}

#[test]
fn test_trim_drops_tail() {
    let r = client();
    push_all(&r, &["a", "b", "c"]);
    assert_eq!(r.lrange("myKey", 0, -2).unwrap(), strs(&["a", "b"]));
    r.ltrim("myKey", 0, -2).unwrap();
    assert_eq!(r.lsize("myKey").unwrap(), 2);
    assert_eq!(pop(&r, false).as_deref(), Some("b"));
    assert_eq!(pop(&r, false).as_deref(), Some("a"));
}

#[test]
fn test_trim_middle_window() {
    let r = client();
    push_all(&r, &["a", "b", "c", "d", "e", "f"]);
    assert_eq!(r.lrange("myKey", -2, 8).unwrap(), strs(&["e", "f"]));
    assert_eq!(
        r.lrange("myKey", 0, 18).unwrap(),
        strs(&["a", "b", "c", "d", "e", "f"])
    );
    assert_eq!(r.lrange("myKey", 2, 4).unwrap(), strs(&["c", "d", "e"]));
    r.ltrim("myKey", 2, 4).unwrap();
    assert_eq!(r.lsize("myKey").unwrap(), 3);
    assert_eq!(pop(&r, true).as_deref(), Some("c"));
    assert_eq!(pop(&r, true).as_deref(), Some("d"));
    assert_eq!(pop(&r, true).as_deref(), Some("e"));
}

#[test]
fn test_negative_windows() {
    let r = client();
    push_all(&r, &["a", "b", "c"]);
    assert_eq!(r.lrange("myKey", -3, 0).unwrap(), strs(&["a"]));
    r.ltrim("myKey", -3, 0).unwrap();
    assert_eq!(r.lsize("myKey").unwrap(), 1);
    assert_eq!(pop(&r, true).as_deref(), Some("a"));

    push_all(&r, &["a", "b", "c"]);
    assert_eq!(r.lrange("myKey", -3, -2).unwrap(), strs(&["a", "b"]));
    r.ltrim("myKey", -3, -2).unwrap();
    assert_eq!(r.lsize("myKey").unwrap(), 2);
    assert_eq!(pop(&r, true).as_deref(), Some("a"));
    assert_eq!(pop(&r, true).as_deref(), Some("b"));
}

#[test]
fn test_inverted_window_empties_list() {
    let r = client();
    push_all(&r, &["a", "b", "c"]);
    assert!(r.lrange("myKey", -2, -3).unwrap().is_empty());
    r.ltrim("myKey", -2, -3).unwrap();
    assert_eq!(r.lsize("myKey").unwrap(), 0);
    assert!(r.lrange("myKey", 0, 200).unwrap().is_empty());
    assert_eq!(r.del("myKey").unwrap(), 0);
}

#[test]
fn test_list_commands_on_string_fail() {
    let r = client();
    r.set("myKey", "a").unwrap();
    assert!(is_type_error(&r.rpush("myKey", "b").unwrap_err()));
    assert!(is_type_error(&r.lrange("myKey", 0, -1).unwrap_err()));
    assert_eq!(r.get("myKey").unwrap(), Some(b"a".to_vec()));
}
