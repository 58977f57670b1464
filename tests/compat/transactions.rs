//! multi / exec / pipeline

use redshim::Reply;

use crate::common::*;

fn expected_session_replies() -> Vec<Reply> {
    vec![
        Reply::Nil,
        Reply::Ok,
        Reply::bulk("toto2"),
        Reply::Int(1),
        Reply::Int(1),
        Reply::bulk("a"),
    ]
}

#[test]
fn test_multi_exec() {
    let mut r = client();
    r.del("myKey").unwrap();
    assert!(r.multi().exec().unwrap().is_empty());

    let mut tx = r.multi();
    tx.get("myKey").unwrap();
    tx.set("myKey", "toto2").unwrap();
    tx.get("myKey").unwrap();
    tx.del("myKey").unwrap();
    tx.rpush("myKey", "a").unwrap();
    tx.rpop("myKey").unwrap();
    assert_eq!(tx.exec().unwrap(), expected_session_replies());
}

#[test]
fn test_pipeline() {
    let mut r = client();
    r.del("myKey").unwrap();
    assert!(r.pipeline().exec().unwrap().is_empty());

    let mut p = r.pipeline();
    p.get("myKey")
        .unwrap()
        .set("myKey", "toto2")
        .unwrap()
        .get("myKey")
        .unwrap()
        .del("myKey")
        .unwrap()
        .rpush("myKey", "a")
        .unwrap()
        .rpop("myKey")
        .unwrap();
    assert_eq!(p.exec().unwrap(), expected_session_replies());
}

#[test]
fn test_commands_take_effect_before_exec() {
    let mut r = client();
    {
        let mut tx = r.multi();
        tx.set("k", "v").unwrap().incr("n").unwrap();
        // Dropped without exec: the writes happened, the replies are gone
    }
    assert!(!r.is_buffering());
    assert_eq!(r.get("k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(r.get("n").unwrap(), Some(b"1".to_vec()));
    assert!(r.multi().exec().unwrap().is_empty());
}

#[test]
fn test_every_reply_shape() {
    let mut r = client();
    let mut tx = r.multi();
    tx.setnx("s", "x")
        .unwrap()
        .setnx("s", "y")
        .unwrap()
        .ttl("s")
        .unwrap()
        .set_timeout("s", 10)
        .unwrap()
        .ttl("s")
        .unwrap()
        .hset("h", "f", "v")
        .unwrap()
        .hgetall("h")
        .unwrap()
        .lrange("none", 0, -1)
        .unwrap()
        .flushdb()
        .unwrap();
    let replies = tx.exec().unwrap();
    assert_eq!(
        replies,
        vec![
            Reply::Bool(true),
            Reply::Bool(false),
            Reply::Int(-1),
            Reply::Bool(true),
            Reply::Int(10),
            Reply::Int(1),
            Reply::Map([(b"f".to_vec(), b"v".to_vec())].into_iter().collect()),
            Reply::Array(vec![]),
            Reply::Ok,
        ]
    );
}
