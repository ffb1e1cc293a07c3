//! MailReceiver against a scripted POP3 server.

#![allow(clippy::unwrap_used)]

mod common;

use common::{pop3_server, retr_reply, step};
use mailbridge_core::codec::{Codec, TextTransform};
use mailbridge_core::negotiator::derive_table;
use mailbridge_core::{MailReceiver, ReceiveError, Security, ServerConfig};
use mailbridge_pop3::Pop3Stream;

fn config() -> ServerConfig {
    ServerConfig::new("pop.example.com", 110, Security::None)
        .with_credentials("alice@example.com", "secret")
}

fn login() -> Vec<common::Step> {
    vec![
        step("USER alice@example.com", "+OK\r\n"),
        step("PASS secret", "+OK maildrop locked\r\n"),
    ]
}

fn message(subject: &str, body: &str) -> String {
    format!(
        "From: Bob <bob@example.com>\r\n\
         To: alice@example.com\r\n\
         Subject: {subject}\r\n\
         Date: Wed, 3 Jan 2024 08:00:00 +0000\r\n\
         \r\n\
         {body}"
    )
}

#[tokio::test]
async fn lists_newest_first_up_to_max() {
    let mut script = login();
    script.extend([
        step("STAT", "+OK 5 5000\r\n"),
        step("RETR 5", retr_reply(&message("five", "5"))),
        step("RETR 4", retr_reply(&message("four", "4"))),
        step("RETR 3", retr_reply(&message("three", "3"))),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let listing = receiver
        .session(async |r| r.list_messages(Some(3), None).await)
        .await
        .unwrap();

    let indices: Vec<u32> = listing.messages.iter().map(|m| m.index).collect();
    assert_eq!(indices, [5, 4, 3]);
    assert_eq!(listing.messages[0].subject, "five");
    assert_eq!(listing.messages[0].from.name, "Bob");
    assert_eq!(listing.total, 5);
    assert_eq!(listing.requested, 3);
    assert_eq!(listing.skipped, 0);
    assert!(!receiver.is_connected());
    server.await.unwrap();
}

#[tokio::test]
async fn failed_messages_are_skipped() {
    let mut script = login();
    script.extend([
        step("STAT", "+OK 3 900\r\n"),
        step("RETR 3", retr_reply(&message("kept", "body"))),
        step("RETR 2", "-ERR message 2 unavailable\r\n"),
        step("RETR 1", retr_reply("no headers at all")),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let listing = receiver.list_messages(None, None).await.unwrap();
    receiver.disconnect().await;

    assert_eq!(listing.messages.len(), 1);
    assert_eq!(listing.messages[0].index, 3);
    assert_eq!(listing.skipped, 2);
    assert_eq!(listing.requested, 3);
    server.await.unwrap();
}

#[tokio::test]
async fn empty_mailbox_and_zero_max() {
    let mut script = login();
    script.extend([
        step("STAT", "+OK 0 0\r\n"),
        step("STAT", "+OK 2 100\r\n"),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    assert!(receiver.list_messages(Some(10), None).await.unwrap().messages.is_empty());
    let listing = receiver.list_messages(Some(0), None).await.unwrap();
    assert!(listing.messages.is_empty());
    assert_eq!(listing.total, 2);
    receiver.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn decode_hook_falls_back_to_original_body() {
    let codec = Codec::with_table(derive_table("shared"));
    let encoded = codec.encode("秘密 message");

    let mut script = login();
    script.extend([
        step("STAT", "+OK 2 400\r\n"),
        step("RETR 2", retr_reply(&message("encoded", &encoded))),
        step("RETR 1", retr_reply(&message("plain", "plain text"))),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let decoder = codec.decoder();
    let hook: &dyn TextTransform = &decoder;
    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let listing = receiver.list_messages(None, Some(hook)).await.unwrap();
    receiver.disconnect().await;

    assert_eq!(listing.messages[0].body, "秘密 message");
    assert_eq!(listing.messages[1].body, "plain text\r\n");
    server.await.unwrap();
}

#[tokio::test]
async fn count_delete_and_reset() {
    let mut script = login();
    script.extend([
        step("STAT", "+OK 2 320\r\n"),
        step("LIST", "+OK 2 messages\r\n1 120\r\n2 200\r\n.\r\n"),
        step("DELE 2", "+OK message 2 deleted\r\n"),
        step("DELE 2", "-ERR message 2 already deleted\r\n"),
        step("RSET", "+OK\r\n"),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    assert_eq!(receiver.message_count().await.unwrap(), 2);
    let sizes = receiver.message_sizes().await.unwrap();
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes[1].size, 200);

    receiver.delete_message(2).await.unwrap();
    let err = receiver.delete_message(2).await.unwrap_err();
    assert!(matches!(err, ReceiveError::Delete(_)));
    receiver.reset().await.unwrap();
    receiver.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn rejected_login_is_a_connection_error() {
    let (io, server) = pop3_server(vec![
        step("USER alice@example.com", "+OK\r\n"),
        step("PASS secret", "-ERR invalid password\r\n"),
    ]);

    let mut receiver = MailReceiver::new(config());
    let err = receiver
        .connect_with(Pop3Stream::from_io(io))
        .await
        .unwrap_err();
    assert!(matches!(err, ReceiveError::Connection(_)));
    assert!(err.to_string().contains("invalid password"));
    assert!(!receiver.is_connected());
    server.await.unwrap();
}

#[tokio::test]
async fn failed_stat_fails_the_listing() {
    let mut script = login();
    script.push(step("STAT", "-ERR maildrop busy\r\n"));
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let err = receiver.list_messages(None, None).await.unwrap_err();
    assert!(matches!(err, ReceiveError::Fetch(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn garbled_reply_skips_only_that_message() {
    let mut script = login();
    script.extend([
        step("STAT", "+OK 3 900\r\n"),
        step("RETR 3", retr_reply(&message("three", "3"))),
        step("RETR 2", "garbage status line\r\n"),
        step("RETR 1", retr_reply(&message("one", "1"))),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let listing = receiver.list_messages(None, None).await.unwrap();
    receiver.disconnect().await;

    let indices: Vec<u32> = listing.messages.iter().map(|m| m.index).collect();
    assert_eq!(indices, [3, 1]);
    assert_eq!(listing.skipped, 1);
    server.await.unwrap();
}

#[tokio::test]
async fn lost_connection_keeps_messages_already_fetched() {
    let mut script = login();
    script.extend([
        step("STAT", "+OK 4 1200\r\n"),
        step("RETR 4", retr_reply(&message("four", "4"))),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();

    // The script ends after RETR 4, so RETR 3 hits a closed connection.
    let listing = receiver.list_messages(None, None).await.unwrap();
    assert_eq!(listing.messages.len(), 1);
    assert_eq!(listing.messages[0].subject, "four");
    assert_eq!(listing.skipped, 3);
    assert_eq!(listing.requested, 4);
    assert!(!receiver.is_connected());

    server.await.unwrap();
    receiver.disconnect().await;
}

#[tokio::test]
async fn deeply_nested_message_does_not_abort_listing() {
    let mut nested = String::from("From: bob@example.com\r\nSubject: nested\r\n");
    for level in 0..5000 {
        nested.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=b{level}\r\n\r\n--b{level}\r\n"
        ));
    }
    nested.push_str("Content-Type: text/plain\r\n\r\nbottom");

    let mut script = login();
    script.extend([
        step("STAT", "+OK 2 300000\r\n"),
        step("RETR 2", retr_reply(&nested)),
        step("RETR 1", retr_reply(&message("after", "still here"))),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let listing = receiver.list_messages(None, None).await.unwrap();
    receiver.disconnect().await;

    assert_eq!(listing.messages.len(), 2);
    assert_eq!(listing.messages[0].subject, "nested");
    assert_eq!(listing.messages[0].body, "");
    assert_eq!(listing.messages[1].body, "still here\r\n");
    server.await.unwrap();
}

#[tokio::test]
async fn legacy_chinese_charsets_are_decoded() {
    let raw = "From: =?gb2312?B?1cXI/Q==?= <zhang@163.com>\r\n\
               To: alice@example.com\r\n\
               Subject: =?gb2312?B?xOO6ww==?=\r\n\
               \r\n\
               body";

    let mut script = login();
    script.extend([
        step("STAT", "+OK 1 200\r\n"),
        step("RETR 1", retr_reply(raw)),
        step("QUIT", "+OK bye\r\n"),
    ]);
    let (io, server) = pop3_server(script);

    let mut receiver = MailReceiver::new(config());
    receiver.connect_with(Pop3Stream::from_io(io)).await.unwrap();
    let listing = receiver.list_messages(None, None).await.unwrap();
    receiver.disconnect().await;

    assert_eq!(listing.messages[0].subject, "你好");
    assert_eq!(listing.messages[0].from.name, "张三");
    server.await.unwrap();
}

#[tokio::test]
async fn starttls_requires_advertised_stls() {
    let (io, server) = pop3_server(vec![step("CAPA", "+OK\r\nUSER\r\nTOP\r\n.\r\n")]);

    let config = ServerConfig::new("pop.example.com", 110, Security::StartTls)
        .with_credentials("alice@example.com", "secret");
    let mut receiver = MailReceiver::new(config);
    let err = receiver
        .connect_with(Pop3Stream::from_io(io))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReceiveError::Connection(mailbridge_pop3::Error::NotSupported(_))
    ));
    assert!(!receiver.is_connected());
    server.await.unwrap();
}
