//! Scripted in-process servers for the client integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// One expected client line and the reply to write back.
pub type Step = (String, String);

pub fn step(expect: impl Into<String>, reply: impl Into<String>) -> Step {
    (expect.into(), reply.into())
}

/// POP3 server: greets, then expects each command line exactly.
pub fn pop3_server(script: Vec<Step>) -> (DuplexStream, JoinHandle<Vec<String>>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let handle = tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(server);
        let mut reader = BufReader::new(read);
        let mut seen = Vec::new();

        write.write_all(b"+OK POP3 ready\r\n").await.unwrap();
        for (expect, reply) in script {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end().to_string();
            assert_eq!(line, expect);
            seen.push(line);
            write.write_all(reply.as_bytes()).await.unwrap();
        }
        seen
    });
    (client, handle)
}

/// Multi-line POP3 reply carrying `message`, dot-stuffed and terminated.
pub fn retr_reply(message: &str) -> String {
    let mut reply = String::from("+OK message follows\r\n");
    for line in message.split("\r\n") {
        if line.starts_with('.') {
            reply.push('.');
        }
        reply.push_str(line);
        reply.push_str("\r\n");
    }
    reply.push_str(".\r\n");
    reply
}

/// SMTP server: greets, then expects each command by prefix. After `DATA`
/// the payload is collected (dot-unstuffed) and accepted.
///
/// Returns the command lines seen and the submitted payload.
pub fn smtp_server(script: Vec<Step>) -> (DuplexStream, JoinHandle<(Vec<String>, String)>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let handle = tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(server);
        let mut reader = BufReader::new(read);
        let mut seen = Vec::new();
        let mut payload = String::new();

        write.write_all(b"220 mx.example.com ESMTP\r\n").await.unwrap();
        for (expect, reply) in script {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end().to_string();
            assert!(line.starts_with(&expect), "expected {expect}, got {line}");
            let is_data = line == "DATA";
            seen.push(line);
            write.write_all(reply.as_bytes()).await.unwrap();

            if is_data {
                loop {
                    let mut data = String::new();
                    reader.read_line(&mut data).await.unwrap();
                    if data == ".\r\n" {
                        break;
                    }
                    payload.push_str(data.strip_prefix('.').unwrap_or(&data));
                }
                write.write_all(b"250 Queued\r\n").await.unwrap();
            }
        }
        (seen, payload)
    });
    (client, handle)
}
