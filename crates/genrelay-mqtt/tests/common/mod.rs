//! Minimal in-process MQTT 3.1.1 broker for a single client session.

#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const REFERENCE_LINE: &str = r#"{"generator":{"runtime_hours":27.6,"battery_voltage":13.8,"last_exercise_date":"2026-02-03T15:08:00+00:00","last_updated":"2026-02-09T03:00:34-05:00"}}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// CONNACK accepted, PUBACK every QoS 1 publish.
    Ack,
    /// CONNACK accepted, never PUBACK.
    Silent,
    /// CONNACK with return code 5 (not authorized).
    RefuseAuth,
}

#[derive(Debug, Clone)]
pub struct SeenPublish {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
    pub pkid: u16,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub publishes: Vec<SeenPublish>,
    pub disconnected: bool,
}

/// Bind on an ephemeral port and serve exactly one connection.
pub async fn spawn(behavior: Behavior) -> (u16, JoinHandle<Session>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::timeout(Duration::from_secs(20), serve(stream, behavior))
            .await
            .expect("fake broker session hung")
    });
    (port, handle)
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn serve(mut stream: TcpStream, behavior: Behavior) -> Session {
    let mut session = Session::default();

    let (header, body) = read_packet(&mut stream).await.unwrap();
    assert_eq!(header >> 4, 1, "first packet must be CONNECT");
    parse_connect(&body, &mut session);

    if behavior == Behavior::RefuseAuth {
        stream.write_all(&[0x20, 0x02, 0x00, 0x05]).await.unwrap();
        return session;
    }
    stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();

    while let Some((header, body)) = read_packet(&mut stream).await {
        match header >> 4 {
            3 => {
                let qos = (header >> 1) & 0x03;
                let retain = header & 0x01 == 1;
                let mut idx = 0;
                let topic = read_str(&body, &mut idx);
                let mut pkid = 0;
                if qos > 0 {
                    pkid = u16::from_be_bytes([body[idx], body[idx + 1]]);
                    idx += 2;
                }
                session.publishes.push(SeenPublish {
                    topic,
                    payload: body[idx..].to_vec(),
                    qos,
                    retain,
                    pkid,
                });
                if qos == 1 && behavior == Behavior::Ack {
                    let [hi, lo] = pkid.to_be_bytes();
                    stream.write_all(&[0x40, 0x02, hi, lo]).await.unwrap();
                }
            }
            12 => stream.write_all(&[0xD0, 0x00]).await.unwrap(),
            14 => {
                session.disconnected = true;
                break;
            }
            other => panic!("unexpected packet type {other}"),
        }
    }
    session
}

async fn read_packet(stream: &mut TcpStream) -> Option<(u8, Vec<u8>)> {
    let header = stream.read_u8().await.ok()?;
    let mut len = 0usize;
    let mut multiplier = 1usize;
    loop {
        let byte = stream.read_u8().await.ok()?;
        len += (byte & 0x7f) as usize * multiplier;
        if byte & 0x80 == 0 {
            break;
        }
        multiplier *= 128;
    }
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await.ok()?;
    Some((header, body))
}

fn read_str(body: &[u8], idx: &mut usize) -> String {
    let len = u16::from_be_bytes([body[*idx], body[*idx + 1]]) as usize;
    let s = String::from_utf8(body[*idx + 2..*idx + 2 + len].to_vec()).unwrap();
    *idx += 2 + len;
    s
}

fn parse_connect(body: &[u8], session: &mut Session) {
    let mut idx = 0;
    let protocol = read_str(body, &mut idx);
    assert_eq!(protocol, "MQTT");
    let _level = body[idx];
    let flags = body[idx + 1];
    idx += 4; // level, flags, keep-alive
    session.client_id = read_str(body, &mut idx);
    if flags & 0x04 != 0 {
        read_str(body, &mut idx);
        read_str(body, &mut idx);
    }
    if flags & 0x80 != 0 {
        session.username = Some(read_str(body, &mut idx));
    }
    if flags & 0x40 != 0 {
        session.password = Some(read_str(body, &mut idx));
    }
}
