//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use route_dispatch::dispatch::{ChainMember, DispatchChain, FnMember, RequestContext, Stage};
use route_dispatch::http::Response;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Ordered record of which members or handlers ran.
#[derive(Clone, Default)]
pub struct Trail(Arc<Mutex<Vec<String>>>);

impl Trail {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A content member that records its name and optionally continues the chain.
pub fn recorder(name: &str, calls_next: bool, trail: &Trail) -> Arc<dyn ChainMember> {
    let trail = trail.clone();
    let label = name.to_string();
    Arc::new(FnMember::new(
        name,
        Stage::Content,
        move |ctx: &mut RequestContext, response: &mut Response, chain: &DispatchChain| {
            trail.push(label.clone());
            if calls_next {
                chain.next(ctx, response)?;
            }
            Ok(())
        },
    ))
}

/// Read a whole axum response body as UTF-8.
pub async fn body_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Send a raw HTTP/1.1 request and return the full raw response.
pub async fn send_raw(addr: SocketAddr, method: &str, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
        method, path, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}
