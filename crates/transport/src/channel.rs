// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete transport channels. Each owns at most one bound socket (or, for
//! stdio, none at all) and exposes the minimal start/stop surface the
//! manager drives; serving the agent wire protocol over the socket is the
//! concern of the adapter that registers agents, not of this crate.

use async_trait::async_trait;
use parking_lot::Mutex;
use rdd_core::{CoreError, ErrorKind, Result};
use rdd_core::model::TransportKind;
use tokio::net::TcpListener;

#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Binds the given port, holding the listener open for the lifetime of
    /// the transport. A transport that needs no port (stdio) ignores the
    /// argument and always succeeds.
    async fn bind(&self, port: u16) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    fn endpoint_url(&self, host: &str, port: Option<u16>) -> String;
}

fn bind_error(kind: TransportKind, port: u16, source: std::io::Error) -> CoreError {
    CoreError::with_source(ErrorKind::PortUnavailable, format!("{kind} transport failed to bind port {port}"), Box::new(source))
}

pub struct StdioTransport;

#[async_trait]
impl Transport for StdioTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    async fn bind(&self, _port: u16) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn endpoint_url(&self, _host: &str, _port: Option<u16>) -> String {
        "stdio://mcp-server".to_string()
    }
}

macro_rules! socket_transport {
    ($name:ident, $kind:expr, $url:expr) => {
        #[derive(Default)]
        pub struct $name {
            listener: Mutex<Option<TcpListener>>,
        }

        #[async_trait]
        impl Transport for $name {
            fn kind(&self) -> TransportKind {
                $kind
            }

            async fn bind(&self, port: u16) -> Result<()> {
                let listener = TcpListener::bind(("0.0.0.0", port)).await.map_err(|e| bind_error($kind, port, e))?;
                *self.listener.lock() = Some(listener);
                Ok(())
            }

            async fn stop(&self) -> Result<()> {
                *self.listener.lock() = None;
                Ok(())
            }

            fn endpoint_url(&self, host: &str, port: Option<u16>) -> String {
                let port = port.unwrap_or_default();
                ($url)(host, port)
            }
        }
    };
}

socket_transport!(WebSocketTransport, TransportKind::WebSocket, |host, port| format!("ws://{host}:{port}/agent-ws"));
socket_transport!(HttpTransport, TransportKind::Http, |host, port| format!("http://{host}:{port}"));
socket_transport!(SseTransport, TransportKind::Sse, |host, port| format!("http://{host}:{port}/events"));
