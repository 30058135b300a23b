//! Integration tests for the WebSocket connector.
//!
//! These spin up a real in-process WebSocket server and dial it with
//! [`WebSocketConnector`] to verify frames actually flow both ways and
//! that a server-side close surfaces as `Ok(None)`.

#[cfg(feature = "websocket")]
mod websocket {
    use feltwire_transport::{Connector, Socket, WebSocketConnector};
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    type ServerStream =
        tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a one-shot WebSocket server on an OS-assigned port and
    /// returns its port plus a handle resolving to the accepted stream.
    async fn spawn_server() -> (u16, tokio::task::JoinHandle<ServerStream>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let port = listener.local_addr().expect("should have addr").port();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            tokio_tungstenite::accept_async(stream)
                .await
                .expect("should upgrade")
        });

        (port, handle)
    }

    #[tokio::test]
    async fn test_connect_and_exchange_text_frames() {
        let (port, server) = spawn_server().await;

        let connector = WebSocketConnector::new("127.0.0.1", port);
        let mut socket = connector.connect().await.expect("should connect");
        let mut server_ws = server.await.expect("server task");

        assert!(socket.id().into_inner() > 0);

        // --- Client sends, server receives ---
        socket
            .send(r#"{"type":"heartbeat"}"#)
            .await
            .expect("send should succeed");

        let received = server_ws.next().await.unwrap().unwrap();
        assert_eq!(
            received.into_text().unwrap().as_str(),
            r#"{"type":"heartbeat"}"#
        );

        // --- Server sends, client receives ---
        server_ws
            .send(Message::text(
                r#"{"type":"connection_established","connectionId":"c1"}"#
                    .to_string(),
            ))
            .await
            .unwrap();

        let frame = socket
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have a frame");
        assert!(frame.contains("connection_established"));
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_server_close() {
        let (port, server) = spawn_server().await;

        let connector = WebSocketConnector::new("127.0.0.1", port);
        let mut socket = connector.connect().await.expect("should connect");
        let mut server_ws = server.await.expect("server task");

        server_ws.send(Message::Close(None)).await.unwrap();

        let result = socket.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on server close");
    }

    #[tokio::test]
    async fn test_each_dial_gets_a_fresh_socket_id() {
        let (port_a, server_a) = spawn_server().await;
        let (port_b, server_b) = spawn_server().await;

        let first = WebSocketConnector::new("127.0.0.1", port_a)
            .connect()
            .await
            .expect("should connect");
        let _stream_a = server_a.await.expect("server task");

        let second = WebSocketConnector::new("127.0.0.1", port_b)
            .connect()
            .await
            .expect("should connect");
        let _stream_b = server_b.await.expect("server task");

        assert_ne!(first.id(), second.id(), "socket ids are never reused");
    }

    #[tokio::test]
    async fn test_connect_refused_surfaces_error() {
        // Nothing is listening on this port (bound then dropped).
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let connector = WebSocketConnector::new("127.0.0.1", port);
        assert!(connector.connect().await.is_err());
    }
}
