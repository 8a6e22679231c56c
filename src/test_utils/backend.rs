use std::net::SocketAddr;

use axum::Router;

/// Serve `router` on a free local port, playing the part of the report backend.
pub(crate) async fn spawn_fake_backend(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    address
}
