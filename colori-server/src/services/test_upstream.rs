//! Local stand-in for remote APIs in client tests

use axum::Router;

/// Serve `app` on an ephemeral port and return its base URL
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test upstream");
    let addr = listener.local_addr().expect("test upstream address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test upstream");
    });
    format!("http://{}", addr)
}
