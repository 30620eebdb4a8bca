//! Scenarios that need an actually bound socket rather than an in-process
//! `tower::oneshot` call: a real PUT/HEAD/GET round trip over the network
//! stack, and the port-collision case from SPEC_FULL.md §8's literal
//! scenario list.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use flocons_core::service::LocalFileService;
use flocons_core::FileService;

fn free_addr() -> SocketAddr {
    // Binding port 0 and reading back the assigned port is the usual way
    // to grab an ephemeral port without racing another process for it.
    let listener = std::net::TcpListener::bind((IpAddr::from([127, 0, 0, 1]), 0)).unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn put_head_get_round_trip_over_a_real_socket() {
    let dir = tempfile::tempdir().unwrap();
    let service: Arc<dyn FileService> = Arc::new(LocalFileService::new("edge", dir.path()));
    let addr = free_addr();

    let server = tokio::spawn(flocons_httpd::serve(service, addr));
    // Give the listener a moment to come up before the first request.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let put = client.put(format!("{base}/hello.txt")).body("hi there").send().await.unwrap();
    assert_eq!(put.status(), reqwest::StatusCode::OK);

    let head = client.head(format!("{base}/hello.txt")).send().await.unwrap();
    assert_eq!(head.status(), reqwest::StatusCode::OK);
    assert_eq!(head.headers().get(reqwest::header::CONTENT_LENGTH).unwrap(), "8");

    let get = client.get(format!("{base}/hello.txt")).send().await.unwrap();
    assert_eq!(get.status(), reqwest::StatusCode::OK);
    assert_eq!(get.text().await.unwrap(), "hi there");

    server.abort();
}

#[tokio::test]
async fn binding_an_address_already_in_use_fails() {
    let dir = tempfile::tempdir().unwrap();
    let addr = free_addr();
    // Hold the port open independently of `serve`, which binds its own
    // listener -- the second bind attempt is the thing under test.
    let holder = std::net::TcpListener::bind(addr).unwrap();

    let service: Arc<dyn FileService> = Arc::new(LocalFileService::new("edge", dir.path()));
    let result = flocons_httpd::serve(service, addr).await;
    assert!(result.is_err());

    drop(holder);
}
