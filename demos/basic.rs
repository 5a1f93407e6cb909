use std::time::Duration;

use retryable_http::{Body, CancellationToken, Headers, Request};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("DEMO_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());
    let cancel = CancellationToken::new();
    let headers = Headers::new()
        .with("X-Request-Id", "demo-1")
        .with("X-Tags", ["alpha", "beta"]);

    let fetched = Request::get(format!("{base}/get"))
        .with_retry(true)
        .perform(&cancel, &headers, Body::Empty, None)
        .await;
    println!(
        "GET -> {:?} after {} attempt(s)",
        fetched.status(),
        fetched.attempts
    );

    let payload = json!({ "name": "Kit", "qty": 2 });
    let (head, body) = Request::post(format!("{base}/post"))
        .perform(
            &cancel,
            &headers,
            Body::value(&payload),
            Some(Duration::from_secs(5)),
        )
        .await
        .into_result()?;
    println!("POST -> {} ({} bytes)", head.status, body.len());

    Ok(())
}
