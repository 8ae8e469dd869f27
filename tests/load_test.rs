//! Concurrent traversal test for the pipeline.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads() {
    let pipeline = common::start_pipeline(None).await;

    let concurrency = 8;
    let requests_per_task = 5;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task_id in 0..concurrency {
        let client = client.clone();
        let url = pipeline.upload_url();
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for i in 0..requests_per_task {
                // Distinct sizes so mixed-up results would be visible.
                let (w, h) = (8 + task_id as u32, 8 + i as u32);
                let form = Form::new().part(
                    "image",
                    // Every request uses the same client file name.
                    Part::bytes(common::sample_jpeg(w, h))
                        .file_name("same.jpg")
                        .mime_str("image/jpeg")
                        .unwrap(),
                );

                let req_start = Instant::now();
                let res = client.post(&url).multipart(form).send().await.unwrap();
                assert_eq!(res.status(), StatusCode::OK);
                let body = res.bytes().await.unwrap();
                assert_eq!(common::assert_grayscale_jpeg(&body), (w, h));
                latencies.push(req_start.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies: Vec<Duration> = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    assert_eq!(all_latencies.len(), total_requests);

    let duration = start.elapsed();
    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p95 = all_latencies[(all_latencies.len() as f64 * 0.95) as usize];

    println!("\n--- Pipeline Load Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P95 Latency:    {:?}", p95);
    println!("-----------------------------\n");

    assert_eq!(common::stored_blobs(&pipeline.blob_dir), 0);
}
