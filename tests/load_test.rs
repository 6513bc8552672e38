//! Concurrency tests: failing traces never disturb healthy ones.

use std::time::{Duration, Instant};

use hop_trace::HopChain;

mod common;

#[tokio::test]
async fn test_concurrent_traces() {
    let (c_addr, c_shutdown) = common::start_responder(common::responder_config("pod-c", "")).await;
    let (a_addr, a_shutdown) =
        common::start_responder(common::responder_config("pod-a", &c_addr.to_string())).await;

    let silent = common::start_silent_backend().await;
    let mut slow = common::responder_config("pod-slow", &silent.to_string());
    slow.downstream.call_timeout_ms = 300;
    slow.downstream.deadline_ms = 400;
    let (slow_addr, slow_shutdown) = common::start_responder(slow).await;

    let concurrency = 10;
    let requests_per_task = 20;
    let client = common::client();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{a_addr}/");
        tasks.push(tokio::spawn(async move {
            let mut ok = 0;
            for _ in 0..requests_per_task {
                let res = client.get(&url).send().await.unwrap();
                assert_eq!(res.status(), 200);
                let chain: HopChain = res.json().await.unwrap();
                assert_eq!(chain.len(), 2);
                ok += 1;
            }
            ok
        }));
    }

    let mut slow_tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{slow_addr}/");
        slow_tasks.push(tokio::spawn(async move {
            client.get(&url).send().await.unwrap().status()
        }));
    }

    let mut total = 0;
    for task in tasks {
        total += task.await.unwrap();
    }
    for task in slow_tasks {
        assert_eq!(task.await.unwrap(), 502);
    }

    assert_eq!(total, concurrency * requests_per_task);
    println!(
        "{} traces in {:?}",
        total,
        start.elapsed()
    );
    assert!(start.elapsed() < Duration::from_secs(30));

    a_shutdown.trigger();
    c_shutdown.trigger();
    slow_shutdown.trigger();
}
