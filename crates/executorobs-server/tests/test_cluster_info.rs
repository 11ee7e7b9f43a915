use anyhow::Result;
use axum::extract::Request;
use axum::http::StatusCode;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use executorobs::{LifecycleObserver, RequestContext, UnitId, WorkUnit, WorkUnitInfo};
use executorobs_server::server::config::Config;
use executorobs_server::server::interceptor::{
    InboundInterceptor, LoggingInterceptor, Verdict, REQUEST_ID_HEADER,
};
use executorobs_server::server::{init_router, ServerState};

const CLUSTER_INFO_PATH: &str = "/api/cluster/info";

async fn spawn_server(
    config: Config,
    interceptor: Arc<dyn InboundInterceptor>,
) -> Result<(SocketAddr, Arc<ServerState>)> {
    serve(ServerState::new(config)?, interceptor).await
}

async fn serve(
    state: ServerState,
    interceptor: Arc<dyn InboundInterceptor>,
) -> Result<(SocketAddr, Arc<ServerState>)> {
    let state = Arc::new(state);
    let router = init_router(state.clone(), interceptor);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    Ok((addr, state))
}

fn config_with_timeout(timeout_millis: u64) -> Config {
    Config {
        timeout_millis,
        ..Default::default()
    }
}

async fn get(addr: SocketAddr, path: &str) -> Result<reqwest::Response> {
    Ok(reqwest::get(format!("http://{addr}{path}")).await?)
}

#[tokio::test]
async fn test_idle_worker_answers_hello() -> Result<()> {
    let (addr, _) = spawn_server(Config::default(), Arc::new(LoggingInterceptor)).await?;

    let start = Instant::now();
    let response = get(addr, CLUSTER_INFO_PATH).await?;

    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(response.text().await?, "Hello async");
    assert!(start.elapsed() < Duration::from_secs(1));

    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (addr, _) = spawn_server(Config::default(), Arc::new(LoggingInterceptor)).await?;

    let response = get(addr, "/health").await?;
    assert_eq!(response.status().as_u16(), 200);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_busy_worker_times_out_then_serves_next() -> Result<()> {
    const SLOW: Duration = Duration::from_millis(700);
    const TIMEOUT_MILLIS: u64 = 500;

    let (addr, state) = spawn_server(config_with_timeout(TIMEOUT_MILLIS), Arc::new(LoggingInterceptor)).await?;

    let start = Instant::now();
    let slow = state.executor().submit(WorkUnit::new(|| {
        std::thread::sleep(SLOW);
        Ok(())
    }))?;

    let response = get(addr, CLUSTER_INFO_PATH).await?;
    let timed_out_after = start.elapsed();
    assert_eq!(response.status().as_u16(), 504);
    assert!(response.text().await?.is_empty());
    assert!(timed_out_after >= Duration::from_millis(TIMEOUT_MILLIS));
    assert!(timed_out_after < SLOW, "timed out after {timed_out_after:?}");

    // Queued behind the slow unit, which still holds the worker
    let response = get(addr, CLUSTER_INFO_PATH).await?;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await?, "Hello async");
    assert!(start.elapsed() >= SLOW);

    slow.join().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_legacy_mode_swallows_timeout() -> Result<()> {
    let config = Config {
        legacy_empty_response: true,
        ..config_with_timeout(100)
    };
    let (addr, state) = spawn_server(config, Arc::new(LoggingInterceptor)).await?;

    let slow = state.executor().submit(WorkUnit::new(|| {
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    }))?;

    let response = get(addr, CLUSTER_INFO_PATH).await?;
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await?.is_empty());

    slow.join().await?;
    Ok(())
}

#[tokio::test]
async fn test_shutdown_rejects_with_service_unavailable() -> Result<()> {
    let (addr, state) = spawn_server(Config::default(), Arc::new(LoggingInterceptor)).await?;

    let executor = state.executor().clone();
    let _ = tokio::task::spawn_blocking(move || executor.shutdown(Duration::from_secs(1))).await?;

    let response = get(addr, CLUSTER_INFO_PATH).await?;
    assert_eq!(response.status().as_u16(), 503);

    Ok(())
}

struct DenyAll {
    seen: AtomicUsize,
}

impl InboundInterceptor for DenyAll {
    fn pre_handle(&self, _request: &Request) -> Verdict {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Verdict::Reject(StatusCode::FORBIDDEN)
    }
}

#[tokio::test]
async fn test_interceptor_can_short_circuit() -> Result<()> {
    let interceptor = Arc::new(DenyAll {
        seen: AtomicUsize::new(0),
    });
    let (addr, state) = spawn_server(Config::default(), interceptor.clone()).await?;

    let response = get(addr, CLUSTER_INFO_PATH).await?;
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(interceptor.seen.load(Ordering::SeqCst), 1);

    // Nothing reached the worker
    let marker = state.executor().submit(WorkUnit::new(|| Ok(())))?;
    marker.join().await?;
    assert_eq!(state.executor().pending(), 0);

    Ok(())
}

#[derive(Default)]
struct IdRecorder {
    seen: Mutex<Vec<(UnitId, Option<String>)>>,
}

impl LifecycleObserver for IdRecorder {
    fn before_concurrent_handling(&self, ctx: &RequestContext, unit: &WorkUnitInfo) {
        self.seen
            .lock()
            .unwrap()
            .push((unit.id, ctx.correlation_id.clone()));
    }
}

#[tokio::test]
async fn test_client_request_id_is_only_a_correlation_id() -> Result<()> {
    let recorder = Arc::new(IdRecorder::default());
    let state = ServerState::with_observer(Config::default(), recorder.clone())?;
    let (addr, _) = serve(state, Arc::new(LoggingInterceptor)).await?;

    // Same client id on both requests
    let client = reqwest::Client::new();
    let client_id = "4f1c2a9e-0000-4000-8000-000000000001";
    for _ in 0..2 {
        let response = client
            .get(format!("http://{addr}{CLUSTER_INFO_PATH}"))
            .header(REQUEST_ID_HEADER, client_id)
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
    }

    let seen = recorder.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].0, seen[1].0);
    assert_ne!(seen[0].0.to_string(), client_id);
    for (_, correlation_id) in &seen {
        assert_eq!(correlation_id.as_deref(), Some(client_id));
    }

    Ok(())
}
