#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use thumbnail_relay::Config;
use tokio::sync::OnceCell;
use tokio::time::sleep;

pub static SHARED: OnceCell<Harness> = OnceCell::const_new();

pub const API_KEY: &str = "test-api-key";

/// Prompt that makes the mock upstream answer 500
pub const EXPLODE: &str = "explode";
/// Prompt that makes the mock upstream stall for longer than the short timeout
pub const STALL: &str = "stall";
/// Prompts with this prefix get the received body echoed back
pub const ECHO_PREFIX: &str = "echo:";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub raw_body: String,
    pub payload: serde_json::Value,
}

/// Mock image generation API
pub struct MockUpstream {
    _handle: JoinHandle<()>,
    pub port: u16,
    pub received_calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let port = portpicker::pick_unused_port().expect("No available port for upstream");
        let received_calls = Arc::new(Mutex::new(Vec::new()));
        let calls = received_calls.clone();

        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                use warp::Filter;
                use warp::http::StatusCode;

                let generate = warp::path("generate")
                    .and(warp::post())
                    .and(warp::header::optional::<String>("x-freepik-api-key"))
                    .and(warp::header::optional::<String>("content-type"))
                    .and(warp::body::bytes())
                    .and_then(
                        move |api_key: Option<String>,
                              content_type: Option<String>,
                              body: warp::hyper::body::Bytes| {
                            let calls = calls.clone();
                            async move {
                                let raw_body = String::from_utf8_lossy(&body).into_owned();
                                let payload: serde_json::Value =
                                    serde_json::from_slice(&body).unwrap_or_default();
                                calls.lock().unwrap().push(RecordedCall {
                                    api_key,
                                    content_type,
                                    raw_body: raw_body.clone(),
                                    payload: payload.clone(),
                                });

                                let prompt = payload["prompt"].as_str().unwrap_or_default();
                                let reply = if prompt == EXPLODE {
                                    warp::reply::with_status(
                                        "upstream exploded".to_string(),
                                        StatusCode::INTERNAL_SERVER_ERROR,
                                    )
                                } else if prompt == STALL {
                                    sleep(Duration::from_secs(5)).await;
                                    warp::reply::with_status("too late".to_string(), StatusCode::OK)
                                } else if prompt.starts_with(ECHO_PREFIX) {
                                    warp::reply::with_status(raw_body, StatusCode::OK)
                                } else {
                                    warp::reply::with_status("OK-123".to_string(), StatusCode::OK)
                                };
                                Ok::<_, std::convert::Infallible>(reply)
                            }
                        },
                    );

                warp::serve(generate).run(([127, 0, 0, 1], port)).await;
            });
        });

        let upstream = MockUpstream {
            _handle: handle,
            port,
            received_calls,
        };

        // Poll until the port accepts connections
        for _ in 0..200 {
            if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        upstream
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/generate", self.port)
    }

    /// Calls whose payload carries the given prompt
    pub fn calls_with_prompt(&self, prompt: &str) -> Vec<RecordedCall> {
        self.received_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.payload["prompt"] == prompt)
            .cloned()
            .collect()
    }
}

/// Relay running on its own runtime thread
pub struct TestRelay {
    _handle: JoinHandle<()>,
    pub port: u16,
}

impl TestRelay {
    pub async fn start(api_url: String, request_timeout_secs: u64) -> Self {
        let port = portpicker::pick_unused_port().expect("No available port");

        let config = Config {
            listen_on_port: port,
            api_url: Some(api_url),
            api_key: Some(API_KEY.to_string()),
            request_timeout_secs,
            connect_timeout_secs: 1,
            ..Default::default()
        };

        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                thumbnail_relay::run(config).await.expect("Relay failed");
            });
        });

        let relay = TestRelay {
            _handle: handle,
            port,
        };

        let client = relay.client();
        for _ in 0..200 {
            if let Ok(response) = client.get(format!("{}/health", relay.url())).send().await
                && response.status().is_success()
            {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        relay
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap()
    }

    pub async fn generate(&self, body: serde_json::Value) -> reqwest::Response {
        self.client()
            .post(format!("{}{}", self.url(), thumbnail_relay::GENERATE_ROUTE))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

/// Mock upstream plus a relay pointed at it
pub struct Harness {
    pub upstream: MockUpstream,
    pub relay: TestRelay,
}

impl Harness {
    pub async fn shared() -> &'static Harness {
        SHARED
            .get_or_init(|| async {
                let upstream = MockUpstream::start().await;
                let relay = TestRelay::start(upstream.url(), 30).await;
                Harness { upstream, relay }
            })
            .await
    }
}

/// Upstream that answers every POST with a 307 pointing at a second host,
/// which records the api key header of anything that reaches it
pub struct RedirectingUpstream {
    _handle: JoinHandle<()>,
    pub port: u16,
    pub other_port: u16,
    pub redirects_sent: Arc<Mutex<usize>>,
    pub keys_seen_by_other_host: Arc<Mutex<Vec<Option<String>>>>,
}

impl RedirectingUpstream {
    pub async fn start() -> Self {
        let port = portpicker::pick_unused_port().expect("No available port for upstream");
        let other_port = portpicker::pick_unused_port().expect("No available port for other host");
        let redirects_sent = Arc::new(Mutex::new(0));
        let keys_seen_by_other_host = Arc::new(Mutex::new(Vec::new()));
        let redirects = redirects_sent.clone();
        let keys = keys_seen_by_other_host.clone();

        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                use warp::Filter;
                use warp::http::StatusCode;

                let location = format!("http://localhost:{other_port}/collect");
                let redirect = warp::post().map(move || {
                    *redirects.lock().unwrap() += 1;
                    warp::reply::with_header(
                        warp::reply::with_status(String::new(), StatusCode::TEMPORARY_REDIRECT),
                        "location",
                        location.clone(),
                    )
                });

                let collect = warp::post()
                    .and(warp::header::optional::<String>("x-freepik-api-key"))
                    .map(move |api_key: Option<String>| {
                        keys.lock().unwrap().push(api_key);
                        "collected".to_string()
                    });

                tokio::join!(
                    warp::serve(redirect).run(([127, 0, 0, 1], port)),
                    warp::serve(collect).run(([127, 0, 0, 1], other_port)),
                );
            });
        });

        for target in [port, other_port] {
            for _ in 0..200 {
                if tokio::net::TcpStream::connect(("127.0.0.1", target)).await.is_ok() {
                    break;
                }
                sleep(Duration::from_millis(10)).await;
            }
        }

        RedirectingUpstream {
            _handle: handle,
            port,
            other_port,
            redirects_sent,
            keys_seen_by_other_host,
        }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/generate", self.port)
    }
}
