//! 使い捨ての axum サーバーに対する HTTP クライアントのテスト

use axum::Router;
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use gilliam_api::{
    ApiError, Builder, BuilderClient, DockerAuth, Executor, ExecutorClient, PushEvent, RegistryAuth,
    Scheduler, SchedulerClient, ServiceRegistryClient,
};
use gilliam_config::Credentials;
use gilliam_core::Release;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

fn release(name: &str) -> Release {
    Release {
        name: name.to_string(),
        author: Some("test".into()),
        message: None,
        services: BTreeMap::new(),
    }
}

#[tokio::test]
async fn test_releases_follow_next_links() {
    let router = Router::new().route(
        "/formation/{formation}/release",
        get(
            |Path(formation): Path<String>, Query(query): Query<HashMap<String, String>>| async move {
                assert_eq!(formation, "demo");
                match query.get("page").map(String::as_str) {
                    None => axum::Json(json!({
                        "items": [{"name": "1"}, {"name": "2"}],
                        "links": {"next": "release?page=2"}
                    })),
                    Some("2") => axum::Json(json!({
                        "items": [{"name": "3"}],
                        "links": {}
                    })),
                    Some(other) => panic!("unexpected page {other}"),
                }
            },
        ),
    );
    let addr = serve(router).await;

    let scheduler = SchedulerClient::new(&format!("http://{addr}")).unwrap();
    let names: Vec<String> = scheduler
        .releases("demo")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_create_release_conflict() {
    let router = Router::new().route(
        "/formation/{formation}/release",
        post(|| async { (StatusCode::CONFLICT, "release exists") }),
    );
    let addr = serve(router).await;

    let scheduler = SchedulerClient::new(&format!("http://{addr}")).unwrap();
    let err = scheduler.create_release("demo", &release("4")).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_other_errors_carry_status() {
    let router = Router::new().route(
        "/formation/{formation}/release/{release}/migrate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(router).await;

    let scheduler = SchedulerClient::new(&format!("http://{addr}")).unwrap();
    match scheduler.migrate("demo", "1").await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_release_and_migrate() {
    let router = Router::new()
        .route(
            "/formation/{formation}/release",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                assert_eq!(body["name"], "1");
                assert_eq!(body["author"], "test");
                axum::Json(body)
            }),
        )
        .route(
            "/formation/{formation}/release/{release}/migrate",
            post(|| async { axum::Json(json!(true)) }),
        )
        .route(
            "/formation/{formation}/release/{release}/scale",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                assert_eq!(body["scales"]["web"], 3);
                axum::Json(json!(false))
            }),
        );
    let addr = serve(router).await;

    let scheduler = SchedulerClient::new(&format!("http://{addr}/")).unwrap();
    let created = scheduler.create_release("demo", &release("1")).await.unwrap();
    assert_eq!(created.name, "1");
    assert!(scheduler.migrate("demo", "1").await.unwrap());

    let scales = BTreeMap::from([("web".to_string(), 3)]);
    assert!(!scheduler.scale("demo", "1", &scales).await.unwrap());
}

#[tokio::test]
async fn test_build_streams_log_and_exit_code() {
    let router = Router::new().route(
        "/build/{*repository}",
        post(
            |Path(repository): Path<String>,
             Query(query): Query<HashMap<String, String>>,
             headers: HeaderMap,
             body: axum::body::Bytes| async move {
                assert_eq!(repository, "acme/demo-web");
                assert_eq!(query["tag"], "abc123");
                assert_eq!(headers["content-type"], "application/x-tar");
                assert_eq!(&body[..], b"tarball");
                "{\"stream\": \"Step 1/2\\n\"}\n{\"stream\": \"Step 2/2\\n\"}\n{\"exit_code\": 2}\n"
            },
        ),
    );
    let addr = serve(router).await;

    let builder = BuilderClient::new(&format!("http://{addr}")).unwrap();
    let mut log = Vec::new();
    let exit_code = builder
        .build("acme/demo-web", "abc123", b"tarball".to_vec(), &mut |text: &str| {
            log.push(text.to_string())
        })
        .await
        .unwrap();

    assert_eq!(exit_code, 2);
    assert_eq!(log, vec!["Step 1/2\n", "Step 2/2\n"]);
}

#[tokio::test]
async fn test_build_without_exit_code_is_an_error() {
    let router = Router::new().route(
        "/build/{*repository}",
        post(|| async { "{\"stream\": \"partial\"}\n" }),
    );
    let addr = serve(router).await;

    let builder = BuilderClient::new(&format!("http://{addr}")).unwrap();
    let result = builder.build("acme/web", "t", Vec::new(), &mut |_: &str| {}).await;
    assert!(matches!(result, Err(ApiError::Protocol(_))));
}

#[tokio::test]
async fn test_push_reports_progress_and_errors() {
    let router = Router::new()
        .route(
            "/image/acme/ok/push",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                assert_eq!(body["username"], "alice");
                "{\"status\": \"Pushing\", \"progress\": \"1/2\"}\n{\"status\": \"Pushed\"}\n"
            }),
        )
        .route(
            "/image/acme/bad/push",
            post(|| async { "{\"status\": \"Pushing\"}\n{\"error\": \"denied\"}\n" }),
        );
    let addr = serve(router).await;
    let executor = ExecutorClient::new(&format!("http://{addr}")).unwrap();
    let credentials = Credentials {
        username: "alice".into(),
        password: "pw".into(),
    };

    let mut statuses = Vec::new();
    executor
        .push_image("acme/ok", Some(&credentials), &mut |event: &PushEvent| {
            statuses.push(event.status.clone().unwrap_or_default())
        })
        .await
        .unwrap();
    assert_eq!(statuses, vec!["Pushing", "Pushed"]);

    let err = executor
        .push_image("acme/bad", None, &mut |_: &PushEvent| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Remote(message) if message == "denied"));
}

#[tokio::test]
async fn test_service_registry_falls_back_to_next_node() {
    let router = Router::new().route(
        "/{formation}",
        get(|Path(formation): Path<String>| async move {
            assert_eq!(formation, "executor");
            axum::Json(json!({
                "executor.exec-1": {
                    "formation": "executor", "service": "api",
                    "instance": "exec-1", "host": "10.0.0.5", "port": 9000
                }
            }))
        }),
    );
    let addr = serve(router).await;

    let registry = ServiceRegistryClient::new(vec!["127.0.0.1:1".to_string(), addr]);
    let endpoints = registry.query_formation("executor").await.unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].base_url(), "http://10.0.0.5:9000/");

    let chosen = registry.select_executor(Some("exec-1")).await.unwrap();
    assert_eq!(chosen.instance, "exec-1");
    assert!(matches!(
        registry.select_executor(Some("exec-9")).await,
        Err(ApiError::ExecutorNotFound(_))
    ));
}

#[tokio::test]
async fn test_service_registry_all_nodes_down() {
    let registry = ServiceRegistryClient::new(vec!["127.0.0.1:1".to_string()]);
    assert!(matches!(
        registry.query_formation("executor").await,
        Err(ApiError::RegistryUnavailable(_))
    ));
}

#[tokio::test]
async fn test_docker_auth_checks_basic_auth() {
    let router = Router::new().route(
        "/v1/users/",
        get(|headers: HeaderMap| async move {
            if headers.contains_key("authorization") {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            }
        }),
    );
    let addr = serve(router).await;

    let auth = DockerAuth::insecure();
    assert!(!auth.anonymous(&addr).await.unwrap());
    let credentials = Credentials {
        username: "alice".into(),
        password: "pw".into(),
    };
    assert!(auth.check(&addr, &credentials).await.unwrap());
}
