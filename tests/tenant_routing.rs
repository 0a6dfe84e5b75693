//! Host-based tenant routing through the full middleware stack.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};

use tenant_gateway::config::CatalogSeed;
use tenant_gateway::routing::TenantRouter;

mod common;

use common::{gateway, get_req, request, send, test_config};

#[tokio::test]
async fn test_root_domain_serves_marketing() {
    let (server, store) = gateway(test_config());
    let app = server.router();

    for host in ["example.com", "www.example.com", "example.com:443"] {
        let (status, _, body) = send(&app, get_req(host, "/")).await;
        assert_eq!(status, StatusCode::OK, "host {host}");
        assert_eq!(body["site"], "marketing");
    }
    assert_eq!(store.calls(), 0, "root traffic must not query the store");
}

#[tokio::test]
async fn test_tenant_root_is_rewritten_to_storefront() {
    let (server, store) = gateway(test_config());
    let app = server.router();

    let (status, headers, body) = send(&app, get_req("acme.example.com", "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "storefront");
    assert_eq!(body["tenant"]["slug"], "acme");
    assert_eq!(body["tenant"]["tenant_id"], "t_acme");
    assert_eq!(body["tenant"]["theme"], "indigo");
    assert_eq!(body["tenant"]["path"], "/");
    assert_eq!(body["courses"], 2);
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_tenant_page_sees_original_path() {
    let (server, _) = gateway(test_config());
    let app = server.router();

    let (status, _, body) =
        send(&app, get_req("globex.example.com", "/learn/lesson-1/?t=30")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "tenant");
    assert_eq!(body["tenant"]["slug"], "globex");
    assert_eq!(body["tenant"]["path"], "/learn/lesson-1/");
}

#[tokio::test]
async fn test_local_development_hosts() {
    let (server, _) = gateway(test_config());
    let app = server.router();

    let (status, _, body) = send(&app, get_req("acme.localhost:3000", "/courses/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (_, _, body) = send(&app, get_req("localhost:3000", "/")).await;
    assert_eq!(body["site"], "marketing");
}

#[tokio::test]
async fn test_preview_hosts() {
    let (server, _) = gateway(test_config());
    let app = server.router();

    let (status, _, body) =
        send(&app, get_req("globex---feature-x.vercel.app", "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"]["slug"], "globex");
}

#[tokio::test]
async fn test_catalog_is_tenant_scoped() {
    let (server, _) = gateway(test_config());
    let app = server.router();

    let (_, _, acme) = send(&app, get_req("acme.example.com", "/courses")).await;
    let titles: Vec<_> = acme
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Async Rust", "Rust 101"]);

    let (status, _, course) = send(&app, get_req("acme.example.com", "/courses/rust-101")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["title"], "Rust 101");

    // Same key, other tenant.
    let (status, _, _) = send(&app, get_req("globex.example.com", "/courses/rust-101")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_tenant_is_not_found() {
    let (server, store) = gateway(test_config());
    let app = server.router();

    let (status, _, body) = send(&app, get_req("nobody.example.com", "/courses")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "tenant 'nobody' not found");
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_tenant_tree_is_not_reachable_from_root_host() {
    let (server, store) = gateway(test_config());
    let app = server.router();

    let (status, _, body) = send(&app, get_req("example.com", "/s/acme/courses")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no tenant for this host");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_payment_webhook_bypasses_rewrite() {
    let (server, store) = gateway(test_config());
    let app = server.router();

    for host in ["acme.example.com", "example.com"] {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/stripe")
            .header(header::HOST, host)
            .header("stripe-signature", "t=1,v1=abc")
            .body(Body::from(r#"{"type":"checkout.session.completed"}"#))
            .unwrap();

        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK, "host {host}");
        assert_eq!(body["received"], true);
        assert_eq!(body["bytes"], 37);
    }

    let (status, _, _) = send(
        &app,
        request(Method::POST, "acme.example.com", "/api/webhooks/stripe"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_static_files_and_health_bypass() {
    let (server, store) = gateway(test_config());
    let app = server.router();

    let (status, _, body) = send(&app, get_req("acme.example.com", "/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    // Not rewritten, so it reaches the root fallback rather than the tenant tree.
    let (status, _, body) = send(&app, get_req("acme.example.com", "/favicon.ico")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "page not found");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_dotted_tenant_paths_are_rewritten() {
    let mut config = test_config();
    config.tenants[0].catalog.push(CatalogSeed {
        key: "vue.js".into(),
        title: "Vue.js Fundamentals".into(),
    });
    let (server, store) = gateway(config);
    let app = server.router();

    let (status, _, course) = send(&app, get_req("acme.example.com", "/courses/vue.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["title"], "Vue.js Fundamentals");

    let (status, _, body) = send(&app, get_req("acme.example.com", "/learn/lesson-1.2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "tenant");
    assert_eq!(body["tenant"]["path"], "/learn/lesson-1.2");
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_store_failure_is_service_unavailable() {
    let (server, store) = gateway(test_config());
    let app = server.router();
    store.fail();

    let (status, _, body) = send(&app, get_req("acme.example.com", "/")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "tenant directory unavailable");
}

#[tokio::test]
async fn test_foreign_hosts_lenient_and_strict() {
    let (server, _) = gateway(test_config());
    let (_, _, body) = send(&server.router(), get_req("evil.org", "/")).await;
    assert_eq!(body["site"], "marketing");

    let mut config = test_config();
    config.tenancy.strict_hosts = true;
    let (server, _) = gateway(config);
    let app = server.router();

    let (status, _, body) = send(&app, get_req("evil.org", "/")).await;
    assert_eq!(status, StatusCode::MISDIRECTED_REQUEST);
    assert_eq!(body["error"], "host 'evil.org' is not served here");

    let (status, _, _) = send(&app, get_req("acme.example.com", "/")).await;
    assert_eq!(status, StatusCode::OK);

    // Loopback development hosts are never foreign.
    for host in ["127.0.0.1:3000", "[::1]:3000"] {
        let (status, _, body) = send(&app, get_req(host, "/")).await;
        assert_eq!(status, StatusCode::OK, "host {host}");
        assert_eq!(body["site"], "marketing");
    }
}

#[tokio::test]
async fn test_sessions_are_tenant_scoped() {
    let (server, _) = gateway(test_config());
    let app = server.router();

    let login = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/session")
        .header(header::HOST, "acme.example.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"user":"ada"}"#))
        .unwrap();
    let (status, headers, body) = send(&app, login).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "ada");
    assert_eq!(body["tenant_id"], "t_acme");

    let set_cookie = headers[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.contains("Domain=acme.example.com"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let token = cookie.split_once('=').unwrap().1.to_string();

    let with_cookie = |host: &str, cookie: &str| {
        Request::builder()
            .uri("/api/auth/session")
            .header(header::HOST, host)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, body) = send(&app, with_cookie("acme.example.com", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], "ada");

    // The same token presented to another tenant, under either cookie name.
    let (status, _, _) = send(&app, with_cookie("globex.example.com", &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let forged = format!("lms_session_t_globex={token}");
    let (status, _, _) = send(&app, with_cookie("globex.example.com", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let logout = Request::builder()
        .method(Method::DELETE)
        .uri("/api/auth/session")
        .header(header::HOST, "acme.example.com")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, logout).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, with_cookie("acme.example.com", &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reloaded_router_takes_effect() {
    let (server, _) = gateway(test_config());
    let app = server.router();

    let (_, _, body) = send(&app, get_req("acme.academy.io", "/")).await;
    assert_eq!(body["site"], "marketing");

    let mut config = test_config();
    config.tenancy.root_domain = "academy.io".into();
    server
        .routes()
        .store(Arc::new(TenantRouter::from_config(&config)));

    let (status, _, body) = send(&app, get_req("acme.academy.io", "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"]["slug"], "acme");
}
