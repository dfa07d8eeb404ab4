//! Integration tests for schema_loader
//!
//! Exercises every source against the station fixture, the per-endpoint
//! cache, and superseded-request handling.

use assert_matches::assert_matches;
use schema_loader::schema_types::{PrimitiveKind, TypeNode};
use schema_loader::{
    HttpSource, LatestRequest, MemorySource, PathSource, ResolveError, SchemaResolver,
    TypeSelector,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATION: &str = include_str!("fixtures/station.schema.yaml");

#[tokio::test]
async fn path_source_reads_endpoint_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("station.schema.yaml"), STATION).expect("write fixture");

    let resolver = SchemaResolver::new(PathSource::new(dir.path()));
    let resolved = resolver
        .resolve("station", &TypeSelector::name("User"))
        .await
        .expect("resolve User");

    assert_eq!(resolved.program.package(), "station");
    let TypeNode::Named { id, node } = &resolved.node else {
        panic!("expected named anchor, got {:?}", resolved.node);
    };
    assert_eq!(id, "User");
    assert_matches!(node.as_ref(), TypeNode::Record { fields } if fields.len() == 3);
}

#[tokio::test]
async fn missing_file_is_schema_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = SchemaResolver::new(PathSource::new(dir.path()));

    let err = resolver
        .resolve("station", &TypeSelector::name("User"))
        .await
        .expect_err("no file");
    assert_matches!(err, ResolveError::SchemaUnavailable { ref endpoint, .. } if endpoint == "station");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn http_source_fetches_from_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schemas/station"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATION))
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&format!("{}/schemas", server.uri())).expect("base url");
    let resolver = SchemaResolver::new(HttpSource::new(base).expect("http source"));

    let args = resolver
        .resolve("station", &TypeSelector::method_args("transfer"))
        .await
        .expect("transfer args");
    assert_eq!(
        args.node,
        TypeNode::tuple([
            TypeNode::primitive(PrimitiveKind::Nat64),
            TypeNode::primitive(PrimitiveKind::Nat64),
        ])
    );

    /* second resolution is served from cache; the mock expects one hit */
    resolver
        .resolve("station", &TypeSelector::method_results("transfer"))
        .await
        .expect("transfer results");
}

#[tokio::test]
async fn http_error_status_is_schema_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = SchemaResolver::new(
        HttpSource::new(Url::parse(&server.uri()).expect("base url")).expect("http source"),
    );
    let err = resolver
        .resolve("station", &TypeSelector::name("User"))
        .await
        .expect_err("server error");
    assert_matches!(err, ResolveError::SchemaUnavailable { .. });
}

#[tokio::test]
async fn invalidate_forces_refetch() {
    let source = MemorySource::new().with("station", "package: station\n");
    let resolver = SchemaResolver::new(source);

    let err = resolver
        .resolve("station", &TypeSelector::name("User"))
        .await
        .expect_err("no User yet");
    assert_eq!(err, ResolveError::UnknownType("User".to_string()));
    assert!(resolver.is_cached("station"));

    resolver.source().insert("station", STATION);
    resolver
        .resolve("station", &TypeSelector::name("User"))
        .await
        .expect_err("stale cache still lacks User");

    resolver.invalidate("station");
    assert!(!resolver.is_cached("station"));
    resolver
        .resolve("station", &TypeSelector::name("User"))
        .await
        .expect("refetched program has User");
}

#[tokio::test]
async fn superseded_resolution_is_dropped() {
    let resolver = SchemaResolver::new(MemorySource::new().with("station", STATION));
    let latest = LatestRequest::new();

    let stale = latest.issue();
    let fresh = latest.issue();

    let err = resolver
        .resolve_latest(&latest, stale, "station", &TypeSelector::name("Group"))
        .await
        .expect_err("stale ticket");
    assert_eq!(err, ResolveError::Superseded);

    let resolved = resolver
        .resolve_latest(&latest, fresh, "station", &TypeSelector::name("Group"))
        .await
        .expect("fresh ticket");
    assert_eq!(resolved.node.validate(), Ok(()));
}

#[tokio::test]
async fn malformed_yaml_is_schema_unavailable() {
    let resolver = SchemaResolver::new(MemorySource::new().with("broken", "types: [oops"));
    let err = resolver
        .program("broken")
        .await
        .expect_err("malformed yaml");
    assert_matches!(err, ResolveError::SchemaUnavailable { .. });
}
