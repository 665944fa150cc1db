//! Integration tests for each provider connector against mock backends

mod common;

use common::{assert_filter_embedded, test_transport};
use oob_adapter::connector::{DnslogcnConnector, ProviderConnector, XrayConnector};
use oob_adapter::{
    ConnectionParams, FilterType, MatchPolicy, OobAdapter, OobError, ProviderKind, ValidateParams,
};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// ceye
// ---------------------------------------------------------------------------

async fn ceye_adapter(mock_server: &MockServer) -> OobAdapter {
    let params = ConnectionParams::new("ceye-token", "abc123.ceye.io").with_api_url(mock_server.uri());
    OobAdapter::new("ceye", params, test_transport())
        .await
        .expect("ceye adapter")
}

#[tokio::test]
async fn test_ceye_domains() {
    let mock_server = MockServer::start().await;
    let adapter = ceye_adapter(&mock_server).await;

    let domains = adapter.validation_domains();
    assert_filter_embedded(&domains);
    assert_eq!(domains.filter.len(), 10);
    assert_eq!(domains.dns, format!("{}.abc123.ceye.io", domains.filter));
    assert_eq!(domains.http, format!("http://{}", domains.dns));
    assert_eq!(domains.jndi, domains.dns);
    assert!(domains.rmi.is_empty() && domains.ldap.is_empty());
    assert!(adapter.is_valid());
}

#[tokio::test]
async fn test_ceye_validate_hit_and_miss() {
    let mock_server = MockServer::start().await;
    let adapter = ceye_adapter(&mock_server).await;
    let domains = adapter.validation_domains();

    Mock::given(method("GET"))
        .and(path("/v1/records"))
        .and(query_param("token", "ceye-token"))
        .and(query_param("type", "dns"))
        .and(query_param("filter", domains.filter.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"code": 200},
            "data": [{"id": "1", "name": domains.dns.to_uppercase(), "created_at": "2024-01-06 10:00:00"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/records"))
        .and(query_param("type", "http"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {"code": 200}, "data": []})))
        .mount(&mock_server)
        .await;

    let hit = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Dns))
        .await;
    assert!(hit.is_valid, "uppercase log entry should still match");
    assert_eq!(hit.provider, Some(ProviderKind::Ceye));
    assert_eq!(hit.filter_type, "dns");

    // JNDI is looked up through the DNS log
    let jndi = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Jndi))
        .await;
    assert!(jndi.is_valid);

    let miss = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Http))
        .await;
    assert!(!miss.is_valid);
    assert!(miss.body.contains("\"data\":[]"));
}

#[tokio::test]
async fn test_ceye_match_requires_trailing_dot() {
    let mock_server = MockServer::start().await;
    let adapter = ceye_adapter(&mock_server).await;

    assert!(adapter.matches(b"abc123.x.ceye.io", FilterType::Dns, "ABC123"));
    assert!(!adapter.matches(b"abc123x.ceye.io", FilterType::Dns, "abc123"));
    assert!(!adapter.matches(b"", FilterType::Dns, "abc123"));
    assert!(!adapter.matches(b"abc123.x", FilterType::Dns, ""));
}

#[tokio::test]
async fn test_ceye_rejects_rmi() {
    let mock_server = MockServer::start().await;
    let adapter = ceye_adapter(&mock_server).await;

    let result = adapter
        .validate_result(&ValidateParams::new("abc", FilterType::Rmi))
        .await;
    assert!(!result.is_valid);
    assert_eq!(result.body, "unknown filter type");
    assert!(adapter.poll(FilterType::Rmi).await.is_none());
}

// ---------------------------------------------------------------------------
// dnslogcn
// ---------------------------------------------------------------------------

async fn mount_dnslogcn_session(mock_server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/getdomain.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "PHPSESSID=s3ss10n; path=/")
                .set_body_string(body),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_dnslogcn_bootstrap_and_validate() {
    let mock_server = MockServer::start().await;
    mount_dnslogcn_session(&mock_server, "x1y2z3.dnslog.cn\n").await;

    let params = ConnectionParams::new("", "dnslog.cn").with_api_url(mock_server.uri());
    let adapter = OobAdapter::new("dnslogcn", params, test_transport())
        .await
        .expect("dnslogcn adapter");

    let domains = adapter.validation_domains();
    assert_filter_embedded(&domains);
    assert_eq!(domains.filter.len(), 6);
    assert!(domains.dns.ends_with(".x1y2z3.dnslog.cn"));
    assert!(adapter.is_valid());

    Mock::given(method("GET"))
        .and(path("/getrecords.php"))
        .and(header("cookie", "PHPSESSID=s3ss10n"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"[["{}","1.2.3.4","2024-01-06 10:00:00"]]"#,
            domains.dns
        )))
        .mount(&mock_server)
        .await;

    let result = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Http))
        .await;
    assert!(result.is_valid);

    let other = adapter
        .validate_result(&ValidateParams::new("zzzzzz", FilterType::Dns))
        .await;
    assert!(!other.is_valid);
}

#[tokio::test]
async fn test_dnslogcn_connector_keeps_issued_subdomain() {
    let mock_server = MockServer::start().await;
    mount_dnslogcn_session(&mock_server, "  q9w8e7.dnslog.cn \n").await;

    let params = ConnectionParams::new("", "dnslog.cn").with_api_url(mock_server.uri());
    let connector = DnslogcnConnector::connect(&params, test_transport())
        .await
        .expect("dnslogcn connector");

    assert_eq!(connector.subdomain(), "q9w8e7.dnslog.cn");
    assert_eq!(connector.kind(), ProviderKind::Dnslogcn);
    assert!(connector.validation_domains().dns.ends_with(".q9w8e7.dnslog.cn"));
}

#[tokio::test]
async fn test_dnslogcn_rejects_foreign_domain() {
    let mock_server = MockServer::start().await;
    mount_dnslogcn_session(&mock_server, "x1y2z3.elsewhere.net").await;

    let params = ConnectionParams::new("", "dnslog.cn").with_api_url(mock_server.uri());
    let result = OobAdapter::new("dnslogcn", params, test_transport()).await;
    assert!(matches!(result, Err(OobError::Bootstrap { .. })));
}

// ---------------------------------------------------------------------------
// alphalog
// ---------------------------------------------------------------------------

async fn mount_alphalog_session(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "k-123",
            "subdomain": "s1.alphalog.cn",
            "rmi": "rmi://10.0.0.1:1099",
            "ldap": "ldap://10.0.0.1:1389/"
        })))
        .mount(mock_server)
        .await;
}

async fn alphalog_adapter(mock_server: &MockServer, policy: MatchPolicy) -> OobAdapter {
    mount_alphalog_session(mock_server).await;
    let params = ConnectionParams::new("", "alphalog.cn")
        .with_api_url(format!("{}/", mock_server.uri()))
        .with_match_policy(policy);
    OobAdapter::new("alphalog", params, test_transport())
        .await
        .expect("alphalog adapter")
}

#[tokio::test]
async fn test_alphalog_domains() {
    let mock_server = MockServer::start().await;
    let adapter = alphalog_adapter(&mock_server, MatchPolicy::Loose).await;

    let domains = adapter.validation_domains();
    assert_filter_embedded(&domains);
    assert_eq!(domains.dns, format!("{}.s1.alphalog.cn", domains.filter));
    assert_eq!(domains.http, format!("http://{}", domains.dns));
    assert_eq!(domains.rmi, format!("rmi://10.0.0.1:1099/{}", domains.filter));
    assert_eq!(domains.ldap, format!("ldap://10.0.0.1:1389/{}", domains.filter));
    assert_eq!(domains.jndi, domains.ldap);
}

#[tokio::test]
async fn test_alphalog_validate_posts_key() {
    let mock_server = MockServer::start().await;
    let adapter = alphalog_adapter(&mock_server, MatchPolicy::Loose).await;
    let domains = adapter.validation_domains();

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string("key=k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "ldap", "request": format!("/{}", domains.filter)}
        ])))
        .mount(&mock_server)
        .await;

    let result = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Ldap))
        .await;
    assert!(result.is_valid);
    assert_eq!(result.filter_type, "ldap");
}

#[tokio::test]
async fn test_alphalog_strict_policy() {
    let mock_server = MockServer::start().await;
    let loose = alphalog_adapter(&mock_server, MatchPolicy::Loose).await;
    let strict = alphalog_adapter(&mock_server, MatchPolicy::Strict).await;

    let body = b"abc123x.s1.alphalog.cn";
    assert!(loose.matches(body, FilterType::Dns, "abc123"));
    assert!(!strict.matches(body, FilterType::Dns, "abc123"));
    assert!(strict.matches(b"abc123.s1.alphalog.cn", FilterType::Dns, "abc123"));
    assert!(strict.matches(b"GET /abc123 ldap", FilterType::Ldap, "abc123"));
}

#[tokio::test]
async fn test_alphalog_missing_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "k"})))
        .mount(&mock_server)
        .await;

    let params = ConnectionParams::new("", "alphalog.cn").with_api_url(mock_server.uri());
    let result = OobAdapter::new("alphalog", params, test_transport()).await;
    assert!(matches!(result, Err(OobError::Bootstrap { .. })));
}

#[tokio::test]
async fn test_alphalog_malformed_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let params = ConnectionParams::new("", "alphalog.cn").with_api_url(mock_server.uri());
    let result = OobAdapter::new("alphalog", params, test_transport()).await;
    assert!(matches!(result, Err(OobError::Bootstrap { .. })));
}

// ---------------------------------------------------------------------------
// xray
// ---------------------------------------------------------------------------

async fn mount_xray_generators(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/_/api/cland/generate/dns_domain"))
        .and(header("x-token", "xt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "groupID": "iod8",
                "isDomainNameServer": true,
                "prefix": "p-9a393c-iod8",
                "root": "dnslogxx.net",
                "server": "10.0.0.2"
            }
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/_/api/cland/generate/http_url"))
        .and(header("x-token", "xt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"groupID": "K5W0", "url": "http://10.0.0.2:8777/p/369d50/K5W0/"}
        })))
        .mount(mock_server)
        .await;
}

async fn xray_adapter(mock_server: &MockServer, policy: MatchPolicy) -> OobAdapter {
    mount_xray_generators(mock_server).await;
    let params = ConnectionParams::new("xt", "dnslogxx.net")
        .with_api_url(mock_server.uri())
        .with_match_policy(policy);
    OobAdapter::new("xray", params, test_transport())
        .await
        .expect("xray adapter")
}

#[tokio::test]
async fn test_xray_domains() {
    let mock_server = MockServer::start().await;
    let adapter = xray_adapter(&mock_server, MatchPolicy::Loose).await;

    let domains = adapter.validation_domains();
    assert_filter_embedded(&domains);
    assert_eq!(domains.filter.len(), 6);
    assert_eq!(
        domains.http,
        format!("http://10.0.0.2:8777/p/369d50/K5W0/{}", domains.filter)
    );
    assert_eq!(
        domains.dns,
        format!("p-9a393c-iod8.{}.dnslogxx.net", domains.filter)
    );
    assert!(domains.jndi.is_empty());
}

#[tokio::test]
async fn test_xray_connector_keeps_generated_bases() {
    let mock_server = MockServer::start().await;
    mount_xray_generators(&mock_server).await;

    let params = ConnectionParams::new("xt", "dnslogxx.net").with_api_url(mock_server.uri());
    let connector = XrayConnector::connect(&params, test_transport())
        .await
        .expect("xray connector");

    assert_eq!(connector.dns_prefix(), "p-9a393c-iod8");
    assert_eq!(connector.http_url(), "http://10.0.0.2:8777/p/369d50/K5W0/");
    assert!(connector.is_valid());
}

#[tokio::test]
async fn test_xray_validate_by_event_type() {
    let mock_server = MockServer::start().await;
    let adapter = xray_adapter(&mock_server, MatchPolicy::Loose).await;
    let domains = adapter.validation_domains();

    Mock::given(method("GET"))
        .and(path("/_/api/cland/event/list"))
        .and(query_param("eventType", "http"))
        .and(header("x-token", "xt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"items": [{"request": format!("GET /p/369d50/K5W0/{} HTTP/1.1", domains.filter)}]}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/_/api/cland/event/list"))
        .and(query_param("eventType", "dns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"items": []}})))
        .mount(&mock_server)
        .await;

    let http = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Http))
        .await;
    assert!(http.is_valid);

    let dns = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Dns))
        .await;
    assert!(!dns.is_valid);

    let jndi = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Jndi))
        .await;
    assert_eq!(jndi.body, "unknown filter type");
}

#[tokio::test]
async fn test_xray_loose_and_strict_dns_match() {
    let mock_server = MockServer::start().await;
    let loose = xray_adapter(&mock_server, MatchPolicy::Loose).await;
    let strict = xray_adapter(&mock_server, MatchPolicy::Strict).await;

    let other_token = b"p-9a393c-iod8.other1.dnslogxx.net";
    assert!(loose.matches(other_token, FilterType::Dns, "abc123"));
    assert!(!strict.matches(other_token, FilterType::Dns, "abc123"));
    assert!(strict.matches(b"P-9A393C-IOD8.ABC123.dnslogxx.net", FilterType::Dns, "abc123"));

    assert!(loose.matches(b"GET /abc123", FilterType::Http, "abc123"));
    assert!(!strict.matches(b"GET /abc123", FilterType::Http, "abc123"));
    assert!(strict.matches(b"GET /p/369d50/K5W0/abc123", FilterType::Http, "abc123"));
}

#[tokio::test]
async fn test_xray_generator_without_prefix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_/api/cland/generate/dns_domain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 1, "data": {}})))
        .mount(&mock_server)
        .await;

    let params = ConnectionParams::new("bad", "dnslogxx.net").with_api_url(mock_server.uri());
    let result = OobAdapter::new("xray", params, test_transport()).await;
    assert!(matches!(result, Err(OobError::Bootstrap { .. })));
}

// ---------------------------------------------------------------------------
// revsuit
// ---------------------------------------------------------------------------

async fn revsuit_adapter(mock_server: &MockServer, http_url: &str) -> OobAdapter {
    Mock::given(method("GET"))
        .and(path("/api/record/dns"))
        .and(query_param("pageSize", "1"))
        .and(header("cookie", "token=rs-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "succeed", "result": {}})))
        .mount(mock_server)
        .await;

    let params = ConnectionParams::new("rs-key", "log.test")
        .with_api_url(mock_server.uri())
        .with_http_url(http_url);
    OobAdapter::new("revsuit", params, test_transport())
        .await
        .expect("revsuit adapter")
}

#[tokio::test]
async fn test_revsuit_domains() {
    let mock_server = MockServer::start().await;
    let adapter = revsuit_adapter(&mock_server, "http://10.0.0.3:10000/log/").await;

    let domains = adapter.validation_domains();
    assert_filter_embedded(&domains);
    assert_eq!(domains.filter.len(), 8);
    assert_eq!(domains.http, format!("http://10.0.0.3:10000/log/{}", domains.filter));
    assert_eq!(domains.dns, format!("{}.log.test", domains.filter));
}

#[tokio::test]
async fn test_revsuit_without_http_url() {
    let mock_server = MockServer::start().await;
    let adapter = revsuit_adapter(&mock_server, "").await;

    let domains = adapter.validation_domains();
    assert!(domains.http.is_empty());
    assert_filter_embedded(&domains);
}

#[tokio::test]
async fn test_revsuit_validate() {
    let mock_server = MockServer::start().await;
    let adapter = revsuit_adapter(&mock_server, "http://10.0.0.3:10000/log").await;
    let domains = adapter.validation_domains();

    Mock::given(method("GET"))
        .and(path("/api/record/http"))
        .and(query_param("pageSize", "100"))
        .and(header("cookie", "token=rs-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"data": [{"id": 9, "uri": format!("/log/{}", domains.filter)}]}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/record/dns"))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"data": [{"domain": format!("{}.log.test", domains.filter)}]}
        })))
        .mount(&mock_server)
        .await;

    let http = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Http))
        .await;
    assert!(http.is_valid);

    let dns = adapter
        .validate_result(&ValidateParams::new(domains.filter.as_str(), FilterType::Dns))
        .await;
    assert!(dns.is_valid);

    let wrong = adapter
        .validate_result(&ValidateParams::new("nothere1", FilterType::Dns))
        .await;
    assert!(!wrong.is_valid);
    assert!(wrong.body.contains(&domains.filter));
}

#[tokio::test]
async fn test_revsuit_unreachable() {
    let params = ConnectionParams::new("rs-key", "log.test").with_api_url("http://127.0.0.1:1");
    let result = OobAdapter::new("revsuit", params, test_transport()).await;
    assert!(matches!(result, Err(OobError::Bootstrap { .. })));
}

// ---------------------------------------------------------------------------
// Shared properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_consecutive_filters_differ() {
    let mock_server = MockServer::start().await;
    let adapter = revsuit_adapter(&mock_server, "http://10.0.0.3/log").await;

    let first = adapter.validation_domains();
    let second = adapter.validation_domains();
    assert_ne!(first.filter, second.filter);
}
