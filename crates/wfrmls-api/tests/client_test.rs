#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wfrmls_api::resources::{AduStatus, MediaType, PropertySearch, PropertyStatus, ResourceName};
use wfrmls_api::{Error, ODataQuery, WfrmlsClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, WfrmlsClient) {
    let server = MockServer::start().await;
    let base = format!("{}/odata", server.uri());
    let client = WfrmlsClient::new(Some(SecretString::from("test-token")), Some(&base)).unwrap();
    (server, client)
}

fn page(records: serde_json::Value) -> serde_json::Value {
    json!({
        "@odata.context": "https://example.test/odata/$metadata#Property",
        "value": records,
    })
}

/// Expect exactly one GET on `entity` carrying every `(param, value)` pair.
async fn mount_expecting(server: &MockServer, entity: &str, params: &[(&str, &str)]) {
    let mut mock = Mock::given(method("GET")).and(path(format!("/odata/{entity}")));
    for &(name, value) in params {
        mock = mock.and(query_param(name, value));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .expect(1)
        .mount(server)
        .await;
}

// ── List ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_clamps_top_and_returns_records_unmodified() {
    let (server, client) = setup().await;

    let records = json!([
        {"ListingKey": "1", "ListPrice": 350_000, "StandardStatus": "Active"},
        {
            "ListingKey": "2",
            "ListPrice": 499_900,
            "StandardStatus": "Active",
            "Extra": {"nested": true}
        },
    ]);

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param("$top", "200"))
        .and(query_param("$filter", "StandardStatus eq 'Active'"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(records.clone())))
        .expect(1)
        .mount(&server)
        .await;

    let query = ODataQuery::new().top(500).filter("StandardStatus eq 'Active'");
    let result = client.property().list(&query).await.unwrap();

    assert_eq!(serde_json::to_value(&result.value).unwrap(), records);
    assert_eq!(
        result.context.as_deref(),
        Some("https://example.test/odata/$metadata#Property")
    );
}

#[tokio::test]
async fn test_list_serialises_select_expand_and_count() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Member"))
        .and(query_param("$select", "MemberKey,MemberFullName"))
        .and(query_param("$expand", "Office"))
        .and(query_param("$count", "true"))
        .and(query_param("$orderby", "MemberLastName asc"))
        .and(query_param("$skip", "40"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"@odata.count": 1234, "value": []})),
        )
        .mount(&server)
        .await;

    let query = ODataQuery::new()
        .select(vec!["MemberKey", "MemberFullName"])
        .expand("Office")
        .count(true)
        .orderby("MemberLastName asc")
        .skip(40);
    let result = client.member().list(&query).await.unwrap();

    assert_eq!(result.count, Some(1234));
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_get_by_key_builds_entity_path() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property('1611952')"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ListingKey": "1611952", "City": "Provo"})),
        )
        .mount(&server)
        .await;

    let record = client.property().get("1611952").await.unwrap();
    assert_eq!(record["City"], "Provo");
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Member('nope')"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "404", "message": "No such member"}
        })))
        .mount(&server)
        .await;

    let result = client.member().get("nope").await;
    match result {
        Err(ref err @ Error::NotFound { status, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(err.to_string(), "Resource not found: No such member");
            assert!(err.is_not_found());
        }
        other => panic!("Expected NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_status_codes_map_to_typed_errors() {
    let (server, client) = setup().await;

    for (status, entity) in [(400, "Office"), (401, "Media"), (429, "Lookup"), (503, "Adu")] {
        Mock::given(method("GET"))
            .and(path(format!("/odata/{entity}")))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"message": "boom"})),
            )
            .mount(&server)
            .await;
    }

    let q = ODataQuery::new();
    let bad = client.office().list(&q).await;
    assert!(matches!(bad, Err(Error::Validation { status: 400, .. })), "{bad:?}");

    let auth = client.media().list(&q).await;
    assert!(
        matches!(auth, Err(Error::Authentication { status: Some(401), .. })),
        "{auth:?}"
    );

    let limited = client.lookup().list(&q).await.unwrap_err();
    assert!(matches!(limited, Error::RateLimited { .. }));
    assert_eq!(limited.to_string(), "Rate limit exceeded: boom");
    assert!(limited.is_transient());

    let server_err = client.adu().list(&q).await.unwrap_err();
    assert!(matches!(server_err, Error::Server { status: 503, .. }));
    assert_eq!(server_err.response_body(), Some(&json!({"message": "boom"})));
}

#[tokio::test]
async fn test_no_content_yields_empty_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/DataSystem"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result = client.data_system().system_info().await.unwrap();
    assert!(result.is_empty());
    assert!(result.extra.is_empty());
}

#[tokio::test]
async fn test_plain_text_body_is_wrapped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let value = client.base().get("Ping", &[]).await.unwrap();
    assert_eq!(value, json!({"message": "hello"}));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client =
        WfrmlsClient::new(Some(SecretString::from("t")), Some("http://127.0.0.1:1/odata")).unwrap();

    let err = client.office().list(&ODataQuery::new()).await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }), "{err:?}");
    assert!(err.to_string().starts_with("Network error:"));
}

// ── Convenience filters ─────────────────────────────────────────────

#[tokio::test]
async fn test_convenience_filter_precedes_caller_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param("$filter", "StandardStatus eq 'Active' and X eq 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    client
        .property()
        .active(ODataQuery::new().filter("X eq 1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_office_name_and_postal_code_filters() {
    let (server, client) = setup().await;
    mount_expecting(
        &server,
        "Office",
        &[(
            "$filter",
            "contains(OfficeName, 'O''Neil Realty') \
             and (OfficeCity eq 'Ogden' or OfficeCity eq 'Provo')",
        )],
    )
    .await;
    mount_expecting(
        &server,
        "Office",
        &[("$filter", "OfficePostalCode eq '84401' and OfficeStatus eq 'Active'")],
    )
    .await;

    let office = client.office();
    office
        .by_name(
            "O'Neil Realty",
            ODataQuery::new().filter("OfficeCity eq 'Ogden' or OfficeCity eq 'Provo'"),
        )
        .await
        .unwrap();
    office
        .by_postal_code("84401", ODataQuery::new().filter("OfficeStatus eq 'Active'"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lookup_filters_and_name_listing() {
    let (server, client) = setup().await;
    mount_expecting(
        &server,
        "Lookup",
        &[("$filter", "StandardLookupValue ne null and LookupName eq 'City'")],
    )
    .await;
    mount_expecting(&server, "Lookup", &[("$filter", "IsActive eq true"), ("$top", "25")]).await;
    mount_expecting(
        &server,
        "Lookup",
        &[("$select", "LookupName"), ("$orderby", "LookupName asc")],
    )
    .await;

    let lookup = client.lookup();
    lookup
        .standard(ODataQuery::new().filter("LookupName eq 'City'"))
        .await
        .unwrap();
    lookup.active(ODataQuery::new().top(25)).await.unwrap();
    lookup.names().await.unwrap();
}

#[tokio::test]
async fn test_adu_status_uses_api_spelling() {
    let (server, client) = setup().await;
    mount_expecting(
        &server,
        "Adu",
        &[("$filter", "AduStatus eq 'Under Construction' and AduType eq 'Detached'")],
    )
    .await;

    client
        .adu()
        .by_status(
            AduStatus::UnderConstruction,
            ODataQuery::new().filter("AduType eq 'Detached'"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_resource_info_by_name_and_fields() {
    let (server, client) = setup().await;
    mount_expecting(
        &server,
        "Resource",
        &[("$filter", "ResourceName eq 'Property' and StandardName ne null")],
    )
    .await;
    mount_expecting(&server, "Resource", &[("$expand", "Fields")]).await;

    let resource = client.resource();
    resource
        .by_name("Property", ODataQuery::new().filter("StandardName ne null"))
        .await
        .unwrap();
    resource.with_fields(ODataQuery::new()).await.unwrap();
}

#[tokio::test]
async fn test_data_system_info_reads_first_ten() {
    let (server, client) = setup().await;
    mount_expecting(&server, "DataSystem", &[("$top", "10")]).await;

    client.data_system().system_info().await.unwrap();
}

#[tokio::test]
async fn test_modified_since_uses_quoted_utc_timestamp() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Office"))
        .and(query_param(
            "$filter",
            "ModificationTimestamp gt '2024-06-01T08:30:00Z' and OfficeCity eq 'Ogden'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"OfficeKey": "O1"}]))))
        .expect(1)
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
    let result = client
        .office()
        .modified_since(since, ODataQuery::new().filter("OfficeCity eq 'Ogden'"))
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_search_and_expand_helpers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param(
            "$filter",
            "StandardStatus eq 'Pending' and City eq 'Park City'",
        ))
        .and(query_param("$expand", "Media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let search = PropertySearch {
        status: Some(PropertyStatus::Pending),
        city: Some("Park City".into()),
        ..PropertySearch::default()
    };
    client
        .property()
        .search(&search, ODataQuery::new().expand("Media"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_media_urls_in_display_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Media"))
        .and(query_param(
            "$filter",
            "ResourceRecordKeyNumeric eq 1611952 and MediaType eq 'Photo'",
        ))
        .and(query_param("$select", "MediaURL"))
        .and(query_param("$orderby", "Order asc"))
        .and(query_param("$top", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"MediaURL": "https://cdn.test/1.jpg"},
            {"MediaKey": "no-url"},
            {"MediaURL": "https://cdn.test/2.jpg"},
        ]))))
        .mount(&server)
        .await;

    let urls = client
        .media()
        .photo_urls(1_611_952, Some(MediaType::Photo))
        .await
        .unwrap();
    assert_eq!(urls, vec!["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"]);
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_all_walks_skip_until_short_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param("$top", "2"))
        .and(query_param("$skip", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([{"ListingKey": "1"}, {"ListingKey": "2"}]))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/odata/Property"))
        .and(query_param("$top", "2"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"ListingKey": "3"}]))))
        .mount(&server)
        .await;

    let result = client
        .property()
        .list_all(ODataQuery::new(), 2, None)
        .await
        .unwrap();

    assert_eq!(result.value.len(), 3);
    assert_eq!(result.pagination_info.pages_fetched, 2);
    assert_eq!(result.pagination_info.total_records, 3);
    assert_eq!(result.pagination_info.last_skip, 2);
}

#[tokio::test]
async fn test_list_all_respects_max_pages() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Member"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"MemberKey": "a"}]))),
        )
        .expect(3)
        .mount(&server)
        .await;

    let result = client
        .member()
        .list_all(ODataQuery::new(), 1, Some(3))
        .await
        .unwrap();
    assert_eq!(result.pagination_info.pages_fetched, 3);
    assert_eq!(result.value.len(), 3);
}

// ── Deletion fan-out ────────────────────────────────────────────────

#[tokio::test]
async fn test_deleted_fan_out_survives_one_failing_resource() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Deleted"))
        .and(query_param(
            "$filter",
            "DeletedDateTime gt '2024-01-01T00:00:00Z' and ResourceName eq 'Property'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"ResourceName": "Property", "ResourceRecordKey": "A"},
            {"ResourceName": "Property", "ResourceRecordKey": "B"},
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/odata/Deleted"))
        .and(query_param(
            "$filter",
            "DeletedDateTime gt '2024-01-01T00:00:00Z' and ResourceName eq 'Member'",
        ))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "down"})))
        .mount(&server)
        .await;

    let since = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let sync = client
        .deleted()
        .all_deleted_for_sync(
            since,
            Some(&[ResourceName::Property, ResourceName::Member]),
            &ODataQuery::new(),
        )
        .await;

    assert_eq!(sync.by_resource["Property"].len(), 2);
    assert!(sync.by_resource["Member"].is_empty());
    assert_eq!(sync.value.len(), 2);
    assert_eq!(sync.sync_info.total_deleted_records, 2);
    assert_eq!(sync.sync_info.resource_types_checked, 2);
    assert_eq!(sync.sync_info.resources_with_deletions, 1);
    assert_eq!(sync.sync_info.since_timestamp, "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_deletion_summary_counts_per_resource() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/Deleted"))
        .and(query_param("$filter", "DeletedDateTime gt '2024-02-01T00:00:00Z'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"ResourceName": "Media", "DeletedDateTime": "2024-02-02T00:00:00Z"},
            {"ResourceName": "Media", "DeletedDateTime": "2024-02-03T00:00:00Z"},
            {"ResourceName": "Office", "DeletedDateTime": "2024-02-02T00:00:00Z"},
        ]))))
        .mount(&server)
        .await;

    let summary = client
        .deleted()
        .deletion_summary("2024-02-01T00:00:00Z", ODataQuery::new())
        .await
        .unwrap();

    assert_eq!(summary.summary.total_deletions, 3);
    assert_eq!(summary.summary.by_resource_count["Media"], 2);
    assert_eq!(
        summary.summary.by_resource_latest["Media"],
        "2024-02-03T00:00:00Z"
    );
}

// ── Metadata ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_metadata_requests_xml() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/odata/$metadata"))
        .and(header("accept", "application/xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<edmx:Edmx Version=\"4.0\"/>"),
        )
        .mount(&server)
        .await;

    let xml = client.metadata().await.unwrap();
    assert!(xml.starts_with("<edmx:Edmx"));
}
