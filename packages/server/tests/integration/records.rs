use serde_json::json;

use crate::common::{FormFields, TestApp, routes};

/// Minimal PNG signature followed by filler bytes.
fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend(std::iter::repeat_n(7u8, 256));
    bytes
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::RETRIEVE_ALL).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn form_insert_then_retrieve() {
    let app = TestApp::spawn().await;

    let created = app.create_record("8801", None).await;
    assert_eq!(created["message"], "Record inserted successfully");
    assert_eq!(created["barcode"], "8801");
    assert!(created["id"].is_string());
    assert!(created["file_id"].is_null());

    let res = app.get(&routes::retrieve("8801")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["barcode"], "8801");
    assert_eq!(res.body["_id"], created["id"]);
    assert_eq!(res.body["meta"]["cow_id"], "C-1");
    assert_eq!(res.body["meta"]["breed"], "Hanwoo");
    assert_eq!(res.body["meta"]["weight"], 450);
    assert!(res.body["meta"]["timestamp"].is_string());
    assert_eq!(res.body["data"], json!([]));
}

#[tokio::test]
async fn blank_form_fields_take_defaults() {
    let app = TestApp::spawn().await;

    let fields = FormFields {
        cow_id: Some(""),
        weight: Some("  "),
        ..Default::default()
    };
    let res = app.upload("8802", fields, None).await;
    assert_eq!(res.status, 200, "{:?}", res.body);

    let res = app.get(&routes::retrieve("8802")).await;
    assert_eq!(res.body["meta"]["cow_id"], "Unknown");
    assert_eq!(res.body["meta"]["birth_date"], "Unknown");
    assert_eq!(res.body["meta"]["breed"], "Unknown");
    assert_eq!(res.body["meta"]["weight"], 0);
}

#[tokio::test]
async fn non_numeric_weight_is_rejected() {
    let app = TestApp::spawn().await;

    let fields = FormFields {
        weight: Some("heavy"),
        ..Default::default()
    };
    let res = app.upload("8803", fields, Some(("cow.png", png_bytes()))).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let res = app.get(&routes::retrieve("8803")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn duplicate_form_insert_is_rejected() {
    let app = TestApp::spawn().await;

    app.create_record("8804", None).await;
    let res = app.upload("8804", FormFields::default(), None).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "BARCODE_TAKEN");

    let all = app.get(routes::RETRIEVE_ALL).await;
    assert_eq!(all.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn image_round_trip() {
    let app = TestApp::spawn().await;
    let image = png_bytes();

    let created = app
        .create_record("8805", Some(("cow.png", image.clone())))
        .await;
    let file_id = created["file_id"].as_str().expect("file_id").to_string();

    let record = app.get(&routes::retrieve("8805")).await;
    assert_eq!(record.body["data"][0]["type"], "blob");
    assert_eq!(record.body["data"][0]["file_id"], file_id.as_str());
    assert_eq!(
        record.body["data"][0]["description"],
        "Image for barcode 8805"
    );

    let res = app.get(&routes::retrieve_image("8805")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type.as_deref(), Some("image/png"));
    assert_eq!(res.bytes, image);

    let res = app.get(&routes::stream_image(&file_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, image);
}

#[tokio::test]
async fn image_lookup_failures_are_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::retrieve_image("missing")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Data not found for this barcode.");

    app.post_json(routes::INSERT_JSON, &json!({"barcode": "no-data"}))
        .await;
    let res = app.get(&routes::retrieve_image("no-data")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "No data field found for this barcode.");

    app.create_record("no-image", None).await;
    let res = app.get(&routes::retrieve_image("no-image")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "No image found in data field.");

    app.post_json(
        routes::INSERT_JSON,
        &json!({
            "barcode": "dangling",
            "data": [{"type": "blob", "file_id": "0192f0c4-6a1e-7c3b-9d2e-5f4a3b2c1d0e"}]
        }),
    )
    .await;
    let res = app.get(&routes::retrieve_image("dangling")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn stream_image_rejects_unknown_ids() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::stream_image("not-an-id")).await;
    assert_eq!(res.status, 404);

    let res = app
        .get(&routes::stream_image("0192f0c4-6a1e-7c3b-9d2e-5f4a3b2c1d0e"))
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn raw_insert_is_stored_verbatim() {
    let app = TestApp::spawn().await;

    let doc = json!({
        "_id": {"$oid": "65a1b2c3d4e5f6a7b8c9d0e1"},
        "barcode": "raw-1",
        "meta": {"breed": "Jersey"},
        "source": "scanner",
        "data": [{"type": "note", "text": "hello"}]
    });
    let res = app.post_json(routes::INSERT_JSON, &doc).await;
    assert_eq!(res.status, 200, "{:?}", res.body);
    assert_ne!(res.body["_id"], "65a1b2c3d4e5f6a7b8c9d0e1");

    let res = app.get(&routes::retrieve("raw-1")).await;
    assert_eq!(res.body["meta"], json!({"breed": "Jersey"}));
    assert_eq!(res.body["source"], "scanner");
    assert_eq!(res.body["data"][0]["text"], "hello");
    assert!(res.body["meta"].get("cow_id").is_none());
}

#[tokio::test]
async fn raw_insert_keeps_explicit_nulls() {
    let app = TestApp::spawn().await;

    let res = app
        .post_json(
            routes::INSERT_JSON,
            &json!({"barcode": "nulls", "meta": {}, "data": null}),
        )
        .await;
    assert_eq!(res.status, 200, "{:?}", res.body);
    assert!(res.body["data"].is_null());
    assert!(res.body.get("data").is_some());

    let all = app.get(routes::RETRIEVE_ALL).await;
    assert!(all.body[0].get("data").is_some_and(|d| d.is_null()));
    assert_eq!(all.body[0]["meta"], json!({}));
}

#[tokio::test]
async fn upload_without_barcode_is_structured_error() {
    let app = TestApp::spawn().await;

    let form = reqwest::multipart::Form::new().text("cow_id", "C-1");
    let res = app
        .client
        .post(format!("http://{}/upload_image_gridfs", app.addr))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send multipart upload request");
    let res = crate::common::TestResponse::from_response(res).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    assert!(res.body["message"].is_string());
}

#[tokio::test]
async fn raw_insert_validation_and_conflict() {
    let app = TestApp::spawn().await;

    let res = app.post_json(routes::INSERT_JSON, &json!([1, 2])).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let res = app
        .post_json(routes::INSERT_JSON, &json!({"meta": {}}))
        .await;
    assert_eq!(res.status, 400);

    let doc = json!({"barcode": "raw-2"});
    assert_eq!(app.post_json(routes::INSERT_JSON, &doc).await.status, 200);
    let res = app.post_json(routes::INSERT_JSON, &doc).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "BARCODE_TAKEN");
}

#[tokio::test]
async fn missing_meta_gets_placeholder_on_single_read_only() {
    let app = TestApp::spawn().await;

    app.post_json(routes::INSERT_JSON, &json!({"barcode": "bare"}))
        .await;

    let res = app.get(&routes::retrieve("bare")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["meta"], json!({"message": "No metadata available"}));

    let all = app.get(routes::RETRIEVE_ALL).await;
    assert!(all.body[0].get("meta").is_none());
}

#[tokio::test]
async fn retrieve_unknown_barcode() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::retrieve("nope")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn delete_removes_record_but_keeps_blob() {
    let app = TestApp::spawn().await;

    let created = app
        .create_record("8806", Some(("cow.png", png_bytes())))
        .await;
    let file_id = created["file_id"].as_str().expect("file_id").to_string();

    let res = app.delete(&routes::delete("8806")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["deleted_count"], 1);

    assert_eq!(app.get(&routes::retrieve("8806")).await.status, 404);
    assert_eq!(app.get(&routes::stream_image(&file_id)).await.status, 200);

    let res = app.delete(&routes::delete("8806")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn list_preserves_insertion_order() {
    let app = TestApp::spawn().await;

    for barcode in ["b", "a", "c"] {
        app.create_record(barcode, None).await;
    }

    let res = app.get(routes::RETRIEVE_ALL).await;
    let barcodes: Vec<&str> = res
        .body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["barcode"].as_str())
        .collect();
    assert_eq!(barcodes, ["b", "a", "c"]);
}

#[tokio::test]
async fn test_store_reports_first_record() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::TEST_STORE).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "success");
    assert!(res.body["data"].is_null());

    app.create_record("first", None).await;
    app.create_record("second", None).await;

    let res = app.get(routes::TEST_STORE).await;
    assert_eq!(res.body["data"]["barcode"], "first");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get("/api-docs/openapi.json").await;
    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/retrieve/{barcode}"].is_object());
    assert!(res.body["paths"]["/upload_image_gridfs"].is_object());
}
