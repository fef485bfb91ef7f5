use std::sync::Arc;
use std::time::Duration;

use image_harvester::config::HarvestConfig;
use image_harvester::discovery::dedupe_and_store;
use image_harvester::harvester::ImageHarvester;
use image_harvester::models::ResourceHandle;
use image_harvester::scraper::HttpClient;
use image_harvester::scrapers::odp::OdpScraper;
use image_harvester::storage::DirectoryStorage;
use image_harvester::traits::Fetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_image(server: &MockServer, image_path: &str, body: &[u8], content_type: &str) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), content_type))
        .mount(server)
        .await;
}

fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), None).unwrap()
}

#[tokio::test]
async fn fetcher_returns_bytes_and_content_type() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/a", b"png-bytes", "image/png").await;

    let resource = http().fetch(&format!("{}/img/a", server.uri())).await.unwrap();

    assert_eq!(resource.bytes, b"png-bytes");
    assert_eq!(resource.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = http().fetch(&format!("{}/img/missing", server.uri())).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn identical_content_is_stored_once() {
    let server = MockServer::start().await;
    // Four URLs, two distinct pictures, one broken link.
    mount_image(&server, "/products/1/1_o01_a/1", b"front", "image/jpeg").await;
    mount_image(&server, "/products/1/1_o02_a/1", b"back", "image/png").await;
    mount_image(&server, "/products/1/1_o03_a/1", b"front", "image/jpeg").await;
    mount_image(&server, "/products/1/1_o04_a/1", b"back", "image/png").await;
    Mock::given(method("GET"))
        .and(path("/products/1/1_o05_a/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let handles: Vec<_> = (1..=5)
        .map(|i| ResourceHandle::new(format!("{}/products/1/1_o{i:02}_a/1", server.uri())))
        .collect();
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(DirectoryStorage::new(dir.path()));

    let records = dedupe_and_store(&handles, &http(), storage, 3).await;

    assert_eq!(records.len(), 2);
    let mut hashes: Vec<_> = records.iter().map(|r| r.hash_hex()).collect();
    hashes.sort();
    hashes.dedup();
    assert_eq!(hashes.len(), 2);
    assert_eq!(records[0].stored_name, format!("image_01.{}", records[0].extension));
    assert_eq!(records[1].stored_name, format!("image_02.{}", records[1].extension));
    for record in &records {
        assert!(dir.path().join(&record.stored_name).exists());
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn sequential_download_names_follow_handle_order() {
    let server = MockServer::start().await;
    mount_image(&server, "/products/1/1_o01_a/1", b"front", "image/jpeg").await;
    mount_image(&server, "/products/1/1_o02_a/1", b"side", "image/webp").await;

    let handles: Vec<_> = (1..=2)
        .map(|i| ResourceHandle::new(format!("{}/products/1/1_o{i:02}_a/1", server.uri())))
        .collect();
    let dir = tempfile::tempdir().unwrap();

    let records = dedupe_and_store(&handles, &http(), Arc::new(DirectoryStorage::new(dir.path())), 1).await;

    let names: Vec<_> = records.iter().map(|r| r.stored_name.as_str()).collect();
    assert_eq!(names, ["image_01.jpg", "image_02.webp"]);
}

#[tokio::test]
async fn harvests_a_product_page_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();
    let page = format!(
        r#"<html><body>
          <div class="image-gallery-slide center"><img src="{base}/products/4852038/4852038_o01_072821/4852038?w=450"></div>
          <div class="image-gallery-slide"><img src="{base}/products/4852038/4852038_o02_072821/4852038?w=450"></div>
          <div class="image-gallery-slide"><img src="{base}/products/4852038/4852038_o01_072821/4852038?w=900"></div>
          <span data-auid="ImageGalleryScrollRightIcon"></span>
          <div class="image-gallery-thumbnails-container">
            <div class="image-gallery-thumbnail"><img src="{base}/products/4852038/4852038_p03_072821/4852038"></div>
          </div>
        </body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/a/products/4852038/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
        .mount(&server)
        .await;
    mount_image(&server, "/products/4852038/4852038_o01_072821/4852038", b"front", "image/jpeg").await;
    mount_image(&server, "/products/4852038/4852038_o02_072821/4852038", b"back", "image/jpeg").await;
    // The original of the third thumbnail is byte-identical to the first image.
    mount_image(&server, "/products/4852038/4852038_o03_072821/4852038", b"front", "image/jpeg").await;

    let output = tempfile::tempdir().unwrap();
    let output_dir = output.path().display().to_string();
    let config = HarvestConfig::from_lookup(|key| match key {
        "HARVEST_OUTPUT_DIR" => Some(output_dir.clone()),
        "DOWNLOAD_CONCURRENCY" => Some("1".to_string()),
        _ => None,
    });
    let http = http();
    let harvester = ImageHarvester::new(OdpScraper::new(http.clone()), http, config);

    let manifest = harvester
        .harvest_product(&format!("{base}/a/products/4852038/"))
        .await
        .unwrap();

    assert_eq!(manifest.product_id, "4852038");
    assert_eq!(manifest.total_images, 3);
    assert_eq!(manifest.actual_images_saved, 2);
    assert!(manifest.image_urls[2].contains("_o03_"));

    let folder = output.path().join("4852038");
    assert!(folder.join("image_01.jpg").exists());
    assert!(folder.join("image_02.jpg").exists());

    let written = std::fs::read_to_string(output.path().join("4852038.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["actual_images_saved"], 2);
    assert_eq!(
        json["downloaded_images"][0]["content_hash"],
        format!("{:x}", md5::compute(b"front"))
    );
}

#[tokio::test]
async fn failing_product_does_not_stop_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/products/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let output_dir = output.path().display().to_string();
    let config = HarvestConfig::from_lookup(|key| match key {
        "HARVEST_OUTPUT_DIR" => Some(output_dir.clone()),
        "REQUEST_DELAY_MS" => Some("0".to_string()),
        _ => None,
    });
    let http = http();
    let harvester = ImageHarvester::new(OdpScraper::new(http.clone()), http, config);

    let urls = vec![
        format!("{}/a/products/1/", server.uri()),
        format!("{}/a/products/2/", server.uri()),
    ];
    let manifests = harvester.harvest_all(&urls).await;

    assert!(manifests.is_empty());
}
