//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small catalog and run the full
//! harvest cycle end-to-end against a temporary output directory.

use romstash::config::Config;
use romstash::crawler::{run_harvest, RomRecord, RunOptions};
use romstash::output::{AssetClass, NoProgress, ProgressTally};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration for the mock catalog
fn create_test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.fetcher.base_url = base_url.to_string();
    config.fetcher.timeout_secs = 5;
    config.fetcher.max_attempts = 2;
    config.fetcher.user_agent = "TestHarvester/1.0".to_string();
    config.pipeline.max_concurrent_requests = 4;
    config.output.directory = output.to_path_buf();
    config.catalog.emulators = vec!["nes".to_string()];
    config
}

fn tile(slug: &str, title: &str) -> String {
    format!(
        r#"<div class="thumbnail-home">
             <div class="imgCon"><img data-src="/thumbs/{0}.png"></div>
             <div class="infoBox"><a href="/roms/nes/{0}">{1}</a></div>
             <span class="emulator">NES</span>
             <a rel="tag" href="/genre/classic">Classic</a>
           </div>"#,
        slug, title
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_bytes(server: &MockServer, route: &str, body: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

/// Serves a two-page NES catalog: Mario with full details, Zelda whose
/// detail page is gone. Every cacheable route answers exactly `times`
/// requests.
async fn mount_catalog(server: &MockServer, times: u64) {
    let base_url = server.uri();

    mount_html(
        server,
        "/roms/nes",
        r#"<ul>
             <li class="page-item"><a href="/roms/nes/page/1">1</a></li>
             <li class="page-item"><a href="/roms/nes/page/2">Last</a></li>
           </ul>"#
            .to_string(),
        times,
    )
    .await;
    mount_html(server, "/roms/nes/page/1", tile("mario", "Super Mario Bros"), times).await;
    mount_html(server, "/roms/nes/page/2", tile("zelda", "Zelda"), times).await;
    mount_html(
        server,
        "/roms/nes/mario",
        r#"<div itemscope>
             <img itemprop="image" src="/images/mario.jpg">
             <a itemprop="downloadUrl" href="/download/mario">Download</a>
             <span itemprop="genre">Platform</span>
           </div>"#
            .to_string(),
        times,
    )
    .await;
    mount_html(
        server,
        "/download/mario",
        format!(
            r#"<a href="/">Home</a><a rel="nofollow" href="{}/files/mario.zip">Start</a>"#,
            base_url
        ),
        times,
    )
    .await;

    mount_bytes(server, "/thumbs/mario.png", b"mario-thumb", times).await;
    mount_bytes(server, "/thumbs/zelda.png", b"zelda-thumb", times).await;
    mount_bytes(server, "/images/mario.jpg", b"mario-cover", times).await;
    mount_bytes(server, "/files/mario.zip", b"PK\x03\x04mario", times).await;
}

fn read_records(output: &Path) -> Vec<RomRecord> {
    let bytes = std::fs::read(output.join("roms.json")).expect("record file written");
    serde_json::from_slice(&bytes).expect("record file is valid JSON")
}

#[tokio::test]
async fn test_full_harvest_single_emulator() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, 1).await;

    // Detail page that no longer exists
    Mock::given(method("GET"))
        .and(path("/roms/nes/zelda"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    let config = create_test_config(&mock_server.uri(), &output);

    let summary = run_harvest(config, Arc::new(NoProgress), RunOptions::default())
        .await
        .expect("harvest succeeds");

    assert_eq!(summary.emulators, vec!["nes"]);
    assert_eq!(summary.listing_pages, 2);
    assert_eq!(summary.listing_pages_missing, 0);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.details_missing, 1);
    assert!(summary.finished_at.is_some());

    // Records follow page order and keep tiles without details
    let records = read_records(&output);
    assert_eq!(records.len(), 2);

    let mario = &records[0];
    assert_eq!(mario.id.as_deref(), Some("mario"));
    assert_eq!(mario.title.as_deref(), Some("Super Mario Bros"));
    assert_eq!(mario.emulator, "NES");
    assert_eq!(mario.tags.len(), 1);
    assert_eq!(mario.image(), Some("/images/mario.jpg"));
    assert_eq!(mario.download_url(), Some("/download/mario"));
    assert_eq!(mario.extras.get("genre").map(String::as_str), Some("Platform"));

    let zelda = &records[1];
    assert_eq!(zelda.id.as_deref(), Some("zelda"));
    assert!(zelda.extras.is_empty());

    // Assets land in their class directories, named after the URL
    assert_eq!(
        std::fs::read(output.join("thumbs").join("mario.png")).unwrap(),
        b"mario-thumb"
    );
    assert_eq!(
        std::fs::read(output.join("thumbs").join("zelda.png")).unwrap(),
        b"zelda-thumb"
    );
    assert_eq!(
        std::fs::read(output.join("images").join("mario.jpg")).unwrap(),
        b"mario-cover"
    );
    assert_eq!(
        std::fs::read(output.join("roms").join("mario.zip")).unwrap(),
        b"PK\x03\x04mario"
    );

    let thumbs = summary.assets[&AssetClass::Thumbnails];
    assert_eq!(thumbs.scheduled, 2);
    assert_eq!(thumbs.downloaded, 2);
    assert_eq!(summary.assets[&AssetClass::Images].downloaded, 1);
    assert_eq!(summary.assets[&AssetClass::Roms].downloaded, 1);

    // Listing and detail pages are cached under the output directory
    assert!(output.join("tmp").read_dir().unwrap().count() >= 4);
}

#[tokio::test]
async fn test_second_run_uses_cache() {
    let mock_server = MockServer::start().await;
    // Each cached route is requested once across both runs
    mount_catalog(&mock_server, 1).await;

    // Absent units are never cached, so this one is asked for again
    Mock::given(method("GET"))
        .and(path("/roms/nes/zelda"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");

    let first = run_harvest(
        create_test_config(&mock_server.uri(), &output),
        Arc::new(NoProgress),
        RunOptions::default(),
    )
    .await
    .unwrap();
    let first_records = std::fs::read(output.join("roms.json")).unwrap();

    let second = run_harvest(
        create_test_config(&mock_server.uri(), &output),
        Arc::new(NoProgress),
        RunOptions::default(),
    )
    .await
    .unwrap();
    let second_records = std::fs::read(output.join("roms.json")).unwrap();

    assert_eq!(first_records, second_records);
    assert_eq!(first.records, second.records);

    let thumbs = second.assets[&AssetClass::Thumbnails];
    assert_eq!(thumbs.downloaded, 0);
    assert_eq!(thumbs.already_present, 2);
    assert_eq!(second.assets[&AssetClass::Roms].already_present, 1);
    assert_eq!(second.pipeline.fetched, 0);
    assert_eq!(second.pipeline.requests, 1);
}

#[tokio::test]
async fn test_metadata_only_skips_downloads() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/roms/nes",
        "<html><body>No pagination</body></html>".to_string(),
        1,
    )
    .await;
    mount_html(&mock_server, "/roms/nes/page/1", tile("mario", "Mario"), 1).await;
    mount_html(
        &mock_server,
        "/roms/nes/mario",
        r#"<img itemprop="image" src="/images/mario.jpg">"#.to_string(),
        1,
    )
    .await;
    mount_bytes(&mock_server, "/thumbs/mario.png", b"thumb", 0).await;
    mount_bytes(&mock_server, "/images/mario.jpg", b"cover", 0).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    let progress = Arc::new(ProgressTally::new());

    let summary = run_harvest(
        create_test_config(&mock_server.uri(), &output),
        progress.clone(),
        RunOptions {
            download_assets: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.records, 1);
    assert!(summary.assets.is_empty());
    assert_eq!(read_records(&output).len(), 1);
    assert!(!output.join("thumbs").join("mario.png").exists());

    // One listing batch and one detail batch
    assert_eq!(progress.batches(), 2);
    assert_eq!(progress.completed(), 2);
    assert_eq!(progress.finished(), 2);
}

#[tokio::test]
async fn test_emulator_discovery() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/roms",
        r#"<div class="infoBox"><a href="/roms/snes">SNES</a></div>"#.to_string(),
        1,
    )
    .await;
    mount_html(&mock_server, "/roms/snes", "<p>one page</p>".to_string(), 1).await;
    mount_html(
        &mock_server,
        "/roms/snes/page/1",
        r#"<div class="thumbnail-home"><div class="infoBox"><a href="/roms/snes/contra">Contra</a></div></div>"#
            .to_string(),
        1,
    )
    .await;
    mount_html(&mock_server, "/roms/snes/contra", "<p>no details</p>".to_string(), 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    let mut config = create_test_config(&mock_server.uri(), &output);
    config.catalog.emulators.clear();
    config.catalog.discover_emulators = true;

    let summary = run_harvest(
        config,
        Arc::new(NoProgress),
        RunOptions {
            download_assets: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.emulators, vec!["snes"]);
    let records = read_records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Contra"));
}

#[tokio::test]
async fn test_unavailable_catalog_still_writes_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");

    let summary = run_harvest(
        create_test_config(&mock_server.uri(), &output),
        Arc::new(NoProgress),
        RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records, 0);
    assert_eq!(summary.listing_pages_missing, 1);
    assert!(read_records(&output).is_empty());
    assert_eq!(summary.assets[&AssetClass::Roms].scheduled, 0);
}

#[tokio::test]
async fn test_shared_assets_are_downloaded_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let shared_tile = |slug: &str| {
        format!(
            r#"<div class="thumbnail-home">
                 <div class="imgCon"><img src="/thumbs/shared.png"></div>
                 <div class="infoBox"><a href="/roms/nes/{0}">{0}</a></div>
               </div>"#,
            slug
        )
    };

    mount_html(&mock_server, "/roms/nes", "<p>one page</p>".to_string(), 1).await;
    mount_html(
        &mock_server,
        "/roms/nes/page/1",
        shared_tile("a") + &shared_tile("b") + &shared_tile("c"),
        1,
    )
    .await;

    // a and b point at the same download page; c's mirror redirects to the same file
    let details = [
        ("a", "/download/shared"),
        ("b", "/download/shared"),
        ("c", "/download/mirror"),
    ];
    for (slug, download) in details {
        mount_html(
            &mock_server,
            &format!("/roms/nes/{}", slug),
            format!(
                r#"<img itemprop="image" src="/images/{}.jpg">
                   <a itemprop="downloadUrl" href="{}">Download</a>"#,
                slug, download
            ),
            1,
        )
        .await;
        mount_bytes(&mock_server, &format!("/images/{}.jpg", slug), b"cover", 1).await;
    }

    let redirect = format!(
        r#"<a rel="nofollow" href="{}/files/shared.zip">Start</a>"#,
        base_url
    );
    mount_html(&mock_server, "/download/shared", redirect.clone(), 1).await;
    mount_html(&mock_server, "/download/mirror", redirect, 1).await;
    mount_bytes(&mock_server, "/thumbs/shared.png", b"thumb", 1).await;
    mount_bytes(&mock_server, "/files/shared.zip", b"PK\x03\x04", 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");

    let summary = run_harvest(
        create_test_config(&base_url, &output),
        Arc::new(NoProgress),
        RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records, 3);

    let thumbs = summary.assets[&AssetClass::Thumbnails];
    assert_eq!(thumbs.scheduled, 1);
    assert_eq!(thumbs.downloaded, 1);

    assert_eq!(summary.assets[&AssetClass::Images].scheduled, 3);

    let roms = summary.assets[&AssetClass::Roms];
    assert_eq!(roms.scheduled, 1);
    assert_eq!(roms.downloaded, 1);
    assert!(output.join("roms").join("shared.zip").is_file());
}
