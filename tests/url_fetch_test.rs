//! URL-sourced conversion and HTTP response caching.

use assert_matches::assert_matches;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assetforge::convert::{AssetConverter, ConverterOptions};
use assetforge::source::{AssetLocation, AssetRef, CachedHttpFetcher, UrlFetcher};
use assetforge::ConvertError;

fn webp_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(b"WEBP");
    bytes.extend_from_slice(b"VP8 payload bytes");
    bytes
}

fn converter(scratch: &std::path::Path) -> AssetConverter {
    AssetConverter::new(ConverterOptions {
        scratch_dir: scratch.to_path_buf(),
        ..Default::default()
    })
}

#[tokio::test]
async fn repeated_fetches_prefer_cached_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = CachedHttpFetcher::new();
    let url = format!("{}/img.bin", server.uri());

    let first = fetcher.fetch(&url).await.unwrap();
    // Second fetch must be served from cache; the mock allows one request.
    let second = fetcher.fetch(&url).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_ref(), b"payload");
}

#[tokio::test]
async fn url_image_with_webp_signature_is_kept_verbatim() {
    let server = MockServer::start().await;
    let body = webp_bytes();
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let converter = converter(dir.path());
    let url = format!("{}/photo.jpg", server.uri());

    let selection = converter
        .convert(AssetRef::image(AssetLocation::Url(url.clone())))
        .await
        .unwrap();

    let image = selection.as_image().unwrap();
    assert!(image.id.ends_with(".webp"));
    assert_eq!(image.encoded, body);
    assert_eq!(image.source_path.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn http_failure_surfaces_as_source_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let converter = converter(dir.path());
    let url = format!("{}/missing.jpg", server.uri());

    let err = converter
        .convert(AssetRef::image(AssetLocation::Url(url)))
        .await
        .unwrap_err();
    assert_matches!(err, ConvertError::Source(_));
}
