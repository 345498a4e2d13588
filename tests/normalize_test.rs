//! End-to-end image conversion scenarios.

use assert_matches::assert_matches;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use assetforge::convert::{AssetConverter, ConverterOptions};
use assetforge::source::{AssetLocation, AssetRef};
use assetforge::ConvertError;
use image::{DynamicImage, ImageFormat, RgbImage};

fn converter(scratch: &Path) -> AssetConverter {
    let options = ConverterOptions {
        scratch_dir: scratch.to_path_buf(),
        ..Default::default()
    };
    AssetConverter::new(options)
}

fn jpeg_file(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbImage::from_pixel(width, height, image::Rgb([180, 60, 20]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, buf.into_inner()).unwrap();
    path
}

#[tokio::test]
async fn oversized_jpeg_is_downsampled_and_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = jpeg_file(dir.path(), "photo.jpg", 3000, 2000);

    let converter = converter(dir.path());
    let selection = converter
        .convert(AssetRef::image(AssetLocation::File(path)))
        .await
        .unwrap();

    let image = selection.as_image().unwrap();
    assert!(image.id.ends_with(".jpg"));
    assert!(image.is_valid());

    let decoded = image.decoded.as_ref().unwrap();
    assert_eq!(decoded.width(), 2048);
    assert_eq!(decoded.height(), 1365);

    // The decoded handle landed in the image cache under the selection id.
    assert!(converter.image_cache().get(&image.id).is_some());
}

#[tokio::test]
async fn small_jpeg_is_reencoded_without_resizing() {
    let dir = tempfile::tempdir().unwrap();
    let path = jpeg_file(dir.path(), "small.jpg", 320, 240);

    let converter = converter(dir.path());
    let selection = converter
        .convert(AssetRef::image(AssetLocation::File(path)))
        .await
        .unwrap();

    let image = selection.as_image().unwrap();
    assert!(image.id.ends_with(".jpg"));
    let decoded = image.decoded.as_ref().unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
}

#[tokio::test]
async fn mislabeled_webp_bytes_pass_through_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(b"WEBP");
    bytes.extend_from_slice(b"VP8 payload bytes");
    // Deliberately mislabeled extension: the signature must win.
    let path = dir.path().join("picture.jpg");
    std::fs::write(&path, &bytes).unwrap();

    let converter = converter(dir.path());
    let selection = converter
        .convert(AssetRef::image(AssetLocation::File(path)))
        .await
        .unwrap();

    let image = selection.as_image().unwrap();
    assert!(image.id.ends_with(".webp"));
    assert_eq!(image.encoded, bytes);
}

#[tokio::test]
async fn animated_gif_keeps_original_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let mut raw = Vec::new();
    {
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut raw);
        let frame = image::Frame::new(image::RgbaImage::from_pixel(
            6,
            6,
            image::Rgba([255, 0, 255, 255]),
        ));
        encoder.encode_frame(frame).unwrap();
    }
    let path = dir.path().join("anim.gif");
    std::fs::write(&path, &raw).unwrap();

    let converter = converter(dir.path());
    let selection = converter
        .convert(AssetRef::image(AssetLocation::File(path)))
        .await
        .unwrap();

    let image = selection.as_image().unwrap();
    assert!(image.id.ends_with(".gif"));
    assert_eq!(image.encoded, raw);
    // A representative frame is still decoded and cached.
    assert!(image.decoded.is_some());
    assert!(converter.image_cache().get(&image.id).is_some());
}

#[tokio::test]
async fn corrupt_bytes_fail_without_cache_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"this is not an image at all").unwrap();

    let converter = converter(dir.path());
    let err = converter
        .convert(AssetRef::image(AssetLocation::File(path)))
        .await
        .unwrap_err();

    assert_matches!(err, ConvertError::Decode(_));
    assert!(converter.image_cache().is_empty());
}
