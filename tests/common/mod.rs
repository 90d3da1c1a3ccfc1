//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::io::Cursor;

use axum::Router;
use base64::Engine;
use base64::engine::general_purpose;
use themegen::client::GenerationSettings;
use url::Url;

/// Serves `router` on an ephemeral local port, standing in for the txt2img service.
pub async fn spawn_service(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock service");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Url::parse(&format!("http://{addr}")).expect("mock service url")
}

/// A URL nothing is listening on.
pub async fn dead_service() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}")).expect("dead service url")
}

pub fn settings_for(api_url: Url) -> GenerationSettings {
    GenerationSettings {
        api_url,
        ..GenerationSettings::default()
    }
}

pub fn png(shade: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([shade, shade, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Four distinct PNGs, raw and base64 encoded.
pub fn batch() -> (Vec<Vec<u8>>, Vec<String>) {
    let raw: Vec<Vec<u8>> = (0..4u8).map(|i| png(i * 50)).collect();
    let encoded = raw
        .iter()
        .map(|bytes| general_purpose::STANDARD.encode(bytes))
        .collect();
    (raw, encoded)
}
