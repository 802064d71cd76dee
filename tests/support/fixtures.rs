//! Mock pages and images shared by the integration tests.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal PNG header for a `width`x`height` image.
#[must_use]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}

/// HTML page with one `<img>` per entry of `srcs`.
#[must_use]
pub fn page_with_images(srcs: &[&str]) -> String {
    let imgs: String = srcs
        .iter()
        .map(|src| format!("<img src=\"{src}\">"))
        .collect();
    format!("<html><body>{imgs}</body></html>")
}

pub async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .expect(1)
        .mount(server)
        .await;
}

/// Serves a 64x64 PNG at `route`, expecting exactly `times` requests.
pub async fn mount_png(server: &MockServer, route: &str, times: u64) {
    mount_png_sized(server, route, 64, 64, times).await;
}

pub async fn mount_png_sized(server: &MockServer, route: &str, width: u32, height: u32, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png(width, height), "image/png"))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
