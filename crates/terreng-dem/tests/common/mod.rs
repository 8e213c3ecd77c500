//! Shared helpers: a one-shot loopback HTTP server and GeoTIFF fixtures.
//!
//! Kept identical in `terreng-dem/tests/common` and `terreng-cli/tests/common`.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Serves exactly one canned HTTP response, then returns the request target it saw.
pub struct MockServer {
    pub endpoint: String,
    handle: JoinHandle<String>,
}

impl MockServer {
    pub fn start(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().unwrap().port();
        let content_type = content_type.to_string();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }

            let mut stream = stream;
            let head = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();

            request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string()
        });

        Self {
            endpoint: format!("http://127.0.0.1:{port}/arcgis/rest/services/DTM/ImageServer/exportImage"),
            handle,
        }
    }

    /// Wait for the request and return its target (path and query).
    pub fn request_target(self) -> String {
        self.handle.join().expect("mock server thread")
    }
}

/// An F32 GeoTIFF in EPSG:25833 with 1 m pixels.
pub fn geotiff_bytes(width: u32, height: u32, min_x: f64, max_y: f64) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[1.0f64, 1.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &[0.0f64, 0.0, 0.0, min_x, max_y, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::GeoKeyDirectoryTag,
                // ProjectedCSTypeGeoKey (3072) = 25833
                &[1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 25833][..],
            )
            .unwrap();
        let data: Vec<f32> = (0..width * height).map(|i| 100.0 + (i % 50) as f32).collect();
        image.write_data(&data).unwrap();
    }
    buf.into_inner()
}
