#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build an in-memory ZIP archive from (name, text) pairs.
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let raw: Vec<(&str, &[u8])> = entries.iter().map(|(n, d)| (*n, d.as_bytes())).collect();
    build_zip_raw(&raw)
}

/// Build an in-memory ZIP archive from (name, bytes) pairs.
pub fn build_zip_raw(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A package with a manifest declaring `permissions` and one background script.
pub fn build_package(permissions: &[&str], script: &str) -> Vec<u8> {
    let manifest = serde_json::json!({
        "name": "Test Extension",
        "version": "1.0.0",
        "manifest_version": 3,
        "permissions": permissions,
    })
    .to_string();
    build_zip(&[
        ("manifest.json", manifest.as_str()),
        ("background.js", script),
    ])
}

/// Wrap ZIP bytes in a CRX3 container.
pub fn wrap_crx3(zip: &[u8]) -> Vec<u8> {
    let header = b"fake-protobuf-header";
    let mut data = b"Cr24".to_vec();
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&(header.len() as u32).to_le_bytes());
    data.extend_from_slice(header);
    data.extend_from_slice(zip);
    data
}
