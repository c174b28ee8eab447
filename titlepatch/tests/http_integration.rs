//! End-to-end tests against a local HTTP server.
//!
//! The server is a plain `TcpListener` on a background thread that answers
//! each request from a fixed route table and closes the connection.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::thread;

use tempfile::tempdir;
use titlepatch::download::{
    HttpDownloader, LinePrompt, NullObserver, OverwritePolicy, PackageDownloader, ScriptedPrompt,
};
use titlepatch::identifier::DEFAULT_PREFIXES;
use titlepatch::manifest::{HttpManifestFetcher, ManifestSource};
use titlepatch::{PackageSelection, TitleId, TitleUpdater, UpdateError, UpdaterConfig};

struct Route {
    status: &'static str,
    body: Vec<u8>,
    /// Content-Length to announce instead of the real body length.
    declared_len: Option<usize>,
}

fn route(status: &'static str, body: impl Into<Vec<u8>>) -> Route {
    Route {
        status,
        body: body.into(),
        declared_len: None,
    }
}

/// A route that announces `declared_len` bytes but closes after `body`.
fn truncated(body: impl Into<Vec<u8>>, declared_len: usize) -> Route {
    Route {
        declared_len: Some(declared_len),
        ..route("200 OK", body)
    }
}

/// Start a server for `routes` and return its base URL.
fn serve(routes: Vec<(&'static str, Route)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes: HashMap<&'static str, Route> = routes.into_iter().collect();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => {}
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body, len): (&str, &[u8], usize) = match routes.get(path) {
                Some(r) => (
                    r.status,
                    r.body.as_slice(),
                    r.declared_len.unwrap_or(r.body.len()),
                ),
                None => ("404 Not Found", b"", 0),
            };
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status, len
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
            let _ = stream.flush();
        }
    });

    base
}

fn title_id(raw: &str) -> TitleId {
    TitleId::parse(raw, &DEFAULT_PREFIXES).unwrap()
}

fn config_for(base: &str, target: &std::path::Path) -> UpdaterConfig {
    UpdaterConfig::new(target.to_path_buf())
        .with_manifest_url_template(format!("{}/tpl/{{title_id}}/{{title_id}}-ver.xml", base))
}

fn manifest_xml(base: &str, title_id: &str, packages: &[(&str, usize)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<titlepatch status=\"alive\" titleid=\"{id}\">\n<tag name=\"{id}_T1\">\n",
        id = title_id
    );
    for (i, (version, size)) in packages.iter().enumerate() {
        xml.push_str(&format!(
            "<package version=\"{v}\" size=\"{s}\" sha1sum=\"0\" url=\"{base}/pkg/P{i}.pkg\" ps3_system_ver=\"03.4100\">",
            v = version,
            s = size,
            base = base,
            i = i
        ));
        if i + 1 == packages.len() {
            xml.push_str("<paramsfo><TITLE>Test\nTitle</TITLE></paramsfo>");
        }
        xml.push_str("</package>\n");
    }
    xml.push_str("</tag>\n</titlepatch>\n");
    xml
}

#[test]
fn test_fetch_manifest_over_http() {
    let base = serve(vec![(
        "/tpl/BLUS30443/BLUS30443-ver.xml",
        route("200 OK", "<titlepatch titleid=\"BLUS30443\"/>"),
    )]);
    let dir = tempdir().unwrap();
    let fetcher = HttpManifestFetcher::new(&config_for(&base, dir.path())).unwrap();

    let text = fetcher.fetch(&title_id("BLUS30443")).unwrap();
    assert!(text.contains("BLUS30443"));
}

#[test]
fn test_missing_manifest_is_fetch_error() {
    let base = serve(vec![]);
    let dir = tempdir().unwrap();
    let fetcher = HttpManifestFetcher::new(&config_for(&base, dir.path())).unwrap();

    assert!(matches!(
        fetcher.fetch(&title_id("BLUS30443")),
        Err(UpdateError::Fetch { .. })
    ));
}

#[test]
fn test_empty_manifest_is_fetch_error() {
    let base = serve(vec![(
        "/tpl/BLUS30443/BLUS30443-ver.xml",
        route("200 OK", ""),
    )]);
    let dir = tempdir().unwrap();
    let fetcher = HttpManifestFetcher::new(&config_for(&base, dir.path())).unwrap();

    assert!(matches!(
        fetcher.fetch(&title_id("BLUS30443")),
        Err(UpdateError::Fetch { .. })
    ));
}

#[test]
fn test_download_exact_size() {
    let base = serve(vec![("/pkg/a.pkg", route("200 OK", vec![7u8; 1000]))]);
    let dir = tempdir().unwrap();
    let downloader = HttpDownloader::new(&config_for(&base, dir.path())).unwrap();
    let dest = dir.path().join("a.pkg");

    let size = downloader
        .download(&format!("{}/pkg/a.pkg", base), &dest, 1000)
        .unwrap();

    assert_eq!(size, 1000);
    assert_eq!(fs::read(&dest).unwrap().len(), 1000);
}

#[test]
fn test_download_size_mismatch_is_integrity_error() {
    let base = serve(vec![("/pkg/a.pkg", route("200 OK", vec![7u8; 999]))]);
    let dir = tempdir().unwrap();
    let downloader = HttpDownloader::new(&config_for(&base, dir.path())).unwrap();
    let dest = dir.path().join("a.pkg");

    let result = downloader.download(&format!("{}/pkg/a.pkg", base), &dest, 1000);

    match result {
        Err(UpdateError::Integrity {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 1000);
            assert_eq!(actual, 999);
        }
        other => panic!("expected Integrity error, got {:?}", other),
    }
    assert!(!dest.exists(), "corrupt file should be removed");
}

#[test]
fn test_truncated_stream_is_transport_error() {
    let base = serve(vec![("/pkg/a.pkg", truncated(vec![7u8; 500], 1000))]);
    let dir = tempdir().unwrap();
    let downloader = HttpDownloader::new(&config_for(&base, dir.path())).unwrap();
    let dest = dir.path().join("a.pkg");

    let result = downloader.download(&format!("{}/pkg/a.pkg", base), &dest, 1000);

    assert!(
        matches!(result, Err(UpdateError::Transport { .. })),
        "expected Transport error, got {:?}",
        result
    );
    assert!(!dest.exists(), "partial file should be removed");
}

#[test]
fn test_download_server_error_is_transport_error() {
    let base = serve(vec![(
        "/pkg/a.pkg",
        route("500 Internal Server Error", "boom"),
    )]);
    let dir = tempdir().unwrap();
    let downloader = HttpDownloader::new(&config_for(&base, dir.path())).unwrap();

    assert!(matches!(
        downloader.download(&format!("{}/pkg/a.pkg", base), &dir.path().join("a.pkg"), 4),
        Err(UpdateError::Transport { .. })
    ));
}

#[test]
fn test_full_run_over_http() {
    let packages = serve(vec![
        ("/pkg/P0.pkg", route("200 OK", vec![1u8; 16])),
        ("/pkg/P1.pkg", route("200 OK", vec![2u8; 32])),
    ]);
    let xml = manifest_xml(&packages, "BCES00141", &[("01.01", 16), ("01.02", 32)]);
    let manifests = serve(vec![("/tpl/BCES00141/BCES00141-ver.xml", route("200 OK", xml))]);

    let dir = tempdir().unwrap();
    let target = dir.path().join("PS3 Updates");
    let updater = TitleUpdater::new(config_for(&manifests, &target)).unwrap();

    let (manifest, report) = updater
        .run(
            "bces00141",
            &PackageSelection::All,
            &mut ScriptedPrompt::default(),
            &mut NullObserver,
        )
        .unwrap();

    assert_eq!(manifest.records.len(), 2);
    assert!(manifest.records.iter().all(|r| r.title == "Test Title"));
    assert_eq!(report.downloaded.len(), 2);
    assert_eq!(report.bytes_downloaded, 48);
    assert_eq!(fs::read(target.join("P0.pkg")).unwrap().len(), 16);
    assert_eq!(fs::read(target.join("P1.pkg")).unwrap().len(), 32);
}

#[test]
fn test_console_answers_no_then_all() {
    let packages = serve(vec![
        ("/pkg/P0.pkg", route("200 OK", vec![1u8; 4])),
        ("/pkg/P1.pkg", route("200 OK", vec![2u8; 4])),
        ("/pkg/P2.pkg", route("200 OK", vec![3u8; 4])),
    ]);
    let xml = manifest_xml(&packages, "BLUS30443", &[("01.01", 4), ("01.02", 4), ("01.03", 4)]);
    let manifests = serve(vec![("/tpl/BLUS30443/BLUS30443-ver.xml", route("200 OK", xml))]);

    let dir = tempdir().unwrap();
    for name in ["P0.pkg", "P1.pkg", "P2.pkg"] {
        fs::write(dir.path().join(name), b"old").unwrap();
    }

    let config =
        config_for(&manifests, dir.path()).with_overwrite_policy(OverwritePolicy::AskEachTime);
    let updater = TitleUpdater::new(config).unwrap();

    let mut output = Vec::new();
    let mut prompt = LinePrompt::new(Cursor::new("n\na\nx\n"), &mut output);
    let (_, report) = updater
        .run("BLUS30443", &PackageSelection::All, &mut prompt, &mut NullObserver)
        .unwrap();
    drop(prompt);

    assert_eq!(report.skipped, vec![dir.path().join("P0.pkg")]);
    assert_eq!(report.downloaded.len(), 2);
    assert_eq!(fs::read(dir.path().join("P0.pkg")).unwrap(), b"old");
    assert_eq!(fs::read(dir.path().join("P2.pkg")).unwrap(), vec![3u8; 4]);

    let transcript = String::from_utf8(output).unwrap();
    assert_eq!(transcript.matches("Overwrite?").count(), 2);
}
