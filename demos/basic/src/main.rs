/**
 * Minimal demo for the courier dispatch library.
 *
 * Exercises every verb against httpbin.org, plus a download with a
 * destination resolver, an upload with a source resolver, and a
 * basic-auth request. Run with:
 *
 *   cargo run -p courier_demo
 *
 * All callbacks are delivered on the transfer threads; the demo parks
 * briefly at the end so background dispatches can finish before the
 * guard tears the executor down.
 */
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Shared parameter list used by the verb calls.
const PARAMS: &[(&str, &str)] = &[("foo1", "bar1"), ("foo2", "bar2")];

/// What httpbin echoes back for /get — enough to show typed decoding.
#[derive(Debug, Deserialize)]
struct Echo {
    url: String,
}

fn main() {
    let _guard = courier::init(courier::Options {
        headers: vec![("Device".into(), "Android".into())],
        ..Default::default()
    })
    .expect("courier init failed");

    /*
     * Plain GET with parameters, split handler pair.
     */
    courier::get("https://httpbin.org/get", PARAMS)
        .expect("bad url")
        .response_split(
            |reply| {
                let echoed: Option<Echo> = reply.json().ok();
                println!(
                    "[get] {} from {}",
                    reply.response.status,
                    echoed.map(|e| e.url).unwrap_or_default()
                );
            },
            |failure| println!("[get] failed: {}", failure.error),
        );

    /*
     * The remaining verbs with a unified handler.
     */
    courier::put("https://httpbin.org/put", PARAMS)
        .expect("bad url")
        .response_unified(|outcome| println!("[put] success: {}", outcome.is_success()));

    courier::post("https://httpbin.org/post", PARAMS)
        .expect("bad url")
        .response_unified(|outcome| println!("[post] success: {}", outcome.is_success()));

    courier::delete("https://httpbin.org/delete", &[])
        .expect("bad url")
        .response_unified(|outcome| println!("[delete] success: {}", outcome.is_success()));

    /*
     * Download: the destination resolver runs on the transfer thread
     * before any byte moves, and may prepare the directory itself.
     */
    courier::download("https://httpbin.org/bytes/1048", &[])
        .expect("bad url")
        .destination(|_response, _url| {
            let dir = std::env::temp_dir().join("courier-demo");
            std::fs::create_dir_all(&dir)?;
            Ok(dir.join("download.tmp"))
        })
        .progress(|read, total| println!("[download] {read} of {total} bytes"))
        .response_split(
            |reply| println!("[download] wrote {} bytes", reply.body.len()),
            |failure| println!("[download] failed: {}", failure.error),
        );

    /*
     * Upload: the source resolver points at the file whose bytes become
     * the body.
     */
    let payload = std::env::temp_dir().join("courier-demo-upload.txt");
    std::fs::write(&payload, b"hello from courier").expect("prepare upload payload");
    let source: PathBuf = payload.clone();
    courier::upload("https://httpbin.org/post", &[])
        .expect("bad url")
        .source(move |_request, _url| Ok(source.clone()))
        .progress(|read, total| println!("[upload] {read} of {total} bytes"))
        .response_unified(|outcome| println!("[upload] success: {}", outcome.is_success()));

    /*
     * Basic auth: httpbin accepts exactly the credentials in the path.
     */
    courier::get("https://httpbin.org/basic-auth/user/passwd", &[])
        .expect("bad url")
        .authenticate("user", "passwd")
        .response_split(
            |reply| println!("[auth] {}", reply.response.status),
            |failure| println!("[auth] failed: {}", failure.error),
        );

    /*
     * Give the background pool a moment before the guard drops and the
     * remaining drain window starts.
     */
    std::thread::sleep(Duration::from_secs(5));
    println!("[demo] done — guard drop shuts the executor down");
}
