//! Skips wiremock-backed tests where localhost sockets cannot be bound.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "IMGFETCH_REQUIRE_SOCKET_TESTS";

fn sockets_mandatory() -> bool {
    std::env::var(REQUIRE_ENV).is_ok_and(|value| {
        let value = value.trim();
        value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
    })
}

/// Starts a mock server, or returns `None` (after a note on stderr) when the
/// sandbox forbids binding. Panics instead when `IMGFETCH_REQUIRE_SOCKET_TESTS` is set.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let bindable = TcpListener::bind(("127.0.0.1", 0)).is_ok();
    async move {
        if bindable {
            return Some(MockServer::start().await);
        }
        let note = format!("{}:{} needs a localhost socket", caller.file(), caller.line());
        assert!(!sockets_mandatory(), "{note} and {REQUIRE_ENV} is set");
        eprintln!("skipping: {note}");
        None
    }
}
