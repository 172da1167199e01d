//! Parses a raw HTTP response read from stdin and logs its parts.
//!
//! ```sh
//! printf 'HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n' \
//!   | cargo run --example parse_response
//! ```

use std::io::{self, Read};

use micro_message::codec::ResponseDecoder;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut raw = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut raw) {
        error!(cause = %e, "failed to read stdin");
        return;
    }

    let response = match ResponseDecoder::new().decode(raw.into()) {
        Ok(response) => response,
        Err(e) => {
            error!(cause = %e, "invalid response");
            return;
        }
    };

    info!(
        version = response.http_version(),
        status = response.status_code(),
        reason = response.reason_phrase(),
        "status line"
    );
    for (name, value) in response.headers() {
        info!(name, value = ?value.values(), "header");
    }
    for (name, cookie) in response.cookies().iter() {
        info!(name, value = cookie.value(), path = ?cookie.path(), secure = cookie.secure(), "cookie");
    }
    info!(len = response.body().len(), body = %String::from_utf8_lossy(response.body()), "body");
}
