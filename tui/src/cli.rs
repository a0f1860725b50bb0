use std::path::PathBuf;

use clap::Parser;

/// Terminal message composer: type a draft, press Enter or click the send
/// button, and the message lands in the transcript above.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Optional text to prefill the draft with.
    pub prompt: Option<String>,

    /// File structured logs are appended to. Defaults to `quill-tui.log` in
    /// the OS temp directory.
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Simulated delivery latency of the loopback transport, in
    /// milliseconds. The composer is gated while a delivery is in flight.
    #[arg(long = "delivery-delay-ms", value_name = "MS", default_value_t = 600)]
    pub delivery_delay_ms: u64,
}
