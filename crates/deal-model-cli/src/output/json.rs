use serde_json::Value;
use std::io::{self, Write};

/// JSON to stdout: indented for a terminal, one line when piped so results
/// can be appended to a log or fed to `jq -c`.
pub fn print_json(value: &Value) {
    let pretty = atty::is(atty::Stream::Stdout);
    let stdout = io::stdout();
    if let Err(e) = write_json(&mut stdout.lock(), value, pretty) {
        tracing::error!(error = %e, "failed to write output");
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)
}
