use std::io::{self, Read};

/// Raw deal JSON piped on stdin, or `None` when stdin is a terminal or
/// carries nothing but whitespace.
pub fn read_stdin() -> io::Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let body = payload(&buffer).map(str::to_owned);
    if let Some(ref b) = body {
        tracing::debug!(bytes = b.len(), "read deal input from stdin");
    }
    Ok(body)
}

/// Strip a UTF-8 byte order mark (spreadsheet exports often add one) and
/// surrounding whitespace.
fn payload(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
