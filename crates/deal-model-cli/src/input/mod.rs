pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Typed input from `--input <file>` or, failing that, piped stdin.
///
/// `what` names the payload in the error shown when neither is present.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(p) = path {
        return file::read_json(p);
    }
    match stdin::read_stdin()? {
        Some(text) => Ok(serde_json::from_str(&text)
            .map_err(|e| format!("Invalid {} JSON on stdin: {}", what, e))?),
        None => Err(format!("--input <file.json> or JSON on stdin required for {}", what).into()),
    }
}
