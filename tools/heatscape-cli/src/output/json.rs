//! JSON Output Formatting

use serde::Serialize;

/// Format data as pretty JSON
pub fn format_json_pretty<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Format data as compact JSON (one line)
pub fn format_json_compact<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Print a service response
pub fn print_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<(), serde_json::Error> {
    let text = if compact {
        format_json_compact(data)?
    } else {
        format_json_pretty(data)?
    };
    println!("{}", text);
    Ok(())
}
