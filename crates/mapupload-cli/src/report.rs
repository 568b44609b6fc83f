//! Printing pipeline outcomes

use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a, T: Serialize> {
    success: bool,
    errors: &'a [String],
    details: &'a T,
}

/// Print an outcome and return the process exit code
///
/// Human output mirrors a chat reply: a confirmation on success, otherwise
/// every collected message on its own line.
pub fn print_outcome<T: Serialize>(
    json: bool,
    success: bool,
    errors: &[String],
    details: &T,
    confirmation: &str,
) -> Result<i32> {
    if json {
        let report = Report {
            success,
            errors,
            details,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if success {
        println!("{}", confirmation);
        for message in errors {
            println!("  {}", message);
        }
    } else if errors.is_empty() {
        println!("Nothing was changed.");
    } else {
        println!("{}", errors.join("\n"));
    }

    Ok(if success { 0 } else { 1 })
}
