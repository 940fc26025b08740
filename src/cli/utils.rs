use serde_json::{json, Value};
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. In text mode the
/// `text` line is printed on its own so it can be piped.
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    text: Option<&str>,
    data: Value,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Value::Object(fields)) = (response.as_object_mut(), data) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("✓ {}", message);
            if let Some(text) = text {
                println!("{}", text);
            }
        }
    }
    Ok(())
}
