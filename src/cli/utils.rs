use serde_json::{json, Value};
use crate::cli::OutputFormat;

/// Print a result: the data document in JSON mode, the text lines otherwise
pub fn output_result(
    output_format: &OutputFormat,
    data: Value,
    text_lines: &[String],
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let response = json!({
                "success": true,
                "data": data
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            for line in text_lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
