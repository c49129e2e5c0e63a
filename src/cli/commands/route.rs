use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_result;
use crate::cli::OutputFormat;
use crate::gate::RoutePolicy;

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "Print the route table in evaluation order")]
    List,

    #[command(about = "Classify one or more paths without contacting the authority")]
    Classify {
        #[arg(required = true, help = "Request paths, e.g. /admin/reports")]
        paths: Vec<String>,
    },
}

pub fn handle(cmd: RouteCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let policy = RoutePolicy::academy();

    match cmd {
        RouteCommands::List => {
            let rules: Vec<_> = policy
                .rules()
                .iter()
                .map(|rule| json!({ "pattern": rule.pattern.to_string(), "class": rule.class }))
                .collect();

            let mut lines: Vec<String> = policy
                .rules()
                .iter()
                .enumerate()
                .map(|(i, rule)| format!("{:>2}. {:<28} {}", i + 1, rule.pattern.to_string(), rule.class))
                .collect();
            lines.push(format!("    {:<28} {}", "(anything else)", policy.fallback()));

            output_result(
                &output_format,
                json!({ "rules": rules, "fallback": policy.fallback() }),
                &lines,
            )
        }
        RouteCommands::Classify { paths } => {
            let classified: Vec<_> = paths
                .iter()
                .map(|path| (path, policy.classify(path)))
                .collect();

            let data = classified
                .iter()
                .map(|(path, class)| json!({ "path": path, "class": class }))
                .collect::<Vec<_>>();
            let lines: Vec<String> = classified
                .iter()
                .map(|(path, class)| format!("{:<40} {}", path, class))
                .collect();

            output_result(&output_format, json!(data), &lines)
        }
    }
}
