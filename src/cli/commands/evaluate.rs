use clap::Args;
use serde_json::json;

use crate::auth::Credentials;
use crate::cli::utils::output_result;
use crate::cli::OutputFormat;
use crate::config;
use crate::gate::RouteDecision;
use crate::state::AppState;

#[derive(Args)]
pub struct EvaluateArgs {
    #[arg(help = "Request path, e.g. /admin/reports")]
    pub path: String,

    #[arg(long, env = "GATECTL_ACCESS_TOKEN", help = "Access token cookie value")]
    pub access_token: Option<String>,

    #[arg(long, env = "GATECTL_REFRESH_TOKEN", help = "Refresh token cookie value")]
    pub refresh_token: Option<String>,
}

pub async fn handle(args: EvaluateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = AppState::from_config(config::config())?;
    let credentials = Credentials::new(args.access_token, args.refresh_token);

    let outcome = state.gate.evaluate(&args.path, &credentials).await;

    let location = match &outcome.decision {
        RouteDecision::Allow => None,
        RouteDecision::Redirect(target) => Some(state.gate.settings().location(target)),
    };

    let mut lines = vec![
        format!("path:       {}", args.path),
        format!("route:      {}", outcome.route),
        match &location {
            Some(location) => format!("decision:   redirect -> {}", location),
            None => "decision:   allow".to_string(),
        },
    ];
    if let Some(identity) = &outcome.identity {
        lines.push(format!("identity:   {} ({})", identity.id, identity.email.as_deref().unwrap_or("no email")));
    }
    if let Some(flags) = &outcome.privileges {
        lines.push(format!("admin:      {}", flags.is_admin));
        lines.push(format!("superadmin: {}", flags.is_super_admin));
    }
    if outcome.refreshed.is_some() {
        lines.push("session:    tokens were refreshed".to_string());
    } else if outcome.session_expired {
        lines.push("session:    expired, cookies would be cleared".to_string());
    }

    output_result(
        &output_format,
        json!({
            "path": args.path,
            "route": outcome.route,
            "decision": outcome.decision,
            "location": location,
            "identity": outcome.identity,
            "privileges": outcome.privileges,
            "refreshed": outcome.refreshed.is_some(),
            "session_expired": outcome.session_expired,
        }),
        &lines,
    )
}
