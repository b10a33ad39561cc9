//! One-shot query and analysis commands
//!
//! Both build the same application state as the server and print the JSON
//! response on stdout. Logs go to stderr.

use crate::cli::{AnalyzeArgs, QueryArgs};
use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::services::{AnalysisRequest, QueryRequest, ResponsePreferences};

pub async fn run_query(args: QueryArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let state = crate::create_app_state_with_config(&config).await?;

    let response = state.query_service.submit_and_await(query_request(args)).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let state = crate::create_app_state_with_config(&config).await?;

    let mut request = AnalysisRequest::new(args.text);
    request.conversation_id = args.conversation_id;

    let response = state.query_service.analyze_query(request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging)?;
    Ok(config)
}

fn query_request(args: QueryArgs) -> QueryRequest {
    let request = QueryRequest::new(args.text).with_preferences(ResponsePreferences {
        include_steps: !args.no_steps,
        include_visualization: !args.no_visualization,
        include_additional_context: !args.no_additional_context,
    });

    match args.conversation_id {
        Some(id) => request.with_conversation_id(id),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_from_flags() {
        let request = query_request(QueryArgs {
            text: "plot sin(x)".to_string(),
            no_steps: true,
            no_visualization: false,
            no_additional_context: true,
            conversation_id: Some("conv-7".to_string()),
        });

        assert_eq!(request.query, "plot sin(x)");
        assert!(!request.preferences.include_steps);
        assert!(request.preferences.include_visualization);
        assert!(!request.preferences.include_additional_context);
        assert_eq!(request.conversation_id.as_deref(), Some("conv-7"));
        assert!(request.context_id.is_none());
    }
}
