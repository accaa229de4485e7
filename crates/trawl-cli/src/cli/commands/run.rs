use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use trawl_core::Analyzer;
use trawl_github::{GithubClient, GithubConfig};

use crate::build_info::BuildInfo;
use crate::cli::args::{OutputFormat, RunArgs};
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::output;

pub async fn run(args: RunArgs, build: &BuildInfo) -> anyhow::Result<i32> {
    let config = args.analyzer_config();
    config.validate().context("invalid run options")?;

    let mut github = GithubConfig::from_env().with_user_agent(build.user_agent());
    if let Some(url) = &args.api_url {
        github = github.with_url(url.clone());
    }
    if let Some(token) = &args.token {
        github = github.with_token(token.clone());
    }
    let client = GithubClient::new(github).context("failed to create GitHub client")?;
    if !client.is_authenticated() {
        warn!("no GitHub token configured; unauthenticated requests are heavily rate limited");
    }

    info!(
        repo = %config.repo,
        branch = %config.branch,
        max_age = %args.max_age,
        max_runs = config.window.max_count,
        "starting analysis"
    );
    let analyzer = Analyzer::new(Arc::new(client), config);

    let analysis = tokio::select! {
        result = analyzer.analyze() => result.context("analysis failed")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping analysis");
            return Ok(EXIT_FAILURE);
        }
    };

    let rendered = match args.format {
        OutputFormat::Text => output::render_text(&analysis, args.top),
        OutputFormat::Json => {
            output::render_json(&analysis, args.top).context("failed to encode JSON output")?
        }
    };
    println!("{rendered}");

    if let Some(dir) = &analysis.work_dir {
        info!(path = %dir.display(), "work directory kept");
    }
    Ok(EXIT_SUCCESS)
}
