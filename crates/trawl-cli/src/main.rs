use clap::{CommandFactory, FromArgMatches};

mod build_info;
mod cli;
pub mod exit_codes;
mod logging;
mod output;

use build_info::BuildInfo;
use cli::args::Cli;
use cli::commands::dispatch;
use exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let build = BuildInfo::current();

    // `--version` reports the same build identity as `trawl version`.
    let parsed = Cli::command()
        .version(build.full_version(true))
        .try_get_matches()
        .and_then(|matches| Cli::from_arg_matches(&matches));
    let cli = match parsed {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() {
                EXIT_FAILURE
            } else {
                EXIT_SUCCESS
            });
        }
    };

    logging::init(logging::use_color(cli.no_color, cli.force_color));

    let code = match dispatch(cli, &build).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
