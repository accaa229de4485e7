use super::args::*;
use crate::build_info::BuildInfo;
use crate::exit_codes::EXIT_SUCCESS;

pub(crate) mod run;

pub async fn dispatch(cli: Cli, build: &BuildInfo) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args, build).await,
        Command::Version => {
            println!("trawl {}", build.full_version(true));
            Ok(EXIT_SUCCESS)
        }
    }
}
