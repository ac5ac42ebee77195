use anyhow::Result;
use cake::cli::{Cli, Mode};
use cake::client::ConfluenceClient;
use cake::model::find_current;
use cake::render;
use cake::schedule::ScheduleParser;
use cake::server::{self, ServerState};
use clap::Parser;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cake::logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let url = cli.page_url(&config)?;
    let parser = ScheduleParser::new(config.month_table()?);
    let client = ConfluenceClient::new(&config.login, &config.password, config.timeout())?;

    let page = client.fetch_page(&url).await?;

    match cli.mode() {
        Mode::Daemon => {
            let state = Arc::new(ServerState::new(parser, page));
            if let Some(every) = config.refresh_interval() {
                server::spawn_refresh(state.clone(), client, url, every);
            }
            let listener = server::bind(&cli.listen).await?;
            server::serve(listener, state).await
        }
        Mode::List => {
            let roster = parser.parse_today(&page);
            let mut out = io::stdout().lock();
            if cli.json {
                writeln!(out, "{}", render::to_json(&roster, cli.current)?)?;
            } else if cli.current {
                let current: Vec<_> = find_current(&roster).cloned().into_iter().collect();
                render::write_table(&mut out, &current)?;
            } else {
                render::write_table(&mut out, &roster)?;
            }
            out.flush()?;
            Ok(())
        }
    }
}
