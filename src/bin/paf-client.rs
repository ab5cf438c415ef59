//! Command-line host: simulates one page load against a real proxy.
//!
//! Cookies are kept in a JSON file so consecutive invocations behave like
//! consecutive page loads. When the flow leaves the page, the navigation target
//! is printed; pass it (or the URL the operator sends back) as `--page-url` to
//! continue.

use anyhow::Context;
use clap::{Parser, Subcommand};
use paf_client::cookies::PersistentCookieJar;
use paf_client::model::{IdsAndPreferences, NewPreferences};
use paf_client::page::SimulatedPage;
use paf_client::{ClientConfig, PafClient, ProxyOptions, RefreshOptions, Resolution};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use url::Url;

#[derive(Parser)]
#[command(name = "paf-client", about = "Resolve identifiers and preferences through an operator proxy")]
struct Cli {
    /// Proxy origin, e.g. https://proxy.publisher.example
    #[arg(long)]
    proxy: Url,

    /// URL of the simulated page
    #[arg(long)]
    page_url: Url,

    /// JSON file holding the page cookies
    #[arg(long, default_value = "paf-cookies.json")]
    cookies: PathBuf,

    /// User agent fed to the third-party cookie heuristic
    #[arg(long)]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read identifiers and preferences
    Refresh {
        /// Leave the page for the operator if needed
        #[arg(long)]
        trigger_redirect: bool,
    },
    /// Write identifiers and preferences (JSON request)
    Write {
        request: String,
    },
    /// Sign new preferences (JSON input)
    Sign {
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = ClientConfig::builder();
    if let Some(ua) = cli.user_agent {
        config = config.user_agent(ua);
    }
    let config = config.build()?;

    let jar = PersistentCookieJar::open(&cli.cookies)?;
    log::info!("Using cookie file {}", jar.path().display());
    let page = Arc::new(SimulatedPage::new(cli.page_url));
    let client = PafClient::builder(page.clone(), page.clone())
        .config(config)
        .cookie_jar(Arc::new(RwLock::new(jar)))
        .build()?;

    let proxy = ProxyOptions { proxy_base: cli.proxy.clone() };

    match cli.command {
        Commands::Refresh { trigger_redirect } => {
            let options = RefreshOptions {
                proxy_base: cli.proxy,
                trigger_redirect_if_needed: trigger_redirect,
            };
            report(client.resolve(&options).await?)?;
        }
        Commands::Write { request } => {
            let request: IdsAndPreferences = serde_json::from_str(&request).context("parsing write request")?;
            report(client.write(&proxy, &request).await?)?;
        }
        Commands::Sign { input } => {
            let input: NewPreferences = serde_json::from_str(&input).context("parsing preferences input")?;
            let signed = client.sign_preferences(&proxy, &input).await?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
    }

    Ok(())
}

fn report(resolution: Resolution) -> anyhow::Result<()> {
    match resolution {
        Resolution::Resolved(values) => println!("{}", serde_json::to_string_pretty(&values)?),
        Resolution::Deferred => println!("deferred: call again with --trigger-redirect"),
        Resolution::Redirecting(url) => println!("redirect: {}", url),
    }
    Ok(())
}
