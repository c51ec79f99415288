use anyhow::Result;
use clap::Parser as _;
use config::OverlayConfig;
use poll_loop::poll_loop;
use vmix::VmixClient;

mod args;
mod config;
mod labels;
mod overlay;
mod poll_loop;
mod status;
mod title;
mod vmix;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber()?;
    let config = OverlayConfig::load(args.config.as_deref())?;
    let period = args.poll_period()?;
    let url = vmix::api_url(&args.device_address()?)?;

    poll_loop(VmixClient::new(url)?, config, period).await
}
