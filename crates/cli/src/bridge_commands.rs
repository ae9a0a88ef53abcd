use {
    anyhow::{Result, bail},
    bridgekeeper_bridges::{
        BridgeCommand, BridgeLookup, BridgeStore, CommandResponse, get_bridged_message,
    },
    clap::Args,
};

use crate::runtime::Runtime;

#[derive(Args)]
pub struct JoinArgs {
    /// Platform-local channel id.
    #[arg(long)]
    pub channel: String,
    /// Adapter (platform) name, e.g. "discord".
    #[arg(long)]
    pub platform: String,
    /// Bridge name. Required for join; reset reuses the current bridge without it.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct LeaveArgs {
    #[arg(long)]
    pub channel: String,
    #[arg(long)]
    pub platform: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Show the bridge this channel belongs to.
    #[arg(long, conflicts_with = "id", required_unless_present = "id")]
    pub channel: Option<String>,
    /// Show a bridge by id (prefix included).
    #[arg(long)]
    pub id: Option<String>,
}

pub async fn join(rt: &Runtime, args: JoinArgs) -> Result<()> {
    let response = rt
        .service
        .execute(BridgeCommand::Join {
            channel: args.channel,
            platform: args.platform,
            name: args.name,
        })
        .await;
    report(&response)
}

pub async fn leave(rt: &Runtime, args: LeaveArgs) -> Result<()> {
    let response = rt
        .service
        .execute(BridgeCommand::Leave {
            channel: args.channel,
            platform: args.platform,
        })
        .await;
    report(&response)
}

pub async fn reset(rt: &Runtime, args: JoinArgs) -> Result<()> {
    let response = rt
        .service
        .execute(BridgeCommand::Reset {
            channel: args.channel,
            platform: args.platform,
            name: args.name,
        })
        .await;
    report(&response)
}

pub async fn show(rt: &Runtime, args: ShowArgs) -> Result<()> {
    let lookup = match (&args.channel, &args.id) {
        (Some(channel), _) => BridgeLookup::Channel(channel),
        (None, Some(id)) => BridgeLookup::Id(id),
        (None, None) => bail!("pass --channel or --id"),
    };
    match rt.store.find(lookup).await? {
        Some(bridge) => println!("{}", serde_json::to_string_pretty(&bridge)?),
        None => println!("No bridge found."),
    }
    Ok(())
}

pub async fn deliveries(rt: &Runtime, message_id: &str) -> Result<()> {
    match get_bridged_message(rt.delivery_cache()?, Some(message_id)).await? {
        Some(sent) => println!("{}", serde_json::to_string_pretty(&sent)?),
        None => println!("No deliveries cached for {message_id}."),
    }
    Ok(())
}

/// Print the response as JSON; a non-ok code becomes a failing exit status.
fn report(response: &CommandResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if !response.is_ok() {
        bail!("{}", response.message);
    }
    Ok(())
}
