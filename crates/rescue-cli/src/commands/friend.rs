//! `rescue friend`: whether a friend can vouch for a rescue.

use super::common::{self, or_dash, Output};
use anyhow::Result;
use clap::Args;
use rescue_core::{AccountId, EngineConfig};
use rescue_recovery::{FriendSession, VouchOutcome};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FriendArgs {
    /// Chain snapshot file (JSON)
    #[arg(long)]
    pub chain: PathBuf,

    /// Account being recovered
    #[arg(long)]
    pub lost: AccountId,

    /// Friend deciding whether to vouch
    #[arg(long)]
    pub friend: AccountId,

    /// Rescuer the friend would vouch for
    #[arg(long)]
    pub rescuer: Option<AccountId>,
}

pub async fn run(args: FriendArgs, config: &EngineConfig, output: &Output) -> Result<()> {
    let chain = common::open_chain(&args.chain)?;
    let mut session = FriendSession::friend(chain, args.friend, config);
    session.update(|engine| {
        let mut requests = engine.select_lost_account(Some(args.lost));
        requests.extend(engine.select_rescuer(args.rescuer));
        requests
    });
    session.settle().await;

    let view = session.engine().view();
    if output.is_json() {
        return output.json(&view);
    }

    output.heading("Friend");
    output.field("friend", view.caller);
    output.field("lost", or_dash(view.lost));
    output.field("rescuer", or_dash(view.rescuer));
    output.field(
        "vouchers",
        format!("{} / {}", or_dash(view.vouchers), or_dash(view.threshold)),
    );
    output.field("status", &view.message);
    match session.engine().vouch() {
        Ok(VouchOutcome::Submit(call)) => output.field("next call", call),
        Ok(VouchOutcome::AlreadySatisfied) => output.field("next call", "none, already vouched"),
        Err(err) => tracing::debug!(error = %err, "vouch not available"),
    }
    Ok(())
}
