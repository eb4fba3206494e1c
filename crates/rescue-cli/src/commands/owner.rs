//! `rescue owner`: validate a recovery setup against chain constants.

use super::common::{self, or_dash, Output};
use anyhow::Result;
use clap::Args;
use rescue_core::{AccountId, BlockNumber, EngineConfig};
use rescue_recovery::{OwnerSession, OwnerSetup, OwnerView, RecoveryCall};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct OwnerArgs {
    /// Chain snapshot file (JSON)
    #[arg(long)]
    pub chain: PathBuf,

    /// Account that owns the recovery config
    #[arg(long)]
    pub account: AccountId,

    /// Comma-separated friend accounts
    #[arg(long, value_delimiter = ',')]
    pub friends: Vec<AccountId>,

    /// Vouches needed to recover
    #[arg(long, default_value = "1")]
    pub threshold: u16,

    /// Blocks between initiation and claim
    #[arg(long, default_value = "0")]
    pub delay: BlockNumber,
}

#[derive(Serialize)]
struct OwnerReport {
    #[serde(flatten)]
    view: OwnerView,
    call: Option<RecoveryCall>,
    rejected: Option<String>,
}

pub async fn run(args: OwnerArgs, config: &EngineConfig, output: &Output) -> Result<()> {
    let chain = common::open_chain(&args.chain)?;
    let mut session: OwnerSession<_> = OwnerSession::with_default_engine(chain, config);
    let proposal = (!args.friends.is_empty()).then(|| OwnerSetup {
        friends: args.friends.clone(),
        threshold: args.threshold,
        delay_period: args.delay,
    });
    session.update(|engine| {
        engine.set_proposal(proposal);
        engine.select_account(Some(args.account))
    });
    session.settle().await;

    let engine = session.engine();
    let view = engine.view();
    let (call, rejected) = if view.can_remove {
        (engine.remove().ok(), None)
    } else {
        match engine.create() {
            Ok((call, _)) => (Some(call), None),
            Err(err) => (None, Some(err.to_string())),
        }
    };

    if output.is_json() {
        return output.json(&OwnerReport {
            view,
            call,
            rejected,
        });
    }

    output.heading("Owner");
    output.field("account", or_dash(view.account));
    output.field(
        "recoverable",
        match (view.can_remove, view.checking, view.error.as_ref()) {
            (true, _, _) => "yes".to_string(),
            (_, true, _) => "checking...".to_string(),
            (_, _, Some(error)) => format!("unknown ({})", error.reason),
            _ => "no".to_string(),
        },
    );
    output.field("deposit", or_dash(view.proposed_deposit));
    if let Some(call) = call {
        output.field("next call", call);
    }
    if let Some(reason) = rejected {
        output.field("rejected", reason);
    }
    Ok(())
}
