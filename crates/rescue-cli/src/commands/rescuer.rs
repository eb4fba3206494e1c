//! `rescue rescuer`: what the rescuer screen shows for a lost account.

use super::common::{self, or_dash, Output};
use anyhow::Result;
use clap::Args;
use rescue_core::{AccountId, EngineConfig};
use rescue_recovery::{RescuerPhase, RescuerSession, RescuerView};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RescuerArgs {
    /// Chain snapshot file (JSON)
    #[arg(long)]
    pub chain: PathBuf,

    /// Account being recovered
    #[arg(long)]
    pub lost: AccountId,

    /// Account performing the rescue
    #[arg(long)]
    pub rescuer: AccountId,

    /// Keep the countdown running for this many ticks
    #[arg(long, default_value = "0")]
    pub ticks: u32,
}

pub async fn run(args: RescuerArgs, config: &EngineConfig, output: &Output) -> Result<()> {
    let chain = common::open_chain(&args.chain)?;
    let mut session = RescuerSession::rescuer(chain, config);
    session.update(|engine| {
        let mut requests = engine.select_lost_account(Some(args.lost));
        requests.extend(engine.select_rescuer(Some(args.rescuer)));
        requests
    });
    session.settle().await;

    let view = session.engine().view();
    if output.is_json() {
        output.json(&view)?;
    } else {
        print_view(output, &view);
        match view.phase {
            RescuerPhase::Initiate => {
                if let Ok(call) = session.engine().initiate() {
                    output.field("next call", call);
                }
            }
            RescuerPhase::Withdraw => match session.engine().withdraw() {
                Ok(call) => output.field("next call", call),
                Err(err) => output.field("next call", err),
            },
            RescuerPhase::Wait => {}
        }
    }

    if args.ticks > 0 && view.countdown_secs.is_some() {
        session.start_countdown();
        for _ in 0..args.ticks {
            session.process_next().await;
            output.field("countdown", format_countdown(session.engine().countdown_secs()));
        }
        session.stop_countdown();
    }

    Ok(())
}

fn print_view(output: &Output, view: &RescuerView) {
    output.heading("Rescuer");
    output.field("lost", or_dash(view.lost));
    output.field("rescuer", or_dash(view.rescuer));
    output.field("phase", view.phase);
    output.field("block", or_dash(view.block_height));
    output.field("remaining blocks", or_dash(view.remaining_blocks));
    output.field("countdown", format_countdown(view.countdown_secs));
    output.field(
        "vouchers",
        format!("{} / {}", or_dash(view.vouchers), or_dash(view.threshold)),
    );
    output.field("proxy installed", or_dash(view.is_proxy));
    output.field("can proceed", view.can_proceed);
    if view.checking {
        output.field("status", "checking...");
    }
    if let Some(error) = &view.error {
        output.field("error", &error.reason);
    }

    if let Some(amounts) = &view.amounts {
        output.heading("Withdrawal");
        output.field("available", amounts.available);
        output.field("redeemable", amounts.redeemable);
        output.field("staked", amounts.staked);
        output.field("bonded", amounts.bonded);
        output.field("total", amounts.total_withdrawable);
        output.field("slashing spans", amounts.span_count);
    }

    if !view.other_rescuers.is_empty() {
        output.heading("Other rescuers");
        for record in &view.other_rescuers {
            output.field(&record.account.short(), record.deposit());
        }
    }
}

fn format_countdown(seconds: Option<u64>) -> String {
    match seconds {
        Some(total) => {
            let (hours, rest) = (total / 3600, total % 3600);
            format!("{hours:02}:{:02}:{:02}", rest / 60, rest % 60)
        }
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(Some(600)), "00:10:00");
        assert_eq!(format_countdown(Some(90_061)), "25:01:01");
        assert_eq!(format_countdown(None), "-");
    }
}
