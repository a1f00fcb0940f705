//! Alpha Requestor
//!
//! Scores a market of provider offers with the reputation-aware strategy,
//! tests the selected providers with one verified factoring task each and
//! settles their billing documents.

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use repu_client::{ReputationClient, ReputationSource, StaticReputation};
use repu_core::{DebitNote, Invoice, Task};
use repu_strategy::AlphaStrategy;
use repu_worker::{prepare_task_data, run_agreement, ProcessExecutor, TaskProtocol, TaskQueue};

mod config;
mod market;
mod report;

use config::Args;
use market::LocalMarket;
use report::AgreementReport;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Logs go to a file; stdout is reserved for the run report.
    let log_file = std::fs::File::create(args.log_path())?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("repu=info,a1_requestor=info")),
        )
        .with_ansi(false)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let reputation: Arc<dyn ReputationSource> = if args.offline {
        Arc::new(StaticReputation::new())
    } else {
        Arc::new(ReputationClient::new(&args.client_config())?)
    };
    let strategy = Arc::new(AlphaStrategy::new(args.strategy_config(), reputation)?);
    let protocol_config = args.protocol_config();
    protocol_config.validate()?;

    let market = match &args.offers {
        Some(path) => LocalMarket::load(path)?,
        None => LocalMarket::synthetic(args.min_offers.max(args.num_providers) * 2, &mut rng),
    };
    info!(
        offers = market.len(),
        repu_factor = args.repu_factor,
        min_offers = args.min_offers,
        offline = args.offline,
        "Starting requestor"
    );
    if market.is_empty() {
        warn!("Market has no offers");
    }

    market.publish(strategy.as_ref());

    let mut scoring = JoinSet::new();
    for offer in market.offers().iter().cloned() {
        let strategy = Arc::clone(&strategy);
        scoring.spawn(async move {
            let score = strategy.score_offer(&offer).await;
            (score, offer)
        });
    }

    let mut selected = Vec::new();
    while let Some(joined) = scoring.join_next().await {
        let (score, offer) = joined?;
        if score >= 0.0 {
            selected.push((score, offer));
        }
    }
    selected.sort_by(|a, b| b.0.total_cmp(&a.0));
    selected.truncate(args.num_providers);
    if selected.len() < args.num_providers {
        warn!(
            selected = selected.len(),
            planned = args.num_providers,
            "Fewer acceptable offers than planned providers"
        );
    }

    let payload = prepare_task_data(args.task_size as usize, &mut rng)?;
    let queue: TaskQueue = selected
        .iter()
        .map(|_| Task::new(payload.clone()))
        .collect();
    let executor = Arc::new(ProcessExecutor::new());

    let mut runs = JoinSet::new();
    for (score, offer) in &selected {
        let agreement = market.sign_agreement(offer);
        info!(agreement_id = %agreement.agreement_id, score, "Testing provider");

        let protocol = TaskProtocol::new(
            agreement.agreement_id.clone(),
            agreement.activity_id.clone(),
            queue.for_agreement(agreement.agreement_id.clone()),
            &protocol_config,
        );
        let strategy = Arc::clone(&strategy);
        let executor = Arc::clone(&executor);
        runs.spawn(async move {
            let started = Instant::now();
            let run = run_agreement(protocol, executor.as_ref(), strategy.as_ref());
            let outcome = run.await;
            (agreement, outcome, started.elapsed())
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = runs.join_next().await {
        let (agreement, outcome, elapsed) = joined?;
        let outcome = outcome?;
        println!(
            "{} out of {} planned providers tested",
            reports.len() + 1,
            args.num_providers
        );

        let amount_due = report::billed_amount(&agreement.offer.pricing, elapsed);

        let debit_note = DebitNote::new(
            agreement.agreement_id.clone(),
            agreement.activity_id.clone(),
            amount_due,
        );
        let invoice = Invoice::new(agreement.agreement_id.clone(), amount_due);

        reports.push(AgreementReport {
            provider_id: agreement.provider_id().clone(),
            agreement_id: agreement.agreement_id,
            outcome: report::outcome_label(&outcome),
            amount_due,
            debit_approved: strategy.approved_debit_amount(&debit_note),
            invoice_approved: strategy.approved_invoice_amount(&invoice),
        });
    }
    reports.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));

    let summary = strategy.summary();
    info!(
        payable_agreements = summary.payable_agreements,
        failed_activities = summary.failed_activities,
        "Run finished"
    );
    println!("{}", report::render(&reports, &summary));

    Ok(())
}
