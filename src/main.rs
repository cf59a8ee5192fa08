// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use netweave::{
    config::OperatorConfig,
    constants::{ERROR_REQUEUE_DURATION_SECS, KIND_SUBNET, KIND_SUBNET_SET, SYNCED_REQUEUE_DURATION_SECS},
    context::Context,
    crd::{Subnet, SubnetSet},
    fabric::HttpFabricClient,
    metrics,
    reconcilers::{reconcile_subnet, reconcile_subnetset},
    subnets::SubnetService,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    // One worker per available core; each reconcile occupies one slot for
    // its full duration, waiters included
    let workers = std::thread::available_parallelism().map_or(4, usize::from);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("netweave-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Respects RUST_LOG for filtering and RUST_LOG_FORMAT=json for output
    // format; defaults to INFO-level text
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let config = OperatorConfig::parse();
    info!("Starting VPC Subnet Operator");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    debug!(endpoint = %config.fabric_endpoint, "Initializing fabric client");
    let fabric = Arc::new(HttpFabricClient::new(&config)?);

    // Priming the store must complete before any reconcile runs; a fabric
    // that cannot be listed is a fatal initialization error
    let service = match SubnetService::new(config.clone(), fabric).await {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("failed to initialize subnet service: {e}");
            anyhow::bail!("failed to initialize subnet service: {e}");
        }
    };
    metrics::set_store_size(service.store().len());

    let context = Arc::new(Context::new(client.clone(), service, config.clone()));

    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::serve_metrics(metrics_port).await {
            error!("metrics server exited: {e}");
        }
    });

    info!("Starting all controllers");

    // Controllers should never exit - if one does, log it and exit the
    // main process
    tokio::select! {
        result = run_subnet_controller(client.clone(), context.clone()) => {
            error!("CRITICAL: Subnet controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Subnet controller exited unexpectedly without error")
        }
        result = run_subnetset_controller(client.clone(), context.clone()) => {
            error!("CRITICAL: SubnetSet controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("SubnetSet controller exited unexpectedly without error")
        }
    }
}

/// Run the `Subnet` controller
async fn run_subnet_controller(client: Client, context: Arc<Context>) -> Result<()> {
    info!("Starting Subnet controller");

    let api = Api::<Subnet>::all(client);

    Controller::new(api, Config::default())
        .run(reconcile_subnet_wrapper, error_policy_subnet, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `SubnetSet` controller
async fn run_subnetset_controller(client: Client, context: Arc<Context>) -> Result<()> {
    info!("Starting SubnetSet controller");

    let api = Api::<SubnetSet>::all(client);

    Controller::new(api, Config::default())
        .run(reconcile_subnetset_wrapper, error_policy_subnetset, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `Subnet`
async fn reconcile_subnet_wrapper(
    subnet: Arc<Subnet>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    match reconcile_subnet(ctx.clone(), (*subnet).clone()).await {
        Ok(()) => {
            info!("Successfully reconciled Subnet: {}", subnet.name_any());
            metrics::record_reconciliation_success(KIND_SUBNET, start.elapsed());
            metrics::set_store_size(ctx.service.store().len());
            Ok(Action::requeue(Duration::from_secs(
                SYNCED_REQUEUE_DURATION_SECS,
            )))
        }
        Err(e) => {
            error!("Failed to reconcile Subnet: {}", e);
            metrics::record_reconciliation_error(KIND_SUBNET, start.elapsed());
            Err(e.into())
        }
    }
}

/// Reconcile wrapper for `SubnetSet`
async fn reconcile_subnetset_wrapper(
    set: Arc<SubnetSet>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    match reconcile_subnetset(ctx.clone(), (*set).clone()).await {
        Ok(()) => {
            info!("Successfully reconciled SubnetSet: {}", set.name_any());
            metrics::record_reconciliation_success(KIND_SUBNET_SET, start.elapsed());
            metrics::set_store_size(ctx.service.store().len());
            Ok(Action::requeue(Duration::from_secs(
                SYNCED_REQUEUE_DURATION_SECS,
            )))
        }
        Err(e) => {
            error!("Failed to reconcile SubnetSet: {}", e);
            metrics::record_reconciliation_error(KIND_SUBNET_SET, start.elapsed());
            Err(e.into())
        }
    }
}

fn error_policy_subnet(subnet: Arc<Subnet>, error: &ReconcileError, _ctx: Arc<Context>) -> Action {
    warn!(
        subnet = %subnet.name_any(),
        %error,
        "reconcile failed, requeueing"
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

fn error_policy_subnetset(
    set: Arc<SubnetSet>,
    error: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    warn!(
        subnetset = %set.name_any(),
        %error,
        "reconcile failed, requeueing"
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
