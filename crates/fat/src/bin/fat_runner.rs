/*!
 * FAT Runner Binary
 *
 * Command-line entry point for the LDAP user-registry FAT suites:
 * provision the local LDAP topology, start the server under test, wait on
 * its readiness markers, run the suites against the registry servlet and
 * tear everything down again.
 *
 * Usage:
 *   cargo run --bin fat-runner -- [OPTIONS]
 *
 * Author: LDAP Registry FAT Team
 * Created: 2026-08-20
 */

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use fat_harness::{provision, HarnessConfig, ProcessLdapControl, RetryPolicy, ServerInstance};
use ldap_topology::TopologyRegistry;
use registry_client::RegistryServletConnection;
use registry_fat::login::LoginSuite;
use registry_fat::membership::MembershipSuite;
use registry_fat::realm::RealmSuite;
use registry_fat::{bootstrap_vars, suite_topology, FatSettings, SuiteSummary};

/// LDAP user-registry FAT runner
#[derive(Parser)]
#[command(name = "fat-runner")]
#[command(about = "Runs the LDAP user-registry FAT suites against a live server")]
struct Cli {
    /// Harness configuration file (TOML); defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feature manifest to install into the server before start
    #[arg(long, value_name = "FILE")]
    feature: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = match &cli.config {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    let settings = FatSettings::default();
    let policy = config.retry.policy();

    info!("provisioning suite LDAP topology");
    let topology = suite_topology();
    let control = ProcessLdapControl::new(config.ldap.clone(), policy);
    let context = provision(topology, &control)
        .await
        .context("LDAP provisioning failed, aborting suite")?;

    let summary = run_suites(&cli, &config, &policy, &settings, context.topology()).await;

    // Teardown is best-effort regardless of how the suites went
    let ldap_failures = context.teardown(&control).await;
    if ldap_failures > 0 {
        warn!(failures = ldap_failures, "some LDAP servers did not stop cleanly");
    }

    let summary = summary?;
    report(&summary);
    if let Some(path) = &cli.output_file {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "run summary written");
    }
    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Start the server, run every suite and stop the server again; server
/// teardown runs even when a suite run errors out
async fn run_suites(
    cli: &Cli,
    config: &HarnessConfig,
    policy: &RetryPolicy,
    settings: &FatSettings,
    topology: &TopologyRegistry,
) -> anyhow::Result<SuiteSummary> {
    let mut server = ServerInstance::new(config.server.clone());
    let result = execute(cli, policy, settings, topology, &mut server).await;

    if let Err(e) = server.stop().await {
        warn!(error = %e, "server did not stop cleanly");
    }
    let feature_failures = server.remove_installed_features();
    if feature_failures > 0 {
        warn!(failures = feature_failures, "some feature manifests were not removed");
    }
    result
}

async fn execute(
    cli: &Cli,
    policy: &RetryPolicy,
    settings: &FatSettings,
    topology: &TopologyRegistry,
    server: &mut ServerInstance,
) -> anyhow::Result<SuiteSummary> {
    server
        .write_bootstrap_properties(&bootstrap_vars(topology))
        .context("writing bootstrap properties")?;
    if let Some(feature) = &cli.feature {
        server
            .install_feature(feature)
            .with_context(|| format!("installing {}", feature.display()))?;
    }

    server.start(policy).await.context("server failed to start")?;

    let servlet = RegistryServletConnection::new(
        &server.config().hostname,
        server.config().http_port,
    );
    let realm = servlet
        .wait_for_realm(policy)
        .await
        .context("realm lookup failed")?;
    match realm.into_ready() {
        Some(realm) => info!(%realm, "registry servlet is answering"),
        None => anyhow::bail!("registry servlet never reported a realm"),
    }

    let summaries = vec![
        RealmSuite::new(&servlet, settings).run().await,
        LoginSuite::new(&servlet, settings).run().await,
        MembershipSuite::new(&servlet, settings).run().await,
    ];
    Ok(SuiteSummary::merged("registry-fat", summaries))
}

fn report(summary: &SuiteSummary) {
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        duration = ?summary.total_duration,
        "FAT run finished"
    );
    for failure in summary.failures() {
        error!(
            case = %failure.name,
            error = failure.error.as_deref().unwrap_or("unknown"),
            "case failed"
        );
    }
}
