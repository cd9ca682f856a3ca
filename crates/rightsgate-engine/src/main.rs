//! rightsgate CLI.
//!
//! - `eval`: decide one request context (JSON) against a policy file;
//!   `--metrics` dumps the engine counters afterwards.
//! - `check`: compile a tenant's policies and report the malformed ones.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use rightsgate_core::PolicyContext;
use rightsgate_engine::audit::TracingDecisionSink;
use rightsgate_engine::config::{self, RightsGateConfig};
use rightsgate_engine::obs::logging;
use rightsgate_engine::store::{compile_records, InMemoryPolicyStore, PolicyStore};
use rightsgate_engine::PolicyEngine;

#[derive(Debug, Parser)]
#[command(name = "rightsgate", version, about = "Multi-tenant authorization policy engine")]
struct Cli {
    /// YAML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a request context and print the decision as JSON.
    Eval {
        /// JSON file holding one policy context.
        #[arg(long)]
        context: PathBuf,
        /// JSON array of policy records; overrides `store.policies_file`.
        #[arg(long)]
        policies: Option<PathBuf>,
        /// Print engine metrics (Prometheus text) to stderr afterwards.
        #[arg(long)]
        metrics: bool,
    },
    /// Compile a tenant's stored policies and list them in evaluation order.
    Check {
        #[arg(long)]
        tenant: u64,
        #[arg(long)]
        policies: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RightsGateConfig::default(),
    };
    logging::init(&cfg.log)?;

    match cli.command {
        Command::Eval {
            context,
            policies,
            metrics,
        } => {
            let store = open_store(&cfg, policies)?;
            let raw = std::fs::read_to_string(&context)
                .with_context(|| format!("reading context {}", context.display()))?;
            let ctx: PolicyContext = serde_json::from_str(&raw).context("parsing policy context")?;

            let mut engine = PolicyEngine::new(store, &cfg.engine);
            if cfg.engine.audit {
                engine = engine.with_sink(Arc::new(TracingDecisionSink));
            }

            let result = engine.evaluate_policy(&ctx).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if metrics {
                eprint!("{}", engine.metrics().render());
            }
        }
        Command::Check { tenant, policies } => {
            let store = open_store(&cfg, policies)?;
            let records = store.load_enabled_policies(tenant).await?;
            let compiled = compile_records(records);

            for p in &compiled.policies {
                println!("{:>6}  {:<11}  {}", p.priority, p.kind.as_str(), p.name);
            }
            for e in &compiled.rejected {
                eprintln!("{e}");
            }
            if !compiled.rejected.is_empty() {
                bail!("{} malformed policies for tenant {tenant}", compiled.rejected.len());
            }
        }
    }

    Ok(())
}

fn open_store(cfg: &RightsGateConfig, override_path: Option<PathBuf>) -> anyhow::Result<Arc<dyn PolicyStore>> {
    let path = override_path
        .or_else(|| cfg.store.policies_file.as_ref().map(PathBuf::from))
        .context("no policy file: pass --policies or set store.policies_file")?;
    let store = InMemoryPolicyStore::from_file(&path)?;
    tracing::info!(path = %path.display(), tenants = store.tenant_ids().len(), "policy store loaded");
    Ok(Arc::new(store))
}
