use clap::Parser;
use dnssec_audit::audit::ChainWalker;
use dnssec_audit::checks::{NameserverProbe, Nsec3ParamProbe, RrsigValidator};
use dnssec_audit::config::{AuditConfig, parse_resolver};
use dnssec_audit::dnssec::TrustAnchorStore;
use dnssec_audit::output::{JsonSink, OutputSink};
use dnssec_audit::resolver::{QueryTransport, StubResolver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Audit the DNSSEC chain of trust of a domain
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Domain name to audit
    domain: String,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Recursive resolver to query (ip or ip:port)
    #[arg(short, long)]
    resolver: Option<String>,

    /// Timeout for a single query attempt (milliseconds)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Retries after a failed query attempt
    #[arg(long)]
    retries: Option<u8>,

    /// TOML file with additional trust anchors
    #[arg(long)]
    trust_anchors: Option<PathBuf>,

    /// Query every authoritative nameserver of each zone
    #[arg(long)]
    survey_nameservers: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn apply_args(config: &mut AuditConfig, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(resolver) = &args.resolver {
        config.resolver = parse_resolver(resolver)?;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.query_timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }
    if args.trust_anchors.is_some() {
        config.trust_anchor_file = args.trust_anchors.clone();
    }
    if args.output.is_some() {
        config.output_path = args.output.clone();
    }
    config.survey_nameservers |= args.survey_nameservers;
    config.pretty |= args.pretty;
    config.validate()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the report
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AuditConfig::from_env()?;
    apply_args(&mut config, &args)?;
    debug!("Configuration: {:?}", config);

    let anchors = TrustAnchorStore::new();
    if let Some(path) = &config.trust_anchor_file {
        let added = anchors.load_file(path)?;
        info!("Loaded {} trust anchor(s) from {}", added, path.display());
    }
    debug!("Trust anchors configured for {} zone(s)", anchors.zone_count());

    let resolver = Arc::new(StubResolver::new(&config));
    info!("Using resolver {}", resolver.server());
    let transport: Arc<dyn QueryTransport> = resolver.clone();

    let mut walker = ChainWalker::new(
        transport.clone(),
        Arc::new(Nsec3ParamProbe::new(transport.clone())),
        Arc::new(RrsigValidator::new(transport.clone())),
        Arc::new(anchors),
    );
    if config.survey_nameservers {
        walker = walker.with_survey(Arc::new(NameserverProbe::new(transport, resolver)));
    }

    let report = walker.audit_chain(&args.domain).await?;
    JsonSink::new(config.output_path, config.pretty).emit(&report)?;

    Ok(())
}
