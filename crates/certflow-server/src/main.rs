//! Certflow server CLI
//!
//! Wires the SQL-backed request store, the DNS providers, the ACME
//! issuer, and the REST API into a single binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certflow_acme::{AcmeEnvironment, AcmeIssuer};
use certflow_api::{ApiServer, ApiServerConfig};
use certflow_core::{
    Orchestrator, OrchestratorConfig, OrchestratorSecrets, StaticSecrets,
};
use certflow_dns::{
    AccountDnsCredentials, AccountDnsProvider, HttpIntermediateProvider, IntermediateCredentials,
    IntermediateDnsProvider, PanelDnsClient, VerificationPoller,
};

mod accounts;
use accounts::CatalogFile;

#[derive(Parser, Debug)]
#[command(
    name = "certflow-server",
    about = "Certificate lifecycle orchestrator for hosting panels",
    version,
    long_about = "Issues dns-01 certificates for hosting accounts by delegating\n\
                  ACME challenges to an intermediate DNS zone.\n\n\
                  Example:\n  \
                  certflow-server \\\n    \
                  --listen 0.0.0.0:8080 \\\n    \
                  --database-url sqlite://certflow.db?mode=rwc \\\n    \
                  --accounts accounts.json \\\n    \
                  --service-domain example-service.com \\\n    \
                  --intermediate-endpoint https://dns.acme-proxy.test \\\n    \
                  --intermediate-zone acme-proxy.test \\\n    \
                  --contact-email hostmaster@example-service.com"
)]
struct Cli {
    /// Listen address for the REST API
    #[arg(
        short = 'l',
        long,
        default_value = "127.0.0.1:8080",
        env = "CERTFLOW_LISTEN"
    )]
    listen: SocketAddr,

    /// Database connection URL (SQLite or Postgres)
    #[arg(
        long,
        default_value = "sqlite://certflow.db?mode=rwc",
        env = "CERTFLOW_DATABASE_URL"
    )]
    database_url: String,

    /// Hosting account catalog and API token table (JSON)
    #[arg(long, env = "CERTFLOW_ACCOUNTS")]
    accounts: PathBuf,

    /// Operator-controlled domain whose sub-domains are managed
    /// (can be specified multiple times)
    #[arg(long = "service-domain", value_name = "DOMAIN")]
    service_domains: Vec<String>,

    /// Intermediate DNS authority API endpoint
    #[arg(long, env = "CERTFLOW_INTERMEDIATE_ENDPOINT")]
    intermediate_endpoint: String,

    /// Intermediate DNS authority API token
    #[arg(long, env = "CERTFLOW_INTERMEDIATE_TOKEN", hide_env_values = true)]
    intermediate_token: String,

    /// Zone hosting the delegated challenge records
    #[arg(long, env = "CERTFLOW_INTERMEDIATE_ZONE")]
    intermediate_zone: String,

    /// Contact email registered with the certificate authority
    #[arg(long, env = "CERTFLOW_CONTACT_EMAIL")]
    contact_email: String,

    /// Use the CA staging endpoints
    #[arg(long, env = "CERTFLOW_STAGING")]
    staging: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "certflow=debug".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "certflow=info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting certflow server");
    tracing::info!("Listen: {}", cli.listen);
    tracing::info!("Database: {}", cli.database_url);
    tracing::info!("Intermediate zone: {}", cli.intermediate_zone);

    if cli.service_domains.is_empty() {
        tracing::warn!("⚠️  No service domains configured - every domain is treated as custom");
    } else {
        tracing::info!("Service domains:");
        for domain in &cli.service_domains {
            tracing::info!("  - {}", domain);
        }
    }

    let environment = if cli.staging {
        tracing::warn!("⚠️  Using CA STAGING endpoints - certificates will not be trusted");
        AcmeEnvironment::Staging
    } else {
        AcmeEnvironment::Production
    };

    // Account catalog and API tokens
    let catalog = CatalogFile::load(&cli.accounts)?;
    tracing::info!(
        "Loaded {} hosting accounts, {} API tokens",
        catalog.accounts.len(),
        catalog.api_tokens.len()
    );
    let auth = catalog.auth_state();
    let account_store = Arc::new(catalog.into_store());

    // Request persistence
    let db = certflow_db::connect(&cli.database_url).await?;
    certflow_db::migrate(&db).await?;
    let requests = Arc::new(certflow_db::SeaOrmRequestStore::new(db));

    let secrets = StaticSecrets(OrchestratorSecrets {
        intermediate: IntermediateCredentials {
            api_endpoint: cli.intermediate_endpoint.clone(),
            api_token: cli.intermediate_token.clone(),
            zone: cli.intermediate_zone.clone(),
        },
        contact_email: cli.contact_email.clone(),
        environment,
    });

    let orchestrator = Orchestrator::new(
        OrchestratorConfig::new(cli.service_domains.clone()),
        account_store,
        requests,
        Arc::new(secrets),
        Arc::new(|creds: &IntermediateCredentials| {
            Ok(Arc::new(HttpIntermediateProvider::new(creds.clone())?)
                as Arc<dyn IntermediateDnsProvider>)
        }),
        Arc::new(|creds: &AccountDnsCredentials| {
            Ok(Arc::new(PanelDnsClient::new(creds.clone())?) as Arc<dyn AccountDnsProvider>)
        }),
        Arc::new(VerificationPoller::new()),
        Arc::new(AcmeIssuer::new()),
    );

    let server = ApiServer::new(
        ApiServerConfig {
            bind_addr: cli.listen,
            enable_cors: true,
        },
        orchestrator,
        auth,
    );

    server.start().await
}
