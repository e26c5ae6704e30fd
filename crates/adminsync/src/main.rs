// # adminsync
//
// This binary is a THIN integration layer:
// - All reconciliation logic lives in adminsync-core
// - Configuration is via environment variables ONLY
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Establishing a session with the cloud API
// 4. Running the driver once over the configured gateway domains
// 5. Mapping the run summary to an exit code
//
// ## Configuration
//
// ### Required
// - `ADMINSYNC_MANAGEMENT_URL`: Management API base URL (e.g. https://vmc.vmware.com)
// - `ADMINSYNC_AUTH_URL`: Authentication service base URL (e.g. https://console.cloud.vmware.com)
// - `ADMINSYNC_REFRESH_TOKEN`: Refresh token
// - `ADMINSYNC_ORG_ID`: Organization id
// - `ADMINSYNC_DATACENTER_ID`: Data center (SDDC) id
//
// ### Optional
// - `ADMINSYNC_IP_SOURCE_URL`: IP echo service (default https://api.ipify.org)
// - `ADMINSYNC_STATE_PATH`: Persisted address file (default ipaddress.txt)
// - `ADMINSYNC_GROUP_NAME`: Group name (default Allow-Admin-Access)
// - `ADMINSYNC_GATEWAYS`: Comma-separated gateway domains (default mgw,cgw)
// - `ADMINSYNC_MODE`: `dry-run` to log mutations without sending them
// - `ADMINSYNC_STRICT_EXIT`: `true` to exit 3 when any gateway reports a failure
// - `ADMINSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ADMINSYNC_MANAGEMENT_URL=https://vmc.vmware.com
// export ADMINSYNC_AUTH_URL=https://console.cloud.vmware.com
// export ADMINSYNC_REFRESH_TOKEN=your_token
// export ADMINSYNC_ORG_ID=...
// export ADMINSYNC_DATACENTER_ID=...
//
// adminsync
// ```

use adminsync_core::config::{ApiConfig, GroupConfig, IpSourceConfig, RunConfig, StateStoreConfig};
use adminsync_core::{
    AddressResolver, AddressStore, Driver, FileAddressStore, GatewayDomain, MemoryAddressStore,
    Reconciler, RunSummary, SyncConfig, establish_session,
};
use adminsync_ip_http::HttpAddressSource;
use adminsync_provider_vmc::{CspSessionProvider, NsxGroupClient};
use anyhow::Result;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Run completed (per-gateway failures are logged, not signalled, unless strict)
/// - 1: Configuration or startup error
/// - 2: Runtime error (session could not be established)
/// - 3: Strict mode and at least one gateway reported a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminsyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    PartialFailure = 3,
}

impl From<AdminsyncExitCode> for ExitCode {
    fn from(code: AdminsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    sync: SyncConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api = ApiConfig {
            management_url: get("ADMINSYNC_MANAGEMENT_URL").unwrap_or_default(),
            auth_url: get("ADMINSYNC_AUTH_URL").unwrap_or_default(),
            refresh_token: get("ADMINSYNC_REFRESH_TOKEN").unwrap_or_default(),
            org_id: get("ADMINSYNC_ORG_ID").unwrap_or_default(),
            datacenter_id: get("ADMINSYNC_DATACENTER_ID").unwrap_or_default(),
        };

        let mut group = GroupConfig::default();
        if let Some(name) = get("ADMINSYNC_GROUP_NAME") {
            group.name = name;
        }
        if let Some(gateways) = get("ADMINSYNC_GATEWAYS") {
            group.gateways = parse_gateways(&gateways)?;
        }

        let mut ip_source = IpSourceConfig::default();
        if let Some(url) = get("ADMINSYNC_IP_SOURCE_URL") {
            ip_source.url = url;
        }

        let mut state = StateStoreConfig::default();
        if let Some(path) = get("ADMINSYNC_STATE_PATH") {
            state.path = path;
        }

        let dry_run = match get("ADMINSYNC_MODE") {
            None => false,
            Some(mode) => match mode.to_lowercase().as_str() {
                "dry-run" => true,
                "live" => false,
                _ => anyhow::bail!(
                    "ADMINSYNC_MODE '{}' is not valid. Valid modes: live, dry-run",
                    mode
                ),
            },
        };

        let strict_exit = match get("ADMINSYNC_STRICT_EXIT") {
            None => false,
            Some(value) => parse_bool("ADMINSYNC_STRICT_EXIT", &value)?,
        };

        Ok(Self {
            sync: SyncConfig {
                api,
                ip_source,
                state,
                group,
                run: RunConfig {
                    dry_run,
                    strict_exit,
                },
            },
            log_level: get("ADMINSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let missing = self.sync.api.missing_fields();
        if !missing.is_empty() {
            let vars: Vec<String> = missing
                .iter()
                .map(|field| format!("ADMINSYNC_{}", field.to_uppercase()))
                .collect();
            anyhow::bail!(
                "ADMINSYNC_MANAGEMENT_URL, ADMINSYNC_AUTH_URL, ADMINSYNC_REFRESH_TOKEN, \
                ADMINSYNC_ORG_ID and ADMINSYNC_DATACENTER_ID must all be populated. Missing: {}",
                vars.join(", ")
            );
        }

        self.sync.validate()?;
        parse_level(&self.log_level)?;

        Ok(())
    }
}

fn parse_gateways(value: &str) -> Result<Vec<GatewayDomain>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<GatewayDomain>()
                .map_err(|_| anyhow::anyhow!("ADMINSYNC_GATEWAYS entry '{}' is not valid. Valid: mgw, cgw", s))
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", key, value),
    }
}

fn parse_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ADMINSYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AdminsyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return AdminsyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AdminsyncExitCode::ConfigError.into();
    }

    info!("Starting adminsync");
    info!(
        "Group {} on gateway(s): {}",
        config.sync.group.name,
        config
            .sync
            .group
            .gateways
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if config.sync.run.dry_run {
        warn!("Running in DRY-RUN mode - no changes will be made");
    }

    // Single run, strictly sequential
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AdminsyncExitCode::RuntimeError.into();
        }
    };

    let strict_exit = config.sync.run.strict_exit;
    let result = rt.block_on(async {
        match run_once(&config.sync).await {
            Ok(summary) => exit_code_for(&summary, strict_exit),
            Err(e) => {
                error!("Run failed: {}", e);
                AdminsyncExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Establish a session and reconcile every configured gateway once
async fn run_once(config: &SyncConfig) -> Result<RunSummary> {
    let sessions = CspSessionProvider::from_config(&config.api)?;
    let session = establish_session(
        &sessions,
        &config.api.refresh_token,
        &config.api.org_id,
        &config.api.datacenter_id,
    )
    .await?;

    let source = HttpAddressSource::new(&config.ip_source.url)?;
    debug!("Resolving current address via {}", source.url());
    let file_store = FileAddressStore::new(&config.state.path);

    // Dry runs read the persisted address but never overwrite it
    let store: Box<dyn AddressStore> = if config.run.dry_run {
        let scratch = match file_store.load().await?.address() {
            Some(former) => MemoryAddressStore::with_address(former),
            None => MemoryAddressStore::new(),
        };
        Box::new(scratch)
    } else {
        Box::new(file_store)
    };

    let groups = NsxGroupClient::new(config.run.dry_run)?;
    let reconciler = Reconciler::new(
        AddressResolver::new(Box::new(source), store),
        Box::new(groups),
    );

    let driver = Driver::new(reconciler, &config.group);
    let summary = driver.run(&session).await;

    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    for result in &summary.results {
        match &result.result {
            Ok(report) if report.has_failure() => {
                warn!("Gateway {}: {:?}", result.domain, report.outcome)
            }
            Ok(report) => info!("Gateway {}: {:?}", result.domain, report.outcome),
            Err(e) => error!("Gateway {}: {}", result.domain, e),
        }
    }

    if let Some(e) = &summary.persist_error {
        error!("Current address was not persisted: {}", e);
    }
    if summary.has_failures() {
        warn!("Run completed with failures");
    } else {
        info!("Run completed");
    }
}

fn exit_code_for(summary: &RunSummary, strict_exit: bool) -> AdminsyncExitCode {
    if strict_exit && summary.has_failures() {
        AdminsyncExitCode::PartialFailure
    } else {
        AdminsyncExitCode::Success
    }
}
