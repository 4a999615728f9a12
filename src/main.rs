use ocstatus::cli::Cli;
use ocstatus::config::{Config, OutputFormat};
use ocstatus::core::discovery::{
    normalize_base_url, ConnectionSecurity, DiscoveryResult, RedirectMode,
};

#[cfg(feature = "network")]
use ocstatus::core::discovery::{DiscoverySession, IsahcTransport};

const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_CONFIGURED: i32 = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    if cli.init {
        let path = Config::init()?;
        println!("✓ Configuration written to {}", path.display());
        return Ok(());
    }

    let mut config = Config::load()?;

    if cli.check {
        config.check()?;
        println!("✓ Configuration valid");
        return Ok(());
    }

    if cli.manual_redirects {
        config.redirect_mode = RedirectMode::Manual;
    }
    if let Some(max_hops) = cli.max_hops {
        config.max_redirect_hops = max_hops;
    }
    if cli.json {
        config.output = OutputFormat::Json;
    }

    if cli.print {
        config.print()?;
        return Ok(());
    }

    config.check()?;

    let Some(url) = cli.url else {
        eprintln!("Missing server URL. Usage: ocstatus <URL>");
        std::process::exit(EXIT_FAILURE);
    };
    let base_url = normalize_base_url(url.trim());

    let result = run_discovery(&config, &base_url)?;
    print_result(&config, &result)?;

    match result {
        DiscoveryResult::Success { .. } => Ok(()),
        DiscoveryResult::NotConfigured => std::process::exit(EXIT_NOT_CONFIGURED),
        DiscoveryResult::Failure(_) => std::process::exit(EXIT_FAILURE),
    }
}

#[cfg(feature = "network")]
fn run_discovery(
    config: &Config,
    base_url: &str,
) -> Result<DiscoveryResult, Box<dyn std::error::Error>> {
    let transport = IsahcTransport::new(config.user_agent.clone())?;
    let mut session = DiscoverySession::with_options(transport, config.discovery_options());
    Ok(session.discover(base_url))
}

#[cfg(not(feature = "network"))]
fn run_discovery(
    _config: &Config,
    _base_url: &str,
) -> Result<DiscoveryResult, Box<dyn std::error::Error>> {
    Err("Network feature is not enabled. Please install with --features network".into())
}

fn print_result(config: &Config, result: &DiscoveryResult) -> Result<(), Box<dyn std::error::Error>> {
    if config.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match result {
        DiscoveryResult::Success { info, security } => {
            println!("✓ Server found: {}", info.base_url);
            println!("  Version: {}", info.version);
            if !info.version.is_valid() {
                println!("  Warning: version string is not recognised");
            }
            let security_text = match security {
                ConnectionSecurity::Secure => "secure (https)",
                ConnectionSecurity::Insecure => "insecure (http)",
                ConnectionSecurity::RedirectedToInsecure => {
                    "WARNING: redirected from https to an insecure location"
                }
            };
            println!("  Connection: {}", security_text);
        }
        DiscoveryResult::NotConfigured => {
            println!("✗ Server is installed but not configured yet");
        }
        DiscoveryResult::Failure(detail) => {
            println!("✗ Discovery failed at {}: {}", detail.location, detail.message);
        }
    }
    Ok(())
}
