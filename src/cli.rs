use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ocstatus")]
#[command(version = concat!("Ver:", env!("CARGO_PKG_VERSION")))]
#[command(about = "Discover an ownCloud-family server from its status.php descriptor")]
pub struct Cli {
    /// Server base address, e.g. https://cloud.example.com
    pub url: Option<String>,

    /// Follow redirects hop by hop instead of letting the transport do it
    #[arg(short = 'm', long = "manual-redirects")]
    pub manual_redirects: bool,

    /// Hop bound for manual redirect following
    #[arg(long = "max-hops")]
    pub max_hops: Option<u32>,

    /// Print the result as JSON
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Write a default config file
    #[arg(long = "init")]
    pub init: bool,

    /// Validate the config file
    #[arg(long = "check")]
    pub check: bool,

    /// Print the effective config
    #[arg(long = "print")]
    pub print: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
