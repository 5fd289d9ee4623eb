//! Command line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dnsflow_core::types::{DdnsMode, ProviderType, RecordType};

#[derive(Debug, Parser)]
#[command(name = "dnsflow", version, about = "Multi-cloud DNS sync, DDNS and DNS-01 certificates")]
pub struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, env = "DNSFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database, overrides `database.path`
    #[arg(long, global = true, env = "DNSFLOW_DATABASE")]
    pub database: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `dnsflow_core=debug,info`
    #[arg(long, global = true, env = "DNSFLOW_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the scheduler until SIGINT/SIGTERM
    Serve,
    /// Manage provider accounts
    #[command(subcommand)]
    Provider(ProviderCommand),
    /// List locally known domains
    Domains,
    /// Reconcile local domains and records with the providers
    Sync {
        /// Only this provider
        #[arg(long)]
        provider: Option<String>,
    },
    /// Manage records of a domain
    #[command(subcommand)]
    Record(RecordCommand),
    /// Dynamic DNS
    #[command(subcommand)]
    Ddns(DdnsCommand),
    /// DNS-01 certificates
    #[command(subcommand)]
    Cert(CertCommand),
    /// Entry points for the ACME client's manual hooks
    #[command(subcommand)]
    Hook(HookCommand),
}

#[derive(Debug, Subcommand)]
pub enum ProviderCommand {
    Add(ProviderAddArgs),
    List,
    /// Verify credentials and record the result
    Test { id: String },
    Update(ProviderUpdateArgs),
    /// Refused while domains still reference the provider
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct ProviderAddArgs {
    #[arg(long)]
    pub name: String,
    /// aliyun, huaweicloud, dnspod or cloudflare
    #[arg(long = "type")]
    pub provider_type: ProviderType,
    /// Access key id (unused by Cloudflare)
    #[arg(long, default_value = "")]
    pub access_key: String,
    /// Secret key, or the API token for Cloudflare
    #[arg(long, env = "DNSFLOW_PROVIDER_SECRET", hide_env_values = true)]
    pub secret_key: String,
    #[arg(long)]
    pub region: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProviderUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub access_key: Option<String>,
    #[arg(long)]
    pub secret_key: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    List {
        /// Domain name or id
        domain: String,
    },
    Add(RecordAddArgs),
    Update(RecordUpdateArgs),
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct RecordAddArgs {
    /// Domain name or id
    #[arg(long)]
    pub domain: String,
    /// Relative name, `@` for the apex
    #[arg(long)]
    pub name: String,
    #[arg(long = "type")]
    pub record_type: RecordType,
    #[arg(long)]
    pub value: String,
    #[arg(long, default_value_t = 600)]
    pub ttl: u32,
    /// Required for MX
    #[arg(long)]
    pub priority: Option<u16>,
}

#[derive(Debug, Args)]
pub struct RecordUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub value: Option<String>,
    #[arg(long)]
    pub ttl: Option<u32>,
    #[arg(long)]
    pub priority: Option<u16>,
    #[arg(long)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum DdnsCommand {
    Add(DdnsAddArgs),
    List,
    /// Change a configuration
    Edit(DdnsEditArgs),
    /// Run one update now
    Update {
        id: String,
        /// Push the address even if it did not change
        #[arg(long)]
        force: bool,
    },
    /// Run every enabled configuration
    UpdateAll {
        #[arg(long)]
        force: bool,
    },
    Remove { id: String },
    /// Most recent update log entries
    Logs {
        id: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Configuration counts and the last 24 hours of updates
    Summary,
}

#[derive(Debug, Args)]
pub struct DdnsAddArgs {
    #[arg(long)]
    pub name: String,
    /// Domain name or id
    #[arg(long)]
    pub domain: String,
    /// Fully qualified name, e.g. `home.example.com`
    #[arg(long)]
    pub subdomain: String,
    /// A or AAAA
    #[arg(long = "type", default_value = "A")]
    pub record_type: RecordType,
    #[arg(long, default_value_t = 300)]
    pub interval: u64,
    /// auto or manual
    #[arg(long, default_value = "auto", value_parser = parse_ddns_mode)]
    pub mode: DdnsMode,
}

#[derive(Debug, Args)]
pub struct DdnsEditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub interval: Option<u64>,
    #[arg(long, value_parser = parse_ddns_mode)]
    pub mode: Option<DdnsMode>,
    #[arg(long)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum CertCommand {
    /// Issue a certificate through DNS-01
    Request {
        /// Domain name or id owning the certificate name
        #[arg(long)]
        domain: String,
        /// Certificate name, e.g. `www.example.com` or `*.example.com`
        #[arg(long)]
        name: String,
        #[arg(long)]
        no_auto_renew: bool,
    },
    Renew { id: String },
    List,
    /// Re-evaluate statuses and renew what is due
    Check,
    /// Valid certificates expiring within the given number of days
    Expiring {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Forget a certificate (files are kept)
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
pub enum HookCommand {
    /// Publish the challenge TXT record
    Auth,
    /// Retract the challenge TXT record
    Cleanup,
}

fn parse_ddns_mode(value: &str) -> Result<DdnsMode, String> {
    DdnsMode::parse(&value.trim().to_lowercase())
        .ok_or_else(|| format!("unknown mode '{value}', expected auto or manual"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dnsflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["sync", "--provider", "p1", "--database", "/tmp/x.db"]);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Command::Sync { provider: Some(ref p) } if p == "p1"));
    }

    #[test]
    fn provider_add_parses_type() {
        let cli = parse(&[
            "provider", "add", "--name", "cf", "--type", "cloudflare", "--secret-key", "tok",
        ]);
        let Command::Provider(ProviderCommand::Add(args)) = cli.command else {
            panic!("expected provider add");
        };
        assert_eq!(args.provider_type, ProviderType::Cloudflare);
        assert!(args.access_key.is_empty());
    }

    #[test]
    fn ddns_add_defaults() {
        let cli = parse(&[
            "ddns", "add", "--name", "home", "--domain", "example.com", "--subdomain",
            "home.example.com",
        ]);
        let Command::Ddns(DdnsCommand::Add(args)) = cli.command else {
            panic!("expected ddns add");
        };
        assert_eq!(args.record_type, RecordType::A);
        assert_eq!(args.interval, 300);
        assert_eq!(args.mode, DdnsMode::Auto);
    }

    #[test]
    fn ddns_mode_is_case_insensitive() {
        let cli = parse(&["ddns", "edit", "abc", "--mode", "Manual"]);
        let Command::Ddns(DdnsCommand::Edit(args)) = cli.command else {
            panic!("expected ddns edit");
        };
        assert_eq!(args.mode, Some(DdnsMode::Manual));
        assert!(Cli::try_parse_from(["dnsflow", "ddns", "edit", "abc", "--mode", "weekly"]).is_err());
    }

    #[test]
    fn unknown_record_type_is_rejected() {
        assert!(Cli::try_parse_from([
            "dnsflow", "record", "add", "--domain", "example.com", "--name", "x", "--type", "SRV",
            "--value", "v",
        ])
        .is_err());
    }

    #[test]
    fn listing_subcommands() {
        assert!(matches!(
            parse(&["cert", "expiring"]).command,
            Command::Cert(CertCommand::Expiring { days: 30 })
        ));
        assert!(matches!(
            parse(&["cert", "expiring", "--days", "7"]).command,
            Command::Cert(CertCommand::Expiring { days: 7 })
        ));
        assert!(matches!(parse(&["ddns", "summary"]).command, Command::Ddns(DdnsCommand::Summary)));
    }

    #[test]
    fn hook_subcommands() {
        assert!(matches!(parse(&["hook", "auth"]).command, Command::Hook(HookCommand::Auth)));
        assert!(matches!(
            parse(&["hook", "cleanup"]).command,
            Command::Hook(HookCommand::Cleanup)
        ));
    }
}
