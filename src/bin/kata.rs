use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kata::{
    DnsConfig, Permission, PermissionContext, TemplateService,
    config::SerialClock,
    db::{self, SqliteTemplateStore, SqliteZoneRecordStore},
    powerdns::PowerDnsClient,
    store::ZoneRecordStore,
    template::{NewTemplateRecord, TemplateDetails},
};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, value_name = "PATH")]
    db_path: PathBuf,
    /// JSON file with DNS settings; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Nameserver for [NS1]..[NS4] (repeat up to four times)
    #[arg(long = "ns", value_name = "FQDN")]
    nameservers: Vec<String>,
    /// Hostmaster for SOA records, as a name or an email address
    #[arg(long, value_name = "FQDN")]
    hostmaster: Option<String>,
    /// Default TTL for records stored with TTL 0
    #[arg(long, value_name = "SECONDS")]
    ttl: Option<u32>,
    /// Take the [SERIAL] date from the local clock instead of UTC
    #[arg(long)]
    local_serial: bool,
    /// Quote TXT and SPF content that is not quoted yet
    #[arg(long)]
    txt_auto_quote: bool,
    /// Acting user id
    #[arg(long, value_name = "ID", default_value_t = 1)]
    user_id: i64,
    /// Act with every permission
    #[arg(long)]
    ueberuser: bool,
    /// PowerDNS API URL; zones live in the local database when unset
    #[arg(long, value_name = "URL", requires = "pdns_key")]
    pdns_url: Option<String>,
    /// PowerDNS API key
    #[arg(long, value_name = "KEY")]
    pdns_key: Option<String>,
    /// PowerDNS server ID
    #[arg(long, value_name = "ID", default_value = "localhost")]
    pdns_server_id: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    /// List the templates visible to the acting user
    List,
    /// Create a template holding only the default SOA record
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        global: bool,
    },
    /// Derive a template from the records of an existing zone
    SaveAs {
        #[arg(long)]
        zone: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        global: bool,
    },
    /// Show the records of a template, resolved for ZONE when given
    Show {
        #[arg(long)]
        template: i64,
        #[arg(long)]
        zone: Option<String>,
    },
    /// Write the records of a template into a zone
    Apply {
        #[arg(long)]
        template: i64,
        #[arg(long)]
        zone: String,
    },
    /// Create a zone in the local database, optionally from a template
    CreateZone {
        #[arg(long)]
        zone: String,
        #[arg(long)]
        template: Option<i64>,
    },
    /// Delete a template and its records
    Delete {
        #[arg(long)]
        template: i64,
    },
    /// Add a record to a template
    AddRecord {
        #[arg(long)]
        template: i64,
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        rtype: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = 0)]
        ttl: u32,
        #[arg(long, default_value_t = 0)]
        prio: i64,
    },
    /// Delete a record from a template
    DeleteRecord {
        #[arg(long)]
        record: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = build_dns_config(&cli)?;

    if let Some(parent) = cli.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create db directory {}", parent.display()))?;
    }
    let db = db::init_db(&cli.db_path).await?;
    let local_zones = SqliteZoneRecordStore::new(db.clone());
    let zones: Arc<dyn ZoneRecordStore> = match (&cli.pdns_url, &cli.pdns_key) {
        (Some(url), Some(key)) => {
            info!(url, "using PowerDNS API for zone records");
            Arc::new(PowerDnsClient::new(url, key, &cli.pdns_server_id))
        }
        _ => Arc::new(local_zones.clone()),
    };
    let service = TemplateService::new(config, Arc::new(SqliteTemplateStore::new(db)), zones);

    let mut grants = vec![Permission::ZoneMasterAdd];
    if cli.ueberuser {
        grants.push(Permission::Ueberuser);
    }
    let perm = PermissionContext::new(cli.user_id, grants);

    match cli.command {
        Command::List => print_json(&service.list_templates(&perm).await?),
        Command::Create {
            name,
            description,
            global,
        } => {
            let details = TemplateDetails {
                name,
                description,
                global,
            };
            let id = service.create_template(&perm, &details).await?;
            print_json(&serde_json::json!({ "id": id }))
        }
        Command::SaveAs {
            zone,
            name,
            description,
            global,
        } => {
            let zone = normalize_zone(&zone)?;
            let details = TemplateDetails {
                name,
                description,
                global,
            };
            let id = service.save_as(&perm, &zone, &details, None).await?;
            print_json(&serde_json::json!({ "id": id }))
        }
        Command::Show { template, zone } => match zone {
            Some(zone) => {
                let zone = normalize_zone(&zone)?;
                print_json(&service.instantiate(&perm, template, &zone).await?)
            }
            None => print_json(&service.template_records(&perm, template).await?),
        },
        Command::Apply { template, zone } => {
            let zone = normalize_zone(&zone)?;
            print_json(&service.apply_to_zone(&perm, template, &zone).await?)
        }
        Command::CreateZone { zone, template } => {
            if cli.pdns_url.is_some() {
                bail!("create-zone only works on the local database");
            }
            let zone = normalize_zone(&zone)?;
            kata::validation::validate_zone_name(&zone)?;
            local_zones.create_zone(&zone, perm.user_id).await?;
            match template {
                Some(id) => print_json(&service.apply_to_zone(&perm, id, &zone).await?),
                None => print_json(&serde_json::json!({ "zone": zone })),
            }
        }
        Command::Delete { template } => {
            service.delete_template(&perm, template).await?;
            Ok(())
        }
        Command::AddRecord {
            template,
            name,
            rtype,
            content,
            ttl,
            prio,
        } => {
            let record = NewTemplateRecord {
                name,
                rtype: rtype.trim().to_ascii_uppercase(),
                content,
                ttl,
                prio,
            };
            let id = service.add_record(&perm, template, &record).await?;
            print_json(&serde_json::json!({ "id": id }))
        }
        Command::DeleteRecord { record } => {
            service.delete_record(&perm, record).await?;
            Ok(())
        }
    }
}

fn build_dns_config(cli: &Cli) -> Result<DnsConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<DnsConfig>(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => DnsConfig::default(),
    };

    if cli.nameservers.len() > 4 {
        bail!("at most four --ns values are supported");
    }
    let slots = [
        &mut config.ns1,
        &mut config.ns2,
        &mut config.ns3,
        &mut config.ns4,
    ];
    for (slot, ns) in slots.into_iter().zip(&cli.nameservers) {
        *slot = normalize_host(ns).with_context(|| format!("invalid ns value '{ns}'"))?;
    }

    if let Some(hostmaster) = &cli.hostmaster {
        // SOA rname form: the first '@' becomes a label separator.
        let rname = hostmaster.trim().replacen('@', ".", 1);
        config.hostmaster = normalize_host(&rname)
            .with_context(|| format!("invalid hostmaster '{hostmaster}'"))?;
    }
    if let Some(ttl) = cli.ttl {
        config.default_ttl = ttl;
    }
    if cli.local_serial {
        config.serial_clock = SerialClock::Local;
    }
    config.txt_auto_quote |= cli.txt_auto_quote;

    Ok(config)
}

/// Host names are kept relative (no trailing dot), as records store them.
fn normalize_host(input: &str) -> Result<String> {
    let trimmed = input.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        bail!("host name cannot be empty");
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn normalize_zone(input: &str) -> Result<String> {
    normalize_host(input).context("zone name cannot be empty")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
