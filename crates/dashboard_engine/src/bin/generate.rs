use anyhow::{Context, Result};
use clap::Parser;
use dashboard_engine::{refresh, render_report, write_dashboard_json, LiveInputs, PipelineOptions};
use live_balance::{LiveAccount, UpbitAccount, UpbitQuotation};
use models::Settings;
use settings_loader::{exchange_credentials_from_env, load_dotenv, load_settings_or_default, SheetLocator};
use sheet_source::{CachedLedgerSource, CsvFileSource, GoogleSheetSource, LedgerSource};
use std::{path::PathBuf, thread, time::Duration};

#[derive(Parser, Debug)]
#[command(
    name = "generate-dashboard",
    about = "Build the family net-worth dashboard from the ledger sheet."
)]
struct Args {
    /// Path to settings.json (optional; defaults are used when absent)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Read the ledger from a local CSV file instead of the spreadsheet export
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Where to write the dashboard JSON
    #[arg(short, long, default_value = "dashboard/dashboard.json")]
    out: PathBuf,

    /// Target net worth in won (overrides settings)
    #[arg(long)]
    target: Option<i64>,

    #[arg(long)]
    no_live_balance: bool,

    #[arg(long)]
    no_commentary: bool,

    #[arg(long)]
    no_goal: bool,

    /// Keep running and rebuild the dashboard every N seconds
    #[arg(long)]
    refresh_every: Option<u64>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dashboard_engine=info,generate_dashboard=info,sheet_source=info,live_balance=info,ai_client=info,settings_loader=info"
                    .into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn ledger_source(args: &Args, settings: &Settings) -> Result<Box<dyn LedgerSource>> {
    let inner: Box<dyn LedgerSource> = match &args.csv {
        Some(path) => Box::new(CsvFileSource::new(path, settings.columns.clone())),
        None => {
            let locator = SheetLocator::from_env()
                .context("SHEET_ID and SHEET_GID must be set (or pass --csv)")?;
            Box::new(
                GoogleSheetSource::new(&locator.sheet_id, &locator.gid, settings.columns.clone())
                    .context("build sheet client")?,
            )
        }
    };
    Ok(Box::new(CachedLedgerSource::new(
        inner,
        Duration::from_secs(settings.cache_ttl_secs),
    )))
}

fn live_accounts(settings: &Settings) -> Result<Vec<LiveAccount>> {
    let mut accounts = Vec::new();
    for identity in &settings.crypto_identities {
        let Some(creds) = exchange_credentials_from_env(identity) else {
            continue;
        };
        accounts.push(LiveAccount {
            member: identity.member.clone(),
            subcategory: identity.subcategory.clone(),
            account: Box::new(UpbitAccount::new(creds).context("build exchange client")?),
        });
    }
    Ok(accounts)
}

fn main() -> Result<()> {
    load_dotenv();
    init_tracing();
    let args = Args::parse();

    let mut settings = load_settings_or_default(args.settings.as_ref())?;
    if let Some(target) = args.target {
        settings.target_net_worth = Some(target);
    }
    if args.no_goal {
        settings.features.goal_tracking = false;
    }
    let options = PipelineOptions::from_settings(&settings);

    let source = ledger_source(&args, &settings)?;

    let accounts = if settings.features.live_balance && !args.no_live_balance {
        live_accounts(&settings)?
    } else {
        Vec::new()
    };
    let quotation = if accounts.is_empty() {
        None
    } else {
        Some(UpbitQuotation::new().context("build quotation client")?)
    };

    let commentary = if settings.features.commentary && !args.no_commentary {
        ai_client::client_from_env()
    } else {
        None
    };

    tracing::info!(
        source = source.name(),
        live_accounts = accounts.len(),
        commentary = commentary.as_ref().map(|c| c.name()).unwrap_or("off"),
        goal = ?options.target_net_worth,
        "generating dashboard"
    );

    loop {
        let live = quotation.as_ref().map(|prices| LiveInputs {
            accounts: &accounts,
            prices,
        });
        let dashboard = refresh(source.as_ref(), live, commentary.as_deref(), &options);
        write_dashboard_json(&dashboard, &args.out)
            .with_context(|| format!("write {}", args.out.display()))?;

        println!("{}", render_report(&dashboard));
        println!("Done. Generated at {} -> {}", dashboard.generated_at, args.out.display());

        match args.refresh_every {
            Some(secs) => thread::sleep(Duration::from_secs(secs.max(1))),
            None => break,
        }
    }
    Ok(())
}
