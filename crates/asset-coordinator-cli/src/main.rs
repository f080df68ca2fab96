use std::{
    error::Error,
    fs::{self, File},
    io::BufReader,
    path::PathBuf,
    process::ExitCode,
};

use asset_coordinator::{
    archive::tar::TarBundle, source::ArchiveFetcher, AssetCoordinator, AssetRequest,
    CoordinatorConfig, DefaultFetcher, Fetch,
};
use clap::Parser;
use log::{error, info};
use serde_json::json;
use zip::ZipArchive;

#[derive(Parser, Debug)]
#[command(
    name = "asset-coordinator",
    version,
    about = "Load a manifest of assets and report what loaded"
)]
struct Args {
    /// JSON array of asset requests
    manifest: PathBuf,
    /// Directory relative sources are resolved against
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Serve relative sources from a .zip or .tar bundle
    #[arg(long)]
    archive: Option<PathBuf>,
    /// Coordinator configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

async fn run_with<F: Fetch>(
    fetcher: F,
    config: CoordinatorConfig,
    requests: &[AssetRequest],
    as_json: bool,
) -> bool {
    let coordinator = AssetCoordinator::with_fetcher(fetcher, config);
    let report = coordinator.load(requests).await;

    let records: Vec<_> = coordinator
        .names()
        .into_iter()
        .filter_map(|name| {
            let record = coordinator.get(&name)?;
            let kinds: Vec<&str> = record.kinds().into_iter().map(|kind| kind.result_tag()).collect();
            Some((name, kinds))
        })
        .collect();

    if as_json {
        let output = json!({
            "records": records
                .iter()
                .map(|(name, kinds)| json!({ "name": name, "loaded": kinds }))
                .collect::<Vec<_>>(),
            "failures": report
                .failures()
                .iter()
                .map(|failure| json!({
                    "name": failure.name,
                    "kind": failure.kind.result_tag(),
                    "source": failure.source,
                    "error": failure.error.kind().to_string(),
                    "message": failure.error.to_string(),
                }))
                .collect::<Vec<_>>(),
        });
        println!("{:#}", output);
    } else {
        for (name, kinds) in &records {
            println!("{}: {}", name, kinds.join(", "));
        }
        for failure in report.failures() {
            println!("failed [{}] {}", failure.error.kind(), failure);
        }
        println!(
            "{} loaded, {} failed",
            report.loaded().len(),
            report.failures().len()
        );
    }
    report.is_complete()
}

async fn run(args: Args) -> Result<bool, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => CoordinatorConfig::from_json_file(path)?,
        None => CoordinatorConfig::default(),
    };
    if let Some(base_dir) = args.base_dir {
        config.base_dir = base_dir;
    }

    let manifest = fs::read_to_string(&args.manifest)?;
    let requests = AssetRequest::parse_manifest(&manifest)?;
    info!(
        "Read {} requests from {}",
        requests.len(),
        args.manifest.display()
    );

    let Some(path) = args.archive else {
        let fetcher = DefaultFetcher::from_config(&config);
        return Ok(run_with(fetcher, config, &requests, args.json).await);
    };
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    let reader = BufReader::new(File::open(&path)?);
    let complete = match extension.as_deref() {
        Some("zip") => {
            let fetcher = ArchiveFetcher::new(ZipArchive::new(reader)?);
            run_with(fetcher, config, &requests, args.json).await
        }
        Some("tar") => {
            let fetcher = ArchiveFetcher::new(TarBundle::new(reader));
            run_with(fetcher, config, &requests, args.json).await
        }
        _ => return Err(format!("Unknown archive type: {}", path.display()).into()),
    };
    Ok(complete)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            error!("{}", error);
            ExitCode::from(2)
        }
    }
}
