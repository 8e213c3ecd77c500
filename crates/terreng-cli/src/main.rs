//! `terrenghenter`: fetch Norwegian terrain data from høydedata.no.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use terreng_dem::config::DEFAULT_MAX_IMAGE_SIZE;
use terreng_dem::{
    BoundingBox, FetchRequest, GeoPoint, HoydedataClient, RasterInfo, Result, ServiceConfig,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Fetch Norwegian terrain data from høydedata.no.
#[derive(Parser, Debug)]
#[command(name = "terrenghenter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// ImageServer exportImage URL
    #[arg(long, global = true, default_value = terreng_dem::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value_t = 60)]
    timeout: u64,

    /// Maximum image width or height in pixels
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    max_size: u32,
}

impl ServiceArgs {
    fn to_config(&self) -> Result<ServiceConfig> {
        Ok(ServiceConfig::default()
            .with_endpoint(&self.endpoint)?
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_image_size(self.max_size))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch terrain data centered on a point
    ///
    /// Example: terrenghenter fetch --lat 59.9639 --lon 10.6683 --width 1000 --height 1000 -o terrain.tif
    Fetch {
        /// Center latitude (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Center longitude (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Width in meters
        #[arg(long, default_value_t = 1000.0)]
        width: f64,

        /// Height in meters
        #[arg(long, default_value_t = 1000.0)]
        height: f64,

        /// Resolution in meters/pixel
        #[arg(long, default_value_t = 1.0)]
        resolution: f64,

        /// Output file path
        #[arg(short, long, default_value = "terrain.tif")]
        output: PathBuf,
    },

    /// Fetch terrain data for a bounding box
    ///
    /// Example: terrenghenter fetch-bbox --min-lat 59.9 --min-lon 10.6 --max-lat 60.0 --max-lon 10.8 -o area.tif
    FetchBbox {
        /// Min latitude (SW corner)
        #[arg(long, allow_hyphen_values = true)]
        min_lat: f64,

        /// Min longitude (SW corner)
        #[arg(long, allow_hyphen_values = true)]
        min_lon: f64,

        /// Max latitude (NE corner)
        #[arg(long, allow_hyphen_values = true)]
        max_lat: f64,

        /// Max longitude (NE corner)
        #[arg(long, allow_hyphen_values = true)]
        max_lon: f64,

        /// Resolution in meters/pixel
        #[arg(long, default_value_t = 1.0)]
        resolution: f64,

        /// Output file path
        #[arg(short, long, default_value = "area.tif")]
        output: PathBuf,
    },

    /// Show information about a terrain GeoTIFF file
    Info {
        /// GeoTIFF file to inspect
        tiff_file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Progress messages on stdout, silenced by `--quiet`.
struct Console {
    quiet: bool,
}

impl Console {
    fn say(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", msg.as_ref());
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fetch(client: &HoydedataClient, request: &FetchRequest, console: &Console) -> Result<()> {
    let extent = &request.extent;
    console.say(format!("Resolution: {}m/pixel", request.resolution));
    console.say(format!(
        "Service bbox ({}): {}",
        extent.spatial_ref,
        extent.to_bbox_string()
    ));
    console.say(format!(
        "Image size: {}x{} pixels",
        request.pixels.width, request.pixels.height
    ));

    let outcome = client.fetch(request)?;
    console.say(format!("Saved to: {}", outcome.path.display()));
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let console = Console { quiet: cli.quiet };

    match cli.command {
        Commands::Fetch {
            lat,
            lon,
            width,
            height,
            resolution,
            output,
        } => {
            let config = cli.service.to_config()?;
            let center = GeoPoint::new(lat, lon)?;
            let request = FetchRequest::centered(&config, center, width, height, resolution, output)?;
            debug!("fetch request: {:?}", request);

            console.say(format!(
                "Fetching {width}x{height}m area centered at ({lat}, {lon})"
            ));
            let client = HoydedataClient::new(config)?;
            fetch(&client, &request, &console)
        }
        Commands::FetchBbox {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
            resolution,
            output,
        } => {
            let config = cli.service.to_config()?;
            let bbox = BoundingBox::new(min_lat, min_lon, max_lat, max_lon)?;
            let request = FetchRequest::bounded(&config, bbox, resolution, output)?;
            debug!("fetch request: {:?}", request);

            console.say(format!(
                "Fetching area from ({min_lat}, {min_lon}) to ({max_lat}, {max_lon})"
            ));
            console.say(format!(
                "Area: {:.0}x{:.0}m",
                request.extent.width(),
                request.extent.height()
            ));
            let client = HoydedataClient::new(config)?;
            fetch(&client, &request, &console)
        }
        Commands::Info { tiff_file, json } => {
            let info = RasterInfo::from_file(&tiff_file)?;
            if json {
                println!("{}", info.to_json()?);
            } else {
                println!("{info}");
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
