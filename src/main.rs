use std::future::Future;

use colored::*;
use docopt::Docopt;
use serde::Deserialize;
use tokio::runtime::Runtime;

use ipswfinder::*;

const VERSION: &'static str = "v0.1";
const USAGE: &'static str = "
Usage:
    ipswfinder latest-versions [options]
    ipswfinder search <device-type> [<version>] [options]
    ipswfinder device <identifier> [options]
    ipswfinder devices [<keyword>] [options]
    ipswfinder (-h | --help)
    ipswfinder --version

Commands:
    latest-versions     Show the newest iOS, iPadOS and macOS versions, taken
                        from the newest iPhone, iPad and Mac in the catalog.
    search              List IPSW download links of a version for a device
                        type (iPhone, iPad or Mac). If no version is given,
                        the latest version for that device type is used.
    device              List all firmwares of a device, e.g. iPhone16,1.
    devices             List the device catalog, optionally only devices whose
                        name contains <keyword>.

Options:
    -h --help           Show usage information.
    --version           Show version.
    --api=<url>         Base URL of the firmware API.
    --timeout=<secs>    Request timeout in seconds.
    -v --verbose        Log requests to stderr.

Environment:
    IPSWFINDER_API_URL  Same as --api.
    IPSWFINDER_TIMEOUT  Same as --timeout.
";

#[derive(Debug, Deserialize)]
struct Args {
    cmd_latest_versions: bool,
    cmd_search: bool,
    cmd_device: bool,
    cmd_devices: bool,
    arg_device_type: Option<String>,
    arg_version: Option<String>,
    arg_identifier: Option<String>,
    arg_keyword: Option<String>,
    flag_api: Option<String>,
    flag_timeout: Option<u64>,
    flag_verbose: bool,
}

#[derive(Debug, Default)]
pub struct CliError {
    msg: String
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for CliError {}

impl From<String> for CliError {
    fn from(msg: String) -> Self {
        CliError { msg }
    }
}

macro_rules! error_from {
    ( $t:ty ) => {
        impl From<$t> for CliError {
            fn from(error: $t) -> Self {
                CliError { msg: format!("{}", error) }
            }
        }
    }
}

error_from!(ipswfinder::Error);
error_from!(std::io::Error);

/// Run a future to completion while showing a spinner with the given message.
fn block_on_spinner<F: Future>(rt: &Runtime, msg: &str, future: F) -> F::Output {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(indicatif::ProgressStyle::default_spinner()
        .template("{spinner:.bold.green} {msg}"));
    pb.set_message(msg);
    pb.enable_steady_tick(100);

    let output = rt.block_on(future);
    pb.finish_and_clear();

    output
}

/// Config file and environment first, command line flags last.
fn load_config(args: &Args) -> Result<Config, CliError> {
    let mut config = Config::load()?;

    if let Some(api) = &args.flag_api {
        config.base_url = api.clone();
    }
    if let Some(timeout) = args.flag_timeout {
        config.timeout_secs = timeout;
    }

    Ok(config.validate()?)
}

fn setup(args: &Args) -> Result<(Runtime, Client), CliError> {
    let config = load_config(args)?;
    let rt = Runtime::new()?;
    let client = Client::new(&config)?;
    Ok((rt, client))
}

fn print_latest(latest: &LatestVersions) {
    for (platform, version) in latest {
        let value = match version {
            LatestVersion::Version(v) => v.normal(),
            other => other.to_string().yellow(),
        };
        println!("{:<10}{}", format!("{}:", platform).bold().green(), value);
    }
}

/// latest-versions command
fn cmd_latest_versions(args: Args) -> Result<(),CliError> {
    let (rt, client) = setup(&args)?;

    let mut session = Session::new();
    block_on_spinner(&rt, "Querying latest versions...", session.refresh(&client));

    if let Some(error) = session.error {
        return Err(error.into());
    }

    print_latest(&session.latest);
    Ok(())
}

/// search command
fn cmd_search(args: Args) -> Result<(),CliError> {
    let device_type: DeviceType = args.arg_device_type.as_deref().unwrap_or_default().parse()?;
    let (rt, client) = setup(&args)?;

    let version = match &args.arg_version {
        Some(version) => version.trim().to_string(),
        None => {
            let platform = device_type.platform();
            let devices = block_on_spinner(&rt, "Fetching device catalog...", client.devices())?;
            let latest = block_on_spinner(&rt, &format!("Querying latest {} version...", platform),
                resolve_platform(&client, &devices, platform));

            match latest.version() {
                Some(version) => {
                    eprintln!("{} {} {}", "Using latest".bold().green(), platform, version);
                    version.to_string()
                }
                None => return Err(format!("could not determine latest {} version ({})", platform, latest).into()),
            }
        }
    };

    if version.is_empty() {
        return Err("version must not be empty".to_string().into());
    }

    let outcome = block_on_spinner(&rt, &format!("Searching {} {}...", device_type, version),
        search(&client, device_type, &version))?;

    match outcome {
        SearchOutcome::Links(links) => {
            for link in links {
                println!("{}", link);
            }
        }
        other => println!("{}", other.to_string().yellow()),
    }

    Ok(())
}

/// device command
fn cmd_device(args: Args) -> Result<(),CliError> {
    let identifier = args.arg_identifier.clone().unwrap_or_default();
    let (rt, client) = setup(&args)?;

    let mut detail = block_on_spinner(&rt, &format!("Fetching {}...", identifier), client.device(&identifier))?;
    detail.firmwares.sort_by(|a, b| compare_versions(&b.version, &a.version));

    println!("{} ({})\n", detail.name.bold(), detail.identifier);

    if detail.firmwares.is_empty() {
        println!("No firmwares listed.");
        return Ok(());
    }

    println!("{}", format!("{:10} {:10} {:10} {:>9} {:6}",
        "Version", "Build", "Released", "Size (MB)", "Signed").bold().green());
    println!("{}", "=".repeat(49).truecolor(0x7f,0x7f,0x7f));

    for fw in &detail.firmwares {
        println!("{:10} {:10} {:10} {:>9} {}",
            fw.version,
            fw.buildid.as_deref().unwrap_or_default(),
            fw.released().map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            fw.size_mb().map(|s| format!("{:.0}", s)).unwrap_or_default(),
            if fw.signed { "yes".green() } else { "no".red() },
        );
    }

    Ok(())
}

/// devices command
fn cmd_devices(args: Args) -> Result<(),CliError> {
    let (rt, client) = setup(&args)?;

    let devices = block_on_spinner(&rt, "Fetching device catalog...", client.devices())?;
    let keyword = args.arg_keyword.unwrap_or_default();

    println!("{}", format!("{:16} {:>3} {}", "Identifier", "Gen", "Name").bold().green());
    println!("{}", "=".repeat(60).truecolor(0x7f,0x7f,0x7f));

    for device in devices.iter().filter(|d| d.name.contains(keyword.as_str())) {
        println!("{:16} {:>3} {}", device.identifier, generation(&device.identifier), device.name);
    }

    Ok(())
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .map(|d| d.version(Some(VERSION.into())))
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let level = if args.flag_verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = if args.cmd_latest_versions {
        cmd_latest_versions(args)
    } else if args.cmd_search {
        cmd_search(args)
    } else if args.cmd_device {
        cmd_device(args)
    } else if args.cmd_devices {
        cmd_devices(args)
    } else {
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".bold().red(), e.msg);
        std::process::exit(1);
    }
}
