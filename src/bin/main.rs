use std::process;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use env_logger::Env;
use log::{error, info};

use arch_sync::{Clean, Config, Error, Profile, Stats, Storage, Summary, Upload};

const AIP_COMMAND: &str = "aip";
const WARC_COMMAND: &str = "warc";
const CLEAN_COMMAND: &str = "clean";
const CONFIG_ARG: &str = "config";
const PROFILE_ARG: &str = "profile";
const VERBOSE: &str = "verbose";

// 1 - some objects failed, 2 - the run never got that far
const EXIT_PARTIAL: i32 = 1;
const EXIT_FATAL: i32 = 2;

fn new_config(args: &ArgMatches<'_>) -> Result<Config, Error> {
    args.value_of(CONFIG_ARG)
        .map(Config::load)
        .unwrap_or_else(Config::from_env)
}

fn upload(cfg: &Config, profile: &Profile) -> Result<Summary, Error> {
    let storage = Storage::new(cfg, profile)?;
    let upload = Upload::new(profile, &storage);

    upload.run()
}

fn run(args: &ArgMatches<'_>) -> Result<Summary, Error> {
    let cfg = new_config(args)?;

    if args.subcommand_matches(AIP_COMMAND).is_some() {
        return upload(&cfg, &cfg.aip);
    }

    if args.subcommand_matches(WARC_COMMAND).is_some() {
        return upload(&cfg, &cfg.warc);
    }

    if let Some(clean) = args.subcommand_matches(CLEAN_COMMAND) {
        let name = clean.value_of(PROFILE_ARG).unwrap();
        let profile = cfg
            .profile(name)
            .ok_or_else(|| Error::config(format!("Unknown profile '{}'", name)))?;

        let storage = Storage::new(&cfg, profile)?;
        let clean = Clean::new(profile, &storage);

        return clean.run();
    }

    Ok(Summary::default())
}

fn main() {
    let aip = SubCommand::with_name(AIP_COMMAND)
        .about("Upload staged AIP packages into the configured container");

    let warc = SubCommand::with_name(WARC_COMMAND)
        .about("Upload exported WARC files into the configured container");

    let clean = SubCommand::with_name(CLEAN_COMMAND)
        .about("Remove staged files whose objects the container already holds")
        .arg(
            Arg::with_name(PROFILE_ARG)
                .long("profile")
                .short("p")
                .value_name("name")
                .possible_values(&["aip", "warc"])
                .required(true)
                .help("Which staging profile to clean up after"),
        );

    let app = App::new("Archival storage upload CLI")
        .bin_name("arch-sync")
        .version("0.1")
        .setting(AppSettings::ColorAuto)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::StrictUtf8)
        .arg(
            Arg::with_name(CONFIG_ARG)
                .long("config")
                .short("c")
                .value_name("file")
                .env("ARCH_SYNC_CONFIG")
                .help("Set configuration file (default '~/.arch-sync/config.json')")
                .global(true),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long("verbose")
                .short("v")
                .help("Enable debug output")
                .global(true),
        )
        .subcommand(aip)
        .subcommand(warc)
        .subcommand(clean)
        .get_matches();

    let default = if app.is_present(VERBOSE) { "debug" } else { "info" };
    env_logger::from_env(Env::default().default_filter_or(default)).init();

    match run(&app) {
        Err(err) => {
            error!("{}", err);
            process::exit(EXIT_FATAL);
        }
        Ok(summary) => {
            info!("{}", Stats::current());

            if !summary.is_clean() {
                process::exit(EXIT_PARTIAL);
            }
        }
    }
}
