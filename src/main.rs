use std::process;

use clap::{crate_version, load_yaml, App};
use log::error;

use dbx_sync::{core, parse};

fn main() {
    let yaml = load_yaml!("cli.yml");
    let args = App::from_yaml(yaml).version(crate_version!()).get_matches();

    let default_level = if args.is_present("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = parse::parse_args(&args).and_then(|config| core::synchronize(&config));

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
