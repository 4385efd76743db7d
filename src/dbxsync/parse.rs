//! Some utilities for command line parsing.

use std::env;
use std::fs;
use std::path::PathBuf;

use clap::ArgMatches;
use hashbrown::HashSet;

use crate::dbxsync::error::SyncError;

/// Enum to represent command line flags
#[derive(Hash, Eq, PartialEq, Clone)]
#[repr(u8)]
pub enum Flag {
    ForceOverwrite,
    Verbose,
}

/// Struct to represent the result of parsing args
pub struct ParseResult {
    pub source: PathBuf,
    pub dest_prefix: String,
    pub token: String,
    pub flags: HashSet<Flag>,
}

/// Parses command line arguments for the source directory, destination
/// prefix, and Dropbox token
///
/// # Errors
/// This function will return an error in the following situations,
/// but is not limited to just these cases:
/// * The source path is not a valid directory
/// * The destination prefix does not start with '/'
/// * No Dropbox token was given
pub fn parse_args(args: &ArgMatches) -> Result<ParseResult, SyncError> {
    const FLAG_NAMES: [&str; 2] = ["force-overwrite", "verbose"];
    const FLAGS: [Flag; 2] = [Flag::ForceOverwrite, Flag::Verbose];

    // Parse for flags
    let mut flags = HashSet::new();
    for (i, &flag_name) in FLAG_NAMES.iter().enumerate() {
        if args.is_present(flag_name) {
            flags.insert(FLAGS[i].clone());
        }
    }

    // These values are safe to unwrap since the args are required
    let source = args.value_of("SOURCE").unwrap();
    let dest_prefix = args.value_of("DEST_PREFIX").unwrap();

    // Source must be an existing directory
    match fs::metadata(source) {
        Ok(m) => {
            if !m.is_dir() {
                return Err(SyncError::Config(format!(
                    "Source path {:?} is not a directory",
                    source
                )));
            }
        }
        Err(e) => {
            return Err(SyncError::Config(format!(
                "Source path {:?}: {}",
                source, e
            )));
        }
    }

    if !dest_prefix.starts_with('/') {
        return Err(SyncError::Config(format!(
            "Destination prefix must start with '/': {:?}",
            dest_prefix
        )));
    }

    let token = args
        .value_of("token")
        .map(str::to_string)
        .or_else(|| env::var("DROPBOX_TOKEN").ok());
    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => {
            return Err(SyncError::Config(
                "No Dropbox token given, use --dropbox-token or set DROPBOX_TOKEN".to_string(),
            ));
        }
    };

    Ok(ParseResult {
        source: PathBuf::from(source),
        dest_prefix: dest_prefix.to_string(),
        token,
        flags,
    })
}
