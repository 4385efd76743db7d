use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::dbxsync::error::SyncError;
use crate::dbxsync::inventory;
use crate::dbxsync::parse::{Flag, ParseResult};
use crate::dbxsync::progress::{progress_init, PROGRESS_BAR};
use crate::dbxsync::remote::DropboxClient;

/// Synchronizes all files under the source directory to the destination
/// prefix, uploading files that are missing remotely or older remotely than
/// locally
///
/// # Errors
/// This function will return an error in the following situations,
/// but is not limited to just these cases:
/// * The local file inventory could not be built
/// * The remote file listing failed (other than "not found")
/// * Any single upload failed
pub fn synchronize(config: &ParseResult) -> Result<(), SyncError> {
    let client = DropboxClient::new(&config.token);
    synchronize_with_client(config, &client)
}

pub fn synchronize_with_client(
    config: &ParseResult,
    client: &DropboxClient,
) -> Result<(), SyncError> {
    // Retrieve data about local files and remote files under the prefix
    let local_files = inventory::local_inventory(&config.source)?;
    let remote_files = client.list_folder(&config.dest_prefix)?;

    let force_overwrite = config.flags.contains(&Flag::ForceOverwrite);

    progress_init(local_files.len() as u64);

    for (path, modified) in &local_files {
        let dest = inventory::dest_path(&config.dest_prefix, &config.source, path)?;
        let local_modified = DateTime::<Utc>::from(*modified);

        if !upload_due(remote_files.get(dest.as_str()), local_modified, force_overwrite) {
            debug!("Remote {:?} already there, not uploading", dest);
            PROGRESS_BAR.inc(1);
            continue;
        }

        info!("Uploading {:?} to {:?}", path, dest);
        client.upload(path, &dest)?;
        PROGRESS_BAR.inc(1);
    }

    PROGRESS_BAR.finish_and_clear();

    Ok(())
}

/// Decides whether a local file must be uploaded, given the remote
/// client-modified time for its destination path, if any
///
/// Equal timestamps count as remote-up-to-date, so clock-precision ties skip
/// rather than re-upload
pub fn upload_due(
    remote_modified: Option<&DateTime<Utc>>,
    local_modified: DateTime<Utc>,
    force_overwrite: bool,
) -> bool {
    match remote_modified {
        None => true,
        Some(_) if force_overwrite => true,
        Some(remote_modified) => *remote_modified < local_modified,
    }
}
