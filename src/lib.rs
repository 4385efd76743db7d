//! dbx-sync performs one-way synchronization of a local directory tree to a
//! Dropbox prefix, uploading files that are missing remotely or older
//! remotely than locally
//!
//! ```ignore
//! USAGE:
//!    dbx-sync [FLAGS] [OPTIONS] <SOURCE> <DEST_PREFIX>
//!
//! FLAGS:
//!        --force-overwrite    Upload files even when they exist on target
//!    -h, --help               Prints help information
//!    -v, --verbose            Enable verbose logging
//!    -V, --version            Prints version information
//!
//! OPTIONS:
//!        --dropbox-token <TOKEN>    Dropbox token to use to access the API
//!                                   (falls back to DROPBOX_TOKEN)
//!
//! ARGS:
//!    <SOURCE>         Source directory to upload
//!    <DEST_PREFIX>    Destination prefix on Dropbox, must start with '/'
//! ```

mod dbxsync;
pub use dbxsync::*;
