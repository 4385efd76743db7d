//! Thin client for the Dropbox HTTP API: recursive folder listing with
//! cursor-based pagination, and full-overwrite content upload.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dbxsync::error::SyncError;

const API_BASE: &str = "https://api.dropboxapi.com";
const CONTENT_BASE: &str = "https://content.dropboxapi.com";

/// Mapping from remote display path to client-modified time, built fresh on
/// every run
pub type RemoteInventory = HashMap<String, DateTime<Utc>>;

pub struct DropboxClient {
    http: Client,
    token: String,
    api_base: String,
    content_base: String,
}

#[derive(Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct ListFolderContinueArg<'a> {
    cursor: &'a str,
}

#[derive(Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'a str,
    client_modified: String,
}

#[derive(Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

// Listing entries are a tagged union; only file entries carry a
// client-modified time, everything else is skipped
#[derive(Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
enum Metadata {
    File(FileMetadata),
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct FileMetadata {
    path_display: String,
    client_modified: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ApiError {
    error_summary: String,
}

impl DropboxClient {
    pub fn new(token: &str) -> DropboxClient {
        DropboxClient::with_endpoints(token, API_BASE, CONTENT_BASE)
    }

    /// Points the client at alternative API hosts, for tests
    pub fn with_endpoints(token: &str, api_base: &str, content_base: &str) -> DropboxClient {
        DropboxClient {
            http: Client::new(),
            token: token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            content_base: content_base.trim_end_matches('/').to_string(),
        }
    }

    /// Lists every file under `prefix`, following the listing cursor until
    /// the server reports no more pages
    ///
    /// A prefix that does not exist yet yields an empty inventory (the
    /// first-sync case); every other listing failure is an error
    pub fn list_folder(&self, prefix: &str) -> Result<RemoteInventory, SyncError> {
        let mut files = RemoteInventory::new();

        let response = self.post_json(
            "/2/files/list_folder",
            &ListFolderArg {
                path: prefix,
                recursive: true,
            },
        )?;

        if response.status() == StatusCode::CONFLICT {
            let summary = error_summary(response)?;
            if summary.contains("path/not_found") {
                return Ok(files);
            }
            return Err(SyncError::Remote(format!("list_folder: {}", summary)));
        }

        let mut page: ListFolderResult = decode("list_folder", response)?;

        loop {
            for entry in page.entries {
                if let Metadata::File(file) = entry {
                    files.insert(file.path_display, file.client_modified);
                }
            }

            if !page.has_more {
                break;
            }

            let response = self.post_json(
                "/2/files/list_folder/continue",
                &ListFolderContinueArg {
                    cursor: &page.cursor,
                },
            )?;
            page = decode("list_folder/continue", response)?;
        }

        Ok(files)
    }

    /// Uploads one local file to `dest`, fully replacing any existing remote
    /// object and attaching the local modification time, truncated to whole
    /// seconds, as client-modified metadata
    pub fn upload(&self, source: &Path, dest: &str) -> Result<(), SyncError> {
        let metadata = fs::metadata(source).map_err(|e| SyncError::filesystem(source, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| SyncError::filesystem(source, e))?;
        let content = fs::File::open(source).map_err(|e| SyncError::filesystem(source, e))?;

        let arg = UploadArg {
            path: dest,
            mode: "overwrite",
            client_modified: DateTime::<Utc>::from(modified)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        };
        let arg = serde_json::to_string(&arg)
            .map_err(|e| SyncError::Remote(format!("upload: encoding commit info: {}", e)))?;

        let response = self
            .http
            .post(&format!("{}/2/files/upload", self.content_base))
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .map_err(|e| SyncError::Remote(format!("upload: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let summary = error_summary(response)?;
            return Err(SyncError::Remote(format!(
                "upload failed with {}: {}",
                status, summary
            )));
        }

        Ok(())
    }

    fn post_json<T: Serialize>(&self, endpoint: &str, arg: &T) -> Result<Response, SyncError> {
        self.http
            .post(&format!("{}{}", self.api_base, endpoint))
            .bearer_auth(&self.token)
            .json(arg)
            .send()
            .map_err(|e| SyncError::Remote(format!("{}: {}", endpoint, e)))
    }
}

fn decode<T: DeserializeOwned>(op: &str, response: Response) -> Result<T, SyncError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| SyncError::Remote(format!("{}: reading response: {}", op, e)))?;

    if !status.is_success() {
        return Err(SyncError::Remote(format!(
            "{} failed with {}: {}",
            op,
            status,
            body.trim()
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| SyncError::Remote(format!("{}: malformed response: {}", op, e)))
}

/// Pulls the human readable summary out of an API error body, falling back
/// to the raw body when it is not the documented JSON shape
fn error_summary(response: Response) -> Result<String, SyncError> {
    let body = response
        .text()
        .map_err(|e| SyncError::Remote(format!("reading error response: {}", e)))?;

    Ok(serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error_summary)
        .unwrap_or(body))
}

#[cfg(test)]
mod test {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(server: &mockito::ServerGuard) -> DropboxClient {
        DropboxClient::with_endpoints("test-token", &server.url(), &server.url())
    }

    #[test]
    fn list_folder_collects_file_entries() {
        let mut server = mockito::Server::new();
        let list = server
            .mock("POST", "/2/files/list_folder")
            .match_body(Matcher::PartialJson(json!({
                "path": "/backup",
                "recursive": true,
            })))
            .with_status(200)
            .with_body(
                r#"{
                    "entries": [
                        {".tag": "folder", "path_display": "/backup/sub"},
                        {
                            ".tag": "file",
                            "path_display": "/backup/a.txt",
                            "client_modified": "2020-01-02T03:04:05Z"
                        }
                    ],
                    "cursor": "c0",
                    "has_more": false
                }"#,
            )
            .create();

        let inventory = client(&server).list_folder("/backup").unwrap();

        list.assert();
        assert_eq!(inventory.len(), 1);
        assert_eq!(
            inventory["/backup/a.txt"],
            "2020-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn list_folder_follows_the_cursor_until_done() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/2/files/list_folder")
            .with_status(200)
            .with_body(
                r#"{
                    "entries": [
                        {
                            ".tag": "file",
                            "path_display": "/backup/a.txt",
                            "client_modified": "2020-01-01T00:00:00Z"
                        }
                    ],
                    "cursor": "c1",
                    "has_more": true
                }"#,
            )
            .create();
        let cont = server
            .mock("POST", "/2/files/list_folder/continue")
            .match_body(Matcher::PartialJson(json!({"cursor": "c1"})))
            .with_status(200)
            .with_body(
                r#"{
                    "entries": [
                        {
                            ".tag": "file",
                            "path_display": "/backup/sub/b.txt",
                            "client_modified": "2020-01-01T00:00:00Z"
                        }
                    ],
                    "cursor": "c2",
                    "has_more": false
                }"#,
            )
            .create();

        let inventory = client(&server).list_folder("/backup").unwrap();

        cont.assert();
        assert_eq!(inventory.len(), 2);
        assert!(inventory.contains_key("/backup/a.txt"));
        assert!(inventory.contains_key("/backup/sub/b.txt"));
    }

    #[test]
    fn list_folder_treats_not_found_as_empty() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/2/files/list_folder")
            .with_status(409)
            .with_body(
                r#"{"error_summary": "path/not_found/..", "error": {".tag": "path"}}"#,
            )
            .create();

        let inventory = client(&server).list_folder("/backup").unwrap();

        assert!(inventory.is_empty());
    }

    #[test]
    fn list_folder_surfaces_other_conflicts() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/2/files/list_folder")
            .with_status(409)
            .with_body(
                r#"{"error_summary": "path/malformed_path/..", "error": {".tag": "path"}}"#,
            )
            .create();

        let result = client(&server).list_folder("/backup");

        assert!(matches!(result, Err(SyncError::Remote(_))));
    }

    #[test]
    fn list_folder_surfaces_server_errors() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/2/files/list_folder")
            .with_status(500)
            .with_body("internal error")
            .create();

        let result = client(&server).list_folder("/backup");

        assert!(matches!(result, Err(SyncError::Remote(_))));
    }

    #[test]
    fn upload_sends_overwrite_commit_info_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();

        let mut server = mockito::Server::new();
        let upload = server
            .mock("POST", "/2/files/upload")
            .match_header(
                "Dropbox-API-Arg",
                Matcher::Regex(r#""path":"/backup/a\.txt""#.to_string()),
            )
            .match_header(
                "Dropbox-API-Arg",
                Matcher::Regex(r#""mode":"overwrite""#.to_string()),
            )
            .match_header("content-type", "application/octet-stream")
            .match_body("hello")
            .with_status(200)
            .with_body("{}")
            .create();

        client(&server).upload(&file, "/backup/a.txt").unwrap();

        upload.assert();
    }

    #[test]
    fn upload_fails_on_missing_local_file() {
        let server = mockito::Server::new();

        let result = client(&server).upload(Path::new("no-such-file"), "/backup/a.txt");

        assert!(matches!(result, Err(SyncError::Filesystem { .. })));
    }

    #[test]
    fn upload_surfaces_remote_failures() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();

        let mut server = mockito::Server::new();
        server
            .mock("POST", "/2/files/upload")
            .with_status(500)
            .with_body("internal error")
            .create();

        let result = client(&server).upload(&file, "/backup/a.txt");

        assert!(matches!(result, Err(SyncError::Remote(_))));
    }
}
