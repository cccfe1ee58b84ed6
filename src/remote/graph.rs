//! Microsoft Graph drive client
//!
//! [`GraphClient`] resolves sites and drives; [`GraphDrive`] is one drive and
//! implements [`RemoteStorage`]. The bearer token is fetched once, when the
//! client connects.

use reqwest::blocking::{Client, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

use super::credentials::CredentialProvider;
use super::node::Node;
use super::{NodePage, RemoteStorage};
use crate::error::{LoaderError, Result};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A document library of a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveInfo {
    pub id: String,
    pub name: String,
}

#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GraphClient {
    /// Authenticate once and keep the token for the life of the client
    pub fn connect(
        client: Client,
        base_url: impl Into<String>,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self> {
        let token = credentials.token()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("[GraphClient] Authenticated against {}", base_url);
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Resolve a site path (`host:/sites/name`) to its id
    pub fn site_id(&self, site_url: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Site {
            id: String,
        }

        let site: Site = self.get_json(&format!("{}/sites/{}", self.base_url, site_url))?;
        tracing::debug!("[GraphClient] Site {} -> {}", site_url, site.id);
        Ok(site.id)
    }

    /// Document libraries of a site, in server order
    pub fn drives(&self, site_id: &str) -> Result<Vec<DriveInfo>> {
        let mut drives = Vec::new();
        let mut url = Some(format!("{}/sites/{}/drives", self.base_url, site_id));
        while let Some(current) = url {
            let page: Collection<DriveInfo> = self.get_json(&current)?;
            drives.extend(page.value);
            url = page.next_link;
        }
        Ok(drives)
    }

    pub fn drive(&self, site_id: impl Into<String>, drive_id: impl Into<String>) -> GraphDrive {
        GraphDrive {
            graph: self.clone(),
            site_id: site_id.into(),
            drive_id: drive_id.into(),
        }
    }

    fn get(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).bearer_auth(&self.token).send()?;
        check_status(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url)?;
        let text = response.text()?;
        serde_json::from_str(&text).map_err(|e| {
            LoaderError::remote(None, format!("unexpected response from {}: {}", url, e))
        })
    }
}

/// One drive of one site
#[derive(Clone)]
pub struct GraphDrive {
    graph: GraphClient,
    site_id: String,
    drive_id: String,
}

impl GraphDrive {
    /// `downloadUrl` is pre-authenticated; only Graph's own `/content`
    /// endpoint takes the bearer token
    fn download(&self, download_locator: &str) -> Result<Response> {
        if download_locator.starts_with(&self.graph.base_url) {
            self.graph.get(download_locator)
        } else {
            check_status(self.graph.client.get(download_locator).send()?)
        }
    }

    fn item_url(&self, item_id: &str) -> String {
        format!(
            "{}/sites/{}/drives/{}/items/{}",
            self.graph.base_url, self.site_id, self.drive_id, item_id
        )
    }

    fn to_node(&self, item: DriveItemDto) -> Option<Node> {
        let name = item.name.unwrap_or_else(|| item.id.clone());
        let parent_path = item.parent_reference.and_then(|p| p.path);

        let node = if item.folder.is_some() {
            Node::folder(item.id, name)
        } else if let Some(file) = item.file {
            let locator = item
                .download_url
                .unwrap_or_else(|| format!("{}/content", self.item_url(&item.id)));
            let mime_type = file
                .mime_type
                .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
            Node::file(item.id, name, mime_type, locator)
        } else {
            tracing::debug!("[GraphClient] Skipping {} ({}): neither file nor folder", name, item.id);
            return None;
        };

        Some(match parent_path {
            Some(path) => node.with_parent_path(path),
            None => node,
        })
    }
}

impl RemoteStorage for GraphDrive {
    fn list_children(&self, folder_id: &str, continuation: Option<&str>) -> Result<NodePage> {
        let url = match continuation {
            Some(next_link) => next_link.to_string(),
            None => format!("{}/children", self.item_url(folder_id)),
        };
        let page: Collection<DriveItemDto> = self.graph.get_json(&url)?;

        tracing::debug!(
            "[GraphClient] Listed {} items of {} (more: {})",
            page.value.len(),
            folder_id,
            page.next_link.is_some()
        );

        Ok(NodePage {
            nodes: page
                .value
                .into_iter()
                .filter_map(|item| self.to_node(item))
                .collect(),
            next: page.next_link,
        })
    }

    fn file_metadata(&self, file_id: &str) -> Result<Node> {
        let item: DriveItemDto = self.graph.get_json(&self.item_url(file_id))?;
        self.to_node(item).ok_or_else(|| {
            LoaderError::remote(None, format!("item {} is neither a file nor a folder", file_id))
        })
    }

    fn fetch_bytes(&self, download_locator: &str) -> Result<Vec<u8>> {
        let bytes = self.download(download_locator)?.bytes()?;
        Ok(bytes.to_vec())
    }

    fn fetch_to_file(&self, download_locator: &str, target: &Path) -> Result<u64> {
        let mut response = self.download(download_locator)?;
        let mut file = File::create(target).map_err(|e| LoaderError::local_io(target, e))?;

        match response.copy_to(&mut file) {
            Ok(written) => Ok(written),
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(target);
                Err(e.into())
            }
        }
    }
}

/// Map non-2xx responses to `RemoteUnavailable`, keeping Graph's error message
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or("error").to_string();
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<GraphErrorBody>(&body)
        .ok()
        .map(|b| format!("{}: {}", b.error.code, b.error.message))
        .unwrap_or(reason);

    Err(LoaderError::remote(Some(status.as_u16()), message))
}

#[derive(Deserialize)]
struct Collection<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveItemDto {
    id: String,
    name: Option<String>,
    folder: Option<IgnoredAny>,
    file: Option<FileFacetDto>,
    #[serde(rename = "parentReference")]
    parent_reference: Option<ParentReferenceDto>,
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileFacetDto {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParentReferenceDto {
    path: Option<String>,
}

#[derive(Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Deserialize)]
struct GraphErrorDetail {
    code: String,
    message: String,
}
