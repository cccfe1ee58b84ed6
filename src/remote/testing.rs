//! Test doubles for the remote side
//!
//! [`MemoryDrive`] is an in-memory drive. Node ids are the node's path below
//! the root (`sub/b.pdf`), which keeps assertions readable. Listing pages,
//! metadata lookups and downloads can be made to fail individually.
//!
//! [`serve_once`] answers a single HTTP request with canned bytes, for
//! exercising the real Graph and token clients.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use super::{Node, NodePage, RemoteStorage, ROOT_FOLDER};
use crate::error::{LoaderError, Result};

const LOCATOR_SCHEME: &str = "mem://";

pub struct MemoryDrive {
    /// (parent id, node) in listing order
    entries: Vec<(String, Node)>,
    contents: HashMap<String, Vec<u8>>,
    page_size: usize,
    failing_pages: HashSet<(String, usize)>,
    failing_downloads: HashSet<String>,
    failing_metadata: HashSet<String>,
    list_calls: Cell<usize>,
    metadata_calls: Cell<usize>,
    downloads: RefCell<Vec<String>>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            contents: HashMap::new(),
            page_size: usize::MAX,
            failing_pages: HashSet::new(),
            failing_downloads: HashSet::new(),
            failing_metadata: HashSet::new(),
            list_calls: Cell::new(0),
            metadata_calls: Cell::new(0),
            downloads: RefCell::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn folder(mut self, parent: &str, name: &str) -> Self {
        let node = Node::folder(child_id(parent, name), name).with_parent_path(parent_path(parent));
        self.entries.push((parent.to_string(), node));
        self
    }

    pub fn file(self, parent: &str, name: &str, bytes: &[u8]) -> Self {
        let mime = mime_guess::from_path(name)
            .first_raw()
            .unwrap_or("application/octet-stream");
        self.typed_file(parent, name, mime, bytes)
    }

    pub fn typed_file(mut self, parent: &str, name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        let id = child_id(parent, name);
        let node = Node::file(&id, name, mime_type, locator(&id, 0))
            .with_parent_path(parent_path(parent));
        self.contents.insert(id, bytes.to_vec());
        self.entries.push((parent.to_string(), node));
        self
    }

    /// List an already added node a second time, under another folder
    pub fn link(mut self, parent: &str, id: &str) -> Self {
        if let Some((_, node)) = self.entries.iter().find(|(_, n)| n.id == id) {
            let node = node.clone().with_parent_path(parent_path(parent));
            self.entries.push((parent.to_string(), node));
        }
        self
    }

    pub fn fail_page(mut self, folder_id: &str, page: usize) -> Self {
        self.failing_pages.insert((folder_id.to_string(), page));
        self
    }

    pub fn fail_download(mut self, file_id: &str) -> Self {
        self.failing_downloads.insert(file_id.to_string());
        self
    }

    pub fn fail_metadata(mut self, file_id: &str) -> Self {
        self.failing_metadata.insert(file_id.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.get()
    }

    /// Ids whose bytes were fetched, in fetch order
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }

    fn children_of(&self, folder_id: &str) -> Vec<&Node> {
        self.entries
            .iter()
            .filter(|(parent, _)| parent == folder_id)
            .map(|(_, node)| node)
            .collect()
    }

    fn exists(&self, id: &str) -> bool {
        id == ROOT_FOLDER || self.entries.iter().any(|(_, n)| n.id == id)
    }
}

impl RemoteStorage for MemoryDrive {
    fn list_children(&self, folder_id: &str, continuation: Option<&str>) -> Result<NodePage> {
        self.list_calls.set(self.list_calls.get() + 1);

        if !self.exists(folder_id) {
            return Err(LoaderError::remote(Some(404), format!("no folder {}", folder_id)));
        }

        let page: usize = match continuation {
            Some(token) => token
                .parse()
                .map_err(|_| LoaderError::remote(Some(400), "bad continuation token"))?,
            None => 0,
        };
        if self.failing_pages.contains(&(folder_id.to_string(), page)) {
            return Err(LoaderError::remote(
                Some(503),
                format!("page {} of {} unavailable", page, folder_id),
            ));
        }

        let children = self.children_of(folder_id);
        let start = page.saturating_mul(self.page_size).min(children.len());
        let end = start.saturating_add(self.page_size).min(children.len());
        let next = (end < children.len()).then(|| (page + 1).to_string());

        Ok(NodePage {
            nodes: children[start..end].iter().map(|n| (*n).clone()).collect(),
            next,
        })
    }

    fn file_metadata(&self, file_id: &str) -> Result<Node> {
        let calls = self.metadata_calls.get() + 1;
        self.metadata_calls.set(calls);

        if self.failing_metadata.contains(file_id) {
            return Err(LoaderError::remote(Some(500), "metadata unavailable"));
        }
        let (_, node) = self
            .entries
            .iter()
            .find(|(_, n)| n.id == file_id)
            .ok_or_else(|| LoaderError::remote(Some(404), format!("no item {}", file_id)))?;

        let mut node = node.clone();
        if let super::NodeKind::File(facet) = &mut node.kind {
            facet.download_locator = locator(file_id, calls);
        }
        Ok(node)
    }

    fn fetch_bytes(&self, download_locator: &str) -> Result<Vec<u8>> {
        let id = download_locator
            .strip_prefix(LOCATOR_SCHEME)
            .and_then(|rest| rest.split('?').next())
            .ok_or_else(|| LoaderError::remote(Some(400), "foreign locator"))?;

        if self.failing_downloads.contains(id) {
            return Err(LoaderError::remote(Some(404), format!("{} not found", id)));
        }
        let bytes = self
            .contents
            .get(id)
            .cloned()
            .ok_or_else(|| LoaderError::remote(Some(404), format!("{} not found", id)))?;
        self.downloads.borrow_mut().push(id.to_string());
        Ok(bytes)
    }
}

fn child_id(parent: &str, name: &str) -> String {
    if parent == ROOT_FOLDER {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn parent_path(parent: &str) -> String {
    if parent == ROOT_FOLDER {
        "/drives/mem/root:".to_string()
    } else {
        format!("/drives/mem/root:/{}", parent)
    }
}

fn locator(id: &str, version: usize) -> String {
    format!("{}{}?v={}", LOCATOR_SCHEME, id, version)
}

/// Raw HTTP/1.1 response with a `Content-Length` matching `body`
pub fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Accept one connection on a local port and reply with `response` verbatim.
/// Returns the base URL and a handle yielding the raw request that was received.
pub fn serve_once(response: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        stream.write_all(&response).unwrap();
        stream.flush().unwrap();
        request
    });
    (url, handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    let mut expected: Option<usize> = None;

    loop {
        if let Some(total) = expected {
            if received.len() >= total {
                break;
            }
        }
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);

        if expected.is_none() {
            if let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&received[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|len| len.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                expected = Some(end + 4 + body_len);
            }
        }
    }

    String::from_utf8_lossy(&received).into_owned()
}
