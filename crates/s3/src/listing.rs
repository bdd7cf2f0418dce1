//! S3 XML response parsing
//!
//! Listing bodies (`ListBucketResult`) and error bodies (`Error`) are walked
//! with quick-xml and reduced to the few leaf elements the facade needs.

use quick_xml::Reader;
use quick_xml::events::{BytesRef, Event};
use s3dict_core::{Error, Result};

const LIST_ROOT: &str = "ListBucketResult";
const KEY_PATH: &str = "ListBucketResult/Contents/Key";
const TRUNCATED_PATH: &str = "ListBucketResult/IsTruncated";

/// First page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Object keys in document order
    pub keys: Vec<String>,
    /// Whether the server holds more keys than this page carries
    pub truncated: bool,
}

/// Code and message from an S3 `<Error>` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// A closed element: slash-joined path from the root and its text content
#[derive(Debug)]
struct Leaf {
    path: String,
    text: String,
}

/// Parse a `ListObjects` / `ListObjectsV2` response body
pub fn parse_list_objects(xml: &[u8]) -> Result<ListPage> {
    let leaves = read_leaves(xml)?;

    match leaves.last() {
        Some(root) if root.path == LIST_ROOT => {}
        Some(root) => {
            return Err(Error::Transport(format!(
                "unexpected listing root element '{}'",
                root.path
            )));
        }
        None => return Err(Error::Transport("empty listing response".into())),
    }

    let mut page = ListPage::default();
    for leaf in leaves {
        if leaf.path == KEY_PATH {
            page.keys.push(leaf.text);
        } else if leaf.path == TRUNCATED_PATH {
            page.truncated = leaf.text.trim() == "true";
        }
    }
    Ok(page)
}

/// Parse an S3 error body, if the payload is one
pub fn parse_error_body(xml: &[u8]) -> Option<ErrorBody> {
    let leaves = read_leaves(xml).ok()?;
    if leaves.last()?.path != "Error" {
        return None;
    }

    let find = |path: &str| {
        leaves
            .iter()
            .find(|l| l.path == path)
            .map(|l| l.text.trim().to_string())
            .unwrap_or_default()
    };

    Some(ErrorBody {
        code: find("Error/Code"),
        message: find("Error/Message"),
    })
}

/// Walk the document and emit every element as it closes
///
/// The root element is therefore always the last leaf.
fn read_leaves(xml: &[u8]) -> Result<Vec<Leaf>> {
    let mut reader = Reader::from_reader(xml);
    let mut open: Vec<(String, String)> = Vec::new();
    let mut leaves = Vec::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                open.push((name, String::new()));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                leaves.push(Leaf {
                    path: join_path(&open, &name),
                    text: String::new(),
                });
            }
            Event::Text(e) => {
                if let Some((_, text)) = open.last_mut() {
                    text.push_str(&e.decode().map_err(malformed)?);
                }
            }
            Event::CData(e) => {
                if let Some((_, text)) = open.last_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let Some((_, text)) = open.last_mut() {
                    text.push_str(&resolve_reference(&e)?);
                }
            }
            Event::End(_) => {
                if let Some((name, text)) = open.pop() {
                    leaves.push(Leaf {
                        path: join_path(&open, &name),
                        text,
                    });
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(Error::Transport(
            "malformed XML response: unexpected end of document".into(),
        ));
    }
    Ok(leaves)
}

fn join_path(open: &[(String, String)], name: &str) -> String {
    let mut path = String::new();
    for (parent, _) in open {
        path.push_str(parent);
        path.push('/');
    }
    path.push_str(name);
    path
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref().map_err(malformed)? {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(malformed)?;
    quick_xml::escape::resolve_xml_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| Error::Transport(format!("malformed XML response: unknown entity &{name};")))
}

fn malformed(e: impl std::fmt::Display) -> Error {
    Error::Transport(format!("malformed XML response: {e}"))
}
