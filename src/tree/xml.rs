// XML codec - Reads live sets (plain or gzip) into `Node` trees and writes presets back out
// Text handling only; no knowledge of either schema lives here

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use super::node::Node;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed attribute: {0}")]
    Attr(#[from] AttrError),

    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Document has no root element")]
    Empty,

    #[error("Unbalanced closing tag </{0}>")]
    Unbalanced(String),

    #[error("Element <{0}> is never closed")]
    Unclosed(String),
}

/// Read a document from disk, transparently inflating gzip content
pub fn read_document(path: &Path) -> Result<Node, TreeError> {
    let bytes = fs::read(path)?;

    let text = if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes.as_slice()).read_to_string(&mut text)?;
        log::debug!("Inflated gzip document ({} bytes of XML)", text.len());
        text
    } else {
        log::info!("File is not gzipped, reading as plain XML");
        String::from_utf8(bytes)?
    };

    parse_document(&text)
}

/// Parse XML text into an owned tree, returning the root element
pub fn parse_document(text: &str) -> Result<Node, TreeError> {
    let mut reader = Reader::from_str(text.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element(&start)?),
            Event::Empty(start) => {
                let node = element(&start)?;
                attach(&mut stack, &mut root, node);
            }
            Event::End(end) => {
                let node = stack.pop().ok_or_else(|| {
                    TreeError::Unbalanced(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                })?;
                attach(&mut stack, &mut root, node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(TreeError::Unclosed(open.tag.clone()));
    }

    root.ok_or(TreeError::Empty)
}

/// Serialize a tree with an XML declaration and 4-space indentation
pub fn write_document(root: &Node) -> Result<String, TreeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_node(&mut writer, root)?;

    let mut text = String::from_utf8(writer.into_inner())?;
    text.push('\n');
    Ok(text)
}

fn element(start: &BytesStart<'_>) -> Result<Node, TreeError> {
    let mut node = Node::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());

    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attrs.push((key, value));
    }

    Ok(node)
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {}
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), TreeError> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (name, value) in &node.attrs {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if node.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        for child in &node.children {
            write_node(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const LIVE_SET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Ableton MajorVersion="5" Creator="Ableton Live 12.1">
    <LiveSet>
        <Tracks>
            <MidiTrack Id="3"><Name Value="Kick &amp; Snare"/></MidiTrack>
        </Tracks>
    </LiveSet>
</Ableton>"#;

    #[test]
    fn test_parse_document_structure() {
        let root = parse_document(LIVE_SET).unwrap();
        assert_eq!(root.tag, "Ableton");
        assert_eq!(root.attr("Creator"), Some("Ableton Live 12.1"));

        let name = root
            .resolve_tags(&["LiveSet", "Tracks", "MidiTrack", "Name"])
            .unwrap();
        assert_eq!(name.value(), Some("Kick & Snare"));
    }

    #[test]
    fn test_parse_rejects_unclosed_element() {
        assert!(parse_document("<a><b></b>").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        assert!(matches!(parse_document("   "), Err(TreeError::Empty)));
    }

    #[test]
    fn test_read_gzip_and_plain_documents() {
        let temp_dir = TempDir::new().unwrap();

        let plain_path = temp_dir.path().join("plain.als");
        fs::write(&plain_path, LIVE_SET).unwrap();

        let gz_path = temp_dir.path().join("packed.als");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(LIVE_SET.as_bytes()).unwrap();
        fs::write(&gz_path, encoder.finish().unwrap()).unwrap();

        let plain = read_document(&plain_path).unwrap();
        let packed = read_document(&gz_path).unwrap();
        assert_eq!(plain, packed);
    }

    #[test]
    fn test_write_document_escapes_and_nests() {
        let doc = Node::new("document").with_child(
            Node::new("session")
                .with_attr("version", 2)
                .with_child(Node::new("cell").with_attr("filename", ".\\a&b.wav")),
        );

        let text = write_document(&doc).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains("<session version=\"2\">"));
        assert!(text.contains("filename=\".\\a&amp;b.wav\""));
        assert!(text.contains("</document>"));

        let reparsed = parse_document(&text).unwrap();
        assert_eq!(reparsed, doc);
    }
}
