// Preset assembler - Joins pad and sequence cells with the fixed song and effect sections

use crate::tree::Node;

use super::cells::{format_number, params_node};
use super::pads::PadCell;
use super::sequences::SequenceCell;

pub const SESSION_VERSION: u32 = 2;
pub const SONG_SECTIONS: usize = 16;
pub const SECTION_LENGTH_BARS: u32 = 8;

/// Build the whole preset document
pub fn assemble(pads: &[PadCell], sequences: &[SequenceCell], tempo: f64) -> Node {
    let mut session = Node::new("session").with_attr("version", SESSION_VERSION);

    for pad in pads {
        session.push(pad.to_node());
    }
    for sequence in sequences {
        session.push(sequence.to_node());
    }
    for row in 0..SONG_SECTIONS {
        session.push(song_section(row));
    }
    for cell in effect_cells() {
        session.push(cell);
    }
    session.push(song_cell(tempo));

    log::debug!(
        "Assembled preset: {} pads, {} sequence cells, {} session cells",
        pads.len(),
        sequences.len(),
        session.children.len()
    );

    Node::new("document").with_child(session)
}

fn song_section(row: usize) -> Node {
    Node::new("cell")
        .with_attr("row", row)
        .with_attr("column", 0)
        .with_attr("layer", 2)
        .with_attr("name", "")
        .with_attr("type", "section")
        .with_child(params_node([("sectionlenbars", SECTION_LENGTH_BARS)]))
        .with_child(Node::new("sequence"))
}

fn effect_cell(row: u8, kind: &str, params: Node) -> Node {
    Node::new("cell")
        .with_attr("row", row)
        .with_attr("layer", 3)
        .with_attr("type", kind)
        .with_child(params)
}

/// Delay, reverb, eq and the null cell, all at factory settings
fn effect_cells() -> Vec<Node> {
    let delay = params_node([
        ("delay", 400),
        ("delaymustime", 6),
        ("feedback", 400),
        ("cutoff", 120),
        ("filtquality", 1000),
        ("dealybeatsync", 1),
        ("filtenable", 1),
        ("delaypingpong", 1),
    ]);

    let reverb = params_node([("decay", 600), ("predelay", 40), ("damping", 500)]);

    let mut eq = params_node([("eqactband", 0)]);
    for (band, cutoff) in [(1, 200), (2, 400), (3, 600), (4, 800)] {
        let suffix = if band == 1 { String::new() } else { band.to_string() };
        eq.set_attr(format!("eqgain{}", suffix), 0);
        eq.set_attr(format!("eqcutoff{}", suffix), cutoff);
        eq.set_attr(format!("eqres{}", suffix), 400);
        eq.set_attr(format!("eqenable{}", suffix), 1);
        eq.set_attr(format!("eqtype{}", suffix), 0);
    }

    vec![
        effect_cell(0, "delay", delay),
        effect_cell(1, "reverb", reverb),
        effect_cell(2, "eq", eq),
        effect_cell(4, "null", Node::new("params")),
    ]
}

fn song_cell(tempo: f64) -> Node {
    Node::new("cell").with_attr("type", "song").with_child(params_node([
        ("globtempo", format_number(tempo)),
        ("songmode", "0".to_string()),
        ("sectcount", "1".to_string()),
        ("sectloop", "1".to_string()),
        ("swing", "50".to_string()),
        ("keymode", "1".to_string()),
        ("keyroot", "3".to_string()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells_of_type<'a>(session: &'a Node, kind: &'a str) -> Vec<&'a Node> {
        session
            .children
            .iter()
            .filter(|c| c.attr("type") == Some(kind))
            .collect()
    }

    #[test]
    fn test_document_shape() {
        let pads: Vec<PadCell> = (0..16).map(PadCell::template).collect();
        let doc = assemble(&pads, &[], 98.5);

        assert_eq!(doc.tag, "document");
        let session = doc.child("session").unwrap();
        assert_eq!(session.attr("version"), Some("2"));

        // 16 pads, 16 sections, 4 effect cells, song
        assert_eq!(session.children.len(), 37);
        assert_eq!(cells_of_type(session, "samtempl").len(), 16);
        assert_eq!(cells_of_type(session, "section").len(), 16);

        let song = cells_of_type(session, "song")[0];
        assert_eq!(song.child("params").and_then(|p| p.attr("globtempo")), Some("98.5"));
    }

    #[test]
    fn test_sections_and_effects() {
        let doc = assemble(&[], &[], 120.0);
        let session = doc.child("session").unwrap();

        let sections = cells_of_type(session, "section");
        assert_eq!(sections[15].attr("row"), Some("15"));
        assert_eq!(sections[0].attr("layer"), Some("2"));
        assert_eq!(
            sections[0].child("params").and_then(|p| p.attr("sectionlenbars")),
            Some("8")
        );
        assert!(sections[0].child("sequence").is_some());

        let eq = cells_of_type(session, "eq")[0].child("params").unwrap();
        assert_eq!(eq.attr("eqcutoff"), Some("200"));
        assert_eq!(eq.attr("eqcutoff3"), Some("600"));
        assert_eq!(eq.attr("eqenable4"), Some("1"));
        assert_eq!(eq.attrs.len(), 21);

        let null = cells_of_type(session, "null")[0];
        assert_eq!(null.attr("row"), Some("4"));
        assert!(null.child("params").unwrap().attrs.is_empty());

        let song = cells_of_type(session, "song")[0].child("params").unwrap();
        assert_eq!(song.attr("globtempo"), Some("120"));
        assert_eq!(song.attr("swing"), Some("50"));
    }
}
