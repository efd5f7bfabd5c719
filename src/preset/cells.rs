// Cell helpers - Grid positions, number formatting and params elements
// Shared by the pad, sequence and static-section builders

use crate::tree::Node;

/// Fixed row/column of each of the 16 grid slots
#[rustfmt::skip]
const GRID: [(u8, u8); 16] = [
    (0, 0), (0, 1), (0, 2), (0, 3),
    (1, 0), (1, 1), (1, 2), (1, 3),
    (2, 0), (2, 1), (2, 2), (2, 3),
    (3, 0), (3, 1), (3, 2), (3, 3),
];

/// Row and column of a grid slot; indices past the grid wrap
pub fn grid_position(index: usize) -> (u8, u8) {
    GRID[index % GRID.len()]
}

/// Render a number the way preset files store it: integers without a fraction
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Round to the nearest integer for integer-only params
pub fn format_int(value: f64) -> String {
    if value.is_finite() {
        format!("{}", value.round() as i64)
    } else {
        "0".to_string()
    }
}

/// `<params>` element with attributes in the given order
pub fn params_node<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Node
where
    K: Into<String>,
    V: ToString,
{
    entries
        .into_iter()
        .fold(Node::new("params"), |node, (name, value)| node.with_attr(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_positions() {
        assert_eq!(grid_position(0), (0, 0));
        assert_eq!(grid_position(3), (0, 3));
        assert_eq!(grid_position(4), (1, 0));
        assert_eq!(grid_position(14), (3, 2));
        assert_eq!(grid_position(15), (3, 3));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(120.0), "120");
        assert_eq!(format_number(98.5), "98.5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_int(299.6), "300");
        assert_eq!(format_int(f64::NAN), "0");
    }

    #[test]
    fn test_params_node_keeps_order() {
        let node = params_node([("b", "1"), ("a", "2")]);
        assert_eq!(node.tag, "params");
        let names: Vec<&str> = node.attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(node.attr("a"), Some("2"));
    }
}
