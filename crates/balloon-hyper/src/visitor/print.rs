use std::fmt::Write as _;

use balloon_core::base::Digest;

use super::Visitor;
use crate::Position;

/// Renders the shape of a pruned view, one node per line, root first.
pub(crate) struct PrintVisitor;

impl PrintVisitor {
    fn line(pos: &Position, label: &str) -> String {
        let depth = usize::from(pos.n().saturating_sub(pos.height()));
        let mut line = " ".repeat(depth.saturating_mul(2));
        // Writing into a String cannot fail.
        let _ = writeln!(line, "{label} {pos}");
        line
    }
}

impl Visitor for PrintVisitor {
    type Output = String;

    fn visit_node(&mut self, pos: &Position, left: String, right: String) -> String {
        let mut out = Self::line(pos, "node");
        out.push_str(&left);
        out.push_str(&right);
        out
    }

    fn visit_leaf(&mut self, pos: &Position, value: &[u8]) -> String {
        Self::line(pos, &format!("leaf[{}]", hex::encode(value)))
    }

    fn visit_cached(&mut self, pos: &Position, digest: &Digest) -> String {
        Self::line(pos, &format!("cached[{digest}]"))
    }

    fn visit_collectable(&mut self, _pos: &Position, result: String) -> String {
        let indent = result.len().saturating_sub(result.trim_start().len());
        let (spaces, rest) = result.split_at(indent);
        format!("{spaces}*{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pruning::Pruned;

    #[test]
    fn renders_root_first_with_markers() {
        let root = Position::root(8);
        let left = root.left().expect("root has children");
        let right = root.right().expect("root has children");
        let view = Pruned::node(
            root,
            Pruned::Cached {
                pos: left,
                digest: Digest::from([0xab]),
            }
            .collectable(),
            Pruned::Cached {
                pos: right,
                digest: Digest::from([0xcd]),
            },
        );

        let rendered = view.post_order(&mut PrintVisitor);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.first().is_some_and(|l| l.starts_with("node ")));
        assert!(lines.get(1).is_some_and(|l| l.starts_with("  *cached[ab]")));
        assert!(lines.get(2).is_some_and(|l| l.starts_with("  cached[cd]")));
    }
}
