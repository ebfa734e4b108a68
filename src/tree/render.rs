//! DOT and text renderings of the tree.

use std::io::{self, Write};

use super::node::{Node, NodeId};
use super::TreeState;

impl TreeState {
    pub(crate) fn write_graph<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "digraph ht {{")?;
        writeln!(writer, "  edge [arrowsize=0.6, fontsize=10];")?;
        self.write_graph_node(self.root, "N", writer)?;
        writeln!(writer, "}}")
    }

    fn write_graph_node<W: Write>(&self, id: NodeId, name: &str, writer: &mut W) -> io::Result<()> {
        match &self.nodes[id as usize] {
            Node::Leaf(leaf) => {
                writeln!(
                    writer,
                    "  {name} [label=\"weight: {:.1}\", shape=box];",
                    leaf.total_weight()
                )
            }
            Node::Split(split) => {
                writeln!(
                    writer,
                    "  {name} [label=\"{}\"];",
                    split.condition.predictor_name()
                )?;
                for (branch, child) in split.children.iter().enumerate() {
                    let Some(child) = child else {
                        continue;
                    };
                    let child_name = format!("{name}_{branch}");
                    writeln!(
                        writer,
                        "  {name} -> {child_name} [label=\"{}\"];",
                        split.condition.describe(branch)
                    )?;
                    self.write_graph_node(*child, &child_name, writer)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn write_text<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "ROOT ")?;
        self.write_text_node(self.root, "\t", writer)
    }

    fn write_text_node<W: Write>(&self, id: NodeId, indent: &str, writer: &mut W) -> io::Result<()> {
        match &self.nodes[id as usize] {
            Node::Leaf(leaf) => {
                let state = if leaf.is_inactive { "inactive leaf" } else { "leaf" };
                writeln!(writer, "{state} [weight {:.1}]", leaf.total_weight())
            }
            Node::Split(split) => {
                writeln!(writer, "split on {}", split.condition.predictor_name())?;
                for (branch, child) in split.children.iter().enumerate() {
                    let Some(child) = child else {
                        continue;
                    };
                    write!(writer, "{indent}{} ", split.condition.describe(branch))?;
                    self.write_text_node(*child, &format!("{indent}\t"), writer)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TreeConfig;
    use crate::data::{Attribute, MapInstance, Model};
    use crate::HoeffdingTree;

    fn trained_tree() -> HoeffdingTree {
        let model = Model::new(
            Attribute::nominal_with_levels("y", &["a", "b"]),
            vec![Attribute::nominal_with_levels("c", &["left", "right"])],
        );
        let config = TreeConfig::builder()
            .grace_period(5.0)
            .split_confidence(1e-2)
            .build()
            .unwrap();
        let tree = HoeffdingTree::new(model, config).unwrap();
        for i in 0..60 {
            let (c, y) = if i % 2 == 0 { ("left", "a") } else { ("right", "b") };
            tree.train(&MapInstance::new().set("c", c).set("y", y));
        }
        tree
    }

    #[test]
    fn graph_output_is_a_wellformed_digraph() {
        let tree = trained_tree();
        let mut out = Vec::new();
        tree.write_graph(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("digraph ht {"));
        assert!(text.trim_end().ends_with('}'));
        assert!(text.contains("N ["), "missing root node: {text}");
        assert!(text.contains("N -> N_0"), "missing edge: {text}");
        assert!(text.contains("label=\"left\""), "missing branch label: {text}");
    }

    #[test]
    fn text_output_starts_at_the_root() {
        let tree = trained_tree();
        let mut out = Vec::new();
        tree.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("ROOT "));
        assert!(text.contains("split on c"));
        assert!(text.contains("leaf [weight"));
    }
}
