use crate::schema::NodeSchema;
use serde_json::Value;

/// Visitor pattern for traversing schema trees immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &NodeSchema) {
        walk_node(self, node);
    }

    fn visit_prop(&mut self, _key: &str, _value: &Value) {
        // Leaf, no children to walk
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &NodeSchema) {
    for (key, value) in &node.props {
        visitor.visit_prop(key, value);
    }
    for child in &node.children {
        visitor.visit_node(child);
    }
}

/// Collects every id present in a schema tree (pre-order)
#[derive(Debug, Default)]
pub struct IdCollector {
    pub ids: Vec<String>,
}

impl Visitor for IdCollector {
    fn visit_node(&mut self, node: &NodeSchema) {
        if let Some(id) = &node.id {
            self.ids.push(id.clone());
        }
        walk_node(self, node);
    }
}

/// Finds the first node whose `componentName` is missing or empty
#[derive(Debug, Default)]
pub struct MissingNameFinder {
    /// Path of child indexes to the offending node
    pub found: Option<Vec<usize>>,
    path: Vec<usize>,
}

impl MissingNameFinder {
    pub fn check(node: &NodeSchema) -> Option<Vec<usize>> {
        let mut finder = Self::default();
        finder.visit_node(node);
        finder.found
    }
}

impl Visitor for MissingNameFinder {
    fn visit_node(&mut self, node: &NodeSchema) {
        if self.found.is_some() {
            return;
        }
        if node.component_name.trim().is_empty() {
            self.found = Some(self.path.clone());
            return;
        }
        for (index, child) in node.children.iter().enumerate() {
            self.path.push(index);
            self.visit_node(child);
            self.path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NodeSchema {
        NodeSchema::new("Page").with_id("p").with_children([
            NodeSchema::new("Div").with_id("d").with_child(NodeSchema::new("Text").with_id("t")),
            NodeSchema::new("Button"),
        ])
    }

    #[test]
    fn test_id_collector_is_preorder() {
        let mut collector = IdCollector::default();
        collector.visit_node(&sample());
        assert_eq!(collector.ids, vec!["p", "d", "t"]);
    }

    #[test]
    fn test_missing_name_finder_reports_path() {
        assert_eq!(MissingNameFinder::check(&sample()), None);

        let mut broken = sample();
        broken.children[0].children.push(NodeSchema::default());
        assert_eq!(MissingNameFinder::check(&broken), Some(vec![0, 1]));
    }
}
