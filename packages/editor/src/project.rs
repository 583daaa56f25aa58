//! A project: the set of documents open in one editor.

use crate::document::Document;
use crate::errors::EditorError;
use crate::event_bus::EventBus;
use crate::history::HistoryConfig;
use crate::meta::ComponentMetaRegistry;
use mosaic_common::{NodeSchema, ProjectSchema, TransformStage};

#[derive(Debug)]
pub struct Project {
    version: String,
    documents: Vec<Document>,
    current: Option<usize>,
    next_document: usize,
    metas: ComponentMetaRegistry,
    bus: EventBus,
    history: HistoryConfig,
}

impl Project {
    /// Empty project (no documents)
    pub fn new(metas: ComponentMetaRegistry, bus: EventBus, history: HistoryConfig) -> Self {
        Self {
            version: ProjectSchema::default().version,
            documents: Vec::new(),
            current: None,
            next_document: 0,
            metas,
            bus,
            history,
        }
    }

    /// Open one document per component tree; the first becomes current
    pub fn from_schema(
        schema: &ProjectSchema,
        metas: ComponentMetaRegistry,
        bus: EventBus,
        history: HistoryConfig,
    ) -> Result<Self, EditorError> {
        let mut project = Self::new(metas, bus, history);
        project.version = schema.version.clone();
        for tree in &schema.components_tree {
            project.open_document(tree)?;
        }
        project.current = if project.documents.is_empty() { None } else { Some(0) };
        Ok(project)
    }

    /// Create a document from a root schema and make it current
    pub fn open_document(&mut self, root: &NodeSchema) -> Result<&mut Document, EditorError> {
        self.next_document += 1;
        let id = format!("doc{}", self.next_document);
        let doc = Document::new(id, root, self.metas.clone(), self.bus.clone(), self.history)?;

        tracing::info!("[Project] opened {} ({} nodes)", doc.id(), doc.node_count());
        self.documents.push(doc);
        let index = self.documents.len() - 1;
        self.current = Some(index);
        Ok(&mut self.documents[index])
    }

    /// Close and drop a document
    pub fn remove_document(&mut self, id: &str) -> Result<(), EditorError> {
        let index = self.position(id)?;
        let mut doc = self.documents.remove(index);
        doc.close();

        self.current = match self.current {
            _ if self.documents.is_empty() => None,
            Some(current) if current > index => Some(current - 1),
            Some(current) if current == index => Some(index.min(self.documents.len() - 1)),
            other => other,
        };
        Ok(())
    }

    pub fn set_current(&mut self, id: &str) -> Result<(), EditorError> {
        self.current = Some(self.position(id)?);
        Ok(())
    }

    pub fn current(&self) -> Option<&Document> {
        self.current.and_then(|i| self.documents.get(i))
    }

    pub fn current_mut(&mut self) -> Option<&mut Document> {
        self.current.and_then(|i| self.documents.get_mut(i))
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    pub fn document_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|doc| doc.id() == id)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether any document differs from its save point
    pub fn is_modified(&self) -> bool {
        self.documents.iter().any(|doc| doc.history().is_modified())
    }

    /// Serialize every document, in order
    pub fn export(&self, stage: TransformStage) -> ProjectSchema {
        ProjectSchema {
            version: self.version.clone(),
            components_map: Default::default(),
            components_tree: self.documents.iter().map(|doc| doc.export(stage)).collect(),
        }
    }

    fn position(&self, id: &str) -> Result<usize, EditorError> {
        self.documents
            .iter()
            .position(|doc| doc.id() == id)
            .ok_or_else(|| EditorError::DocumentNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(trees: usize) -> Project {
        let schema = ProjectSchema {
            version: "2.0.0".into(),
            components_map: Default::default(),
            components_tree: (0..trees)
                .map(|i| NodeSchema::new("Page").with_id(format!("page{}", i)))
                .collect(),
        };
        Project::from_schema(
            &schema,
            ComponentMetaRegistry::with_builtins(),
            EventBus::new(),
            HistoryConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_schema_opens_each_tree() {
        let project = project(2);
        assert_eq!(project.len(), 2);
        assert_eq!(project.current().unwrap().id(), "doc1");

        let exported = project.export(TransformStage::Save);
        assert_eq!(exported.version, "2.0.0");
        assert_eq!(exported.components_tree[1].id.as_deref(), Some("page1"));
    }

    #[test]
    fn test_remove_current_document() {
        let mut project = project(3);
        project.set_current("doc3").unwrap();
        project.remove_document("doc3").unwrap();
        assert_eq!(project.current().unwrap().id(), "doc2");

        project.remove_document("doc1").unwrap();
        assert_eq!(project.current().unwrap().id(), "doc2");

        assert!(matches!(
            project.remove_document("doc9"),
            Err(EditorError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_tree_is_rejected() {
        let schema = ProjectSchema::new(vec![NodeSchema::default()]);
        let result = Project::from_schema(
            &schema,
            ComponentMetaRegistry::with_builtins(),
            EventBus::new(),
            HistoryConfig::default(),
        );
        assert!(matches!(result, Err(EditorError::Document(_))));
    }
}
