use crate::error::CommonError;
use crate::schema::ProjectSchema;
use std::path::Path;

/// Common Result type alias
pub type CommonResult<T> = Result<T, CommonError>;

/// Read and decode a project schema file
pub fn load_project(path: &Path) -> CommonResult<ProjectSchema> {
    let content = std::fs::read_to_string(path)?;
    let project = serde_json::from_str(&content)?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_project_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"componentsTree": [{{"componentName": "Page",
                "children": [{{"componentName": "Text"}}]}}]}}"#
        )
        .unwrap();

        let project = load_project(file.path()).unwrap();
        assert_eq!(project.version, "1.0.0");
        assert_eq!(project.components_tree[0].node_count(), 2);
    }

    #[test]
    fn test_load_project_errors() {
        let missing = load_project(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(CommonError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_project(file.path()), Err(CommonError::Json(_))));
    }
}
