//! Plugin dependency graph
//!
//! Tracks which plugins depend on which others, detects cycles and missing
//! dependencies, and produces a start-up order. Plugins keep their
//! registration order, which decides between plugins that are ready at the
//! same time.

use crate::errors::DependencyError;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// Plugin names in registration order
    names: Vec<String>,

    /// Plugin -> plugins it depends on
    dependencies: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin, or replace the dependencies of an existing one
    /// (keeping its registration position)
    pub fn set_dependencies(&mut self, name: impl Into<String>, deps: Vec<String>) {
        let name = name.into();
        if !self.dependencies.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.dependencies.insert(name, deps);
    }

    pub fn remove(&mut self, name: &str) {
        self.names.retain(|n| n != name);
        self.dependencies.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get_dependencies(&self, name: &str) -> Option<&[String]> {
        self.dependencies.get(name).map(|v| v.as_slice())
    }

    /// Plugins that declare `name` as a dependency, in registration order
    pub fn get_dependents(&self, name: &str) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| {
                self.dependencies
                    .get(*n)
                    .map_or(false, |deps| deps.iter().any(|d| d == name))
            })
            .map(String::as_str)
            .collect()
    }

    /// First dependency that is not part of the graph
    pub fn check_missing(&self) -> Result<(), DependencyError> {
        for name in &self.names {
            for dep in self.dependencies.get(name).into_iter().flatten() {
                if !self.dependencies.contains_key(dep) {
                    return Err(DependencyError::Missing {
                        plugin: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Detect circular dependencies using DFS
    pub fn detect_circular_dependencies(&self) -> Result<(), DependencyError> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for name in &self.names {
            if !visited.contains(name.as_str()) {
                self.dfs_detect_cycle(name, &mut visited, &mut stack)?;
            }
        }

        Ok(())
    }

    /// DFS helper; `stack` is the current path, used to report the cycle
    fn dfs_detect_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), DependencyError> {
        visited.insert(node);
        stack.push(node);

        for dep in self.dependencies.get(node).into_iter().flatten() {
            if let Some(start) = stack.iter().position(|n| *n == dep) {
                let mut path: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                path.push(dep.clone());
                return Err(DependencyError::Cycle { path });
            }
            if !visited.contains(dep.as_str()) && self.dependencies.contains_key(dep) {
                self.dfs_detect_cycle(dep, visited, stack)?;
            }
        }

        stack.pop();
        Ok(())
    }

    /// Start-up order (dependencies first)
    ///
    /// Kahn's algorithm; among plugins whose dependencies are all placed, the
    /// earliest registered goes first.
    pub fn topological_sort(&self) -> Result<Vec<String>, DependencyError> {
        self.check_missing()?;
        self.detect_circular_dependencies()?;

        let position: HashMap<&str, usize> = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        // Number of distinct unplaced dependencies per plugin
        let mut in_degree: Vec<usize> = self
            .names
            .iter()
            .map(|name| {
                self.dependencies
                    .get(name)
                    .map_or(0, |deps| deps.iter().collect::<HashSet<_>>().len())
            })
            .collect();

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| i)
            .collect();
        let mut result = Vec::with_capacity(self.names.len());

        while let Some(next) = ready.pop_first() {
            let name = &self.names[next];
            result.push(name.clone());

            for dependent in self.get_dependents(name) {
                if let Some(&i) = position.get(dependent) {
                    in_degree[i] -= 1;
                    if in_degree[i] == 0 {
                        ready.insert(i);
                    }
                }
            }
        }

        Ok(result)
    }
}
