use crate::Adapter;

use fabric_core::{Error, Relation, Result};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Deepest chain of views followed from the relation being dropped.
pub const MAX_DEPENDENCY_DEPTH: usize = 32;

/// Views depending on a root relation, transitively.
///
/// Edges point from a view to the relations it reads, restricted to the
/// root and the views found while walking.
#[derive(Debug)]
struct DependencyGraph {
    root: Relation,

    /// Each discovered view and what it reads.
    reads: IndexMap<Relation, IndexSet<Relation>>,
}

impl DependencyGraph {
    fn new(root: &Relation) -> DependencyGraph {
        DependencyGraph {
            root: root.clone(),
            reads: IndexMap::new(),
        }
    }

    /// Records that `view` reads `dependency`. Returns true when `view` had
    /// not been seen before.
    fn add(&mut self, dependency: &Relation, view: &Relation) -> Result<bool> {
        if view.same_name(&self.root) {
            return Err(Error::dependency_cycle(
                &self.root,
                format!(
                    "{dependency} is referenced by {view}, which is the relation being dropped"
                ),
            ));
        }

        let fresh = !self.reads.contains_key(view);
        self.reads
            .entry(view.clone())
            .or_default()
            .insert(dependency.clone());
        Ok(fresh)
    }

    /// Views in drop order: a view comes before every view it reads.
    fn drop_order(&self) -> Result<Vec<Relation>> {
        // Views still referenced by an undropped view.
        let mut referenced: IndexMap<&Relation, usize> =
            self.reads.keys().map(|view| (view, 0)).collect();
        for reads in self.reads.values() {
            for dependency in reads {
                if let Some(count) = referenced.get_mut(dependency) {
                    *count += 1;
                }
            }
        }

        let mut ready = referenced
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(view, _)| *view)
            .collect::<Vec<_>>();
        let mut order = Vec::with_capacity(self.reads.len());

        while let Some(view) = ready.pop() {
            order.push(view.clone());

            for dependency in &self.reads[view] {
                if let Some(count) = referenced.get_mut(dependency) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(dependency);
                    }
                }
            }
        }

        if order.len() != self.reads.len() {
            let stuck = referenced
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(view, _)| view.to_string())
                .collect::<Vec<_>>();
            return Err(Error::dependency_cycle(
                &self.root,
                format!("views reference each other: {}", stuck.join(", ")),
            ));
        }

        Ok(order)
    }
}

impl Adapter {
    /// Every view that must go before `root` can be dropped, in a safe drop
    /// order.
    pub(crate) async fn dependent_views(&mut self, root: &Relation) -> Result<Vec<Relation>> {
        let mut graph = DependencyGraph::new(root);
        let mut frontier = vec![root.clone()];
        let mut depth = 0;

        while !frontier.is_empty() {
            if depth == MAX_DEPENDENCY_DEPTH {
                return Err(Error::dependency_cycle(
                    root,
                    format!(
                        "view dependencies are nested deeper than {MAX_DEPENDENCY_DEPTH} levels"
                    ),
                ));
            }

            let mut next = vec![];
            for relation in &frontier {
                for view in self.view_dependents(relation).await? {
                    if graph.add(relation, &view)? {
                        next.push(view);
                    }
                }
            }

            frontier = next;
            depth += 1;
        }

        let order = graph.drop_order()?;
        debug!(root = %root, dependents = order.len(), "resolved view dependents");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str) -> Relation {
        Relation::view("dw", "dbo", name).unwrap()
    }

    fn names(relations: &[Relation]) -> Vec<&str> {
        relations.iter().map(Relation::identifier).collect()
    }

    #[test]
    fn leaves_drop_first() {
        // root <- a <- b <- c, and root <- c
        let root = view("root");
        let mut graph = DependencyGraph::new(&root);
        graph.add(&root, &view("a")).unwrap();
        graph.add(&view("a"), &view("b")).unwrap();
        graph.add(&view("b"), &view("c")).unwrap();
        graph.add(&root, &view("c")).unwrap();

        assert_eq!(names(&graph.drop_order().unwrap()), ["c", "b", "a"]);
    }

    #[test]
    fn diamonds_drop_each_view_once() {
        let root = view("root");
        let mut graph = DependencyGraph::new(&root);
        assert!(graph.add(&root, &view("left")).unwrap());
        assert!(graph.add(&root, &view("right")).unwrap());
        assert!(graph.add(&view("left"), &view("top")).unwrap());
        assert!(!graph.add(&view("right"), &view("top")).unwrap());

        let order = graph.drop_order().unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0].identifier(), "top");
    }

    #[test]
    fn cycles_are_reported() {
        let root = view("root");
        let mut graph = DependencyGraph::new(&root);
        graph.add(&root, &view("a")).unwrap();
        graph.add(&view("a"), &view("b")).unwrap();
        graph.add(&view("b"), &view("a")).unwrap();

        let err = graph.drop_order().unwrap_err();
        assert!(err.is_dependency_cycle());
    }

    #[test]
    fn cycles_through_the_root_are_reported() {
        let root = view("root");
        let mut graph = DependencyGraph::new(&root);
        graph.add(&root, &view("a")).unwrap();
        assert!(graph.add(&view("a"), &root).unwrap_err().is_dependency_cycle());
    }
}
