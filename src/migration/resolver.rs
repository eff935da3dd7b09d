//! Dependency resolution for migrations
//!
//! Builds a graph with an edge from every dependency to its dependent and
//! orders it topologically. Ties are broken by `(app, name)` so the order is
//! deterministic regardless of discovery order.

use crate::constants::{FIRST_MIGRATION, LATEST_MIGRATION};
use crate::error::ResolveError;
use crate::migration::{Dependency, Migration, MigrationKey};
use crate::settings::Settings;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashSet};
use tracing::{debug, info};

/// Orders migrations so that every dependency precedes its dependents
pub struct Resolver<'a> {
    settings: &'a Settings,
}

/// Dependency graph over a borrowed set of migrations
struct DependencyGraph<'m> {
    graph: DiGraph<MigrationKey, ()>,
    nodes: BTreeMap<MigrationKey, NodeIndex>,
    migrations: BTreeMap<MigrationKey, &'m Migration>,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Linear application order for all migrations
    pub fn resolve<'m>(&self, migrations: &'m [Migration]) -> Result<Vec<&'m Migration>, ResolveError> {
        let graph = self.build_graph(migrations)?;
        let order = graph.topological_order()?;

        info!("Resolved application order for {} migrations", order.len());
        Ok(order)
    }

    /// Application order for `target` and its transitive dependencies only
    pub fn plan_for<'m>(
        &self,
        migrations: &'m [Migration],
        target: &MigrationKey,
    ) -> Result<Vec<&'m Migration>, ResolveError> {
        let graph = self.build_graph(migrations)?;
        let order = graph.topological_order()?;

        let target_node = *graph
            .nodes
            .get(target)
            .ok_or_else(|| ResolveError::UnknownTarget(target.clone()))?;

        let mut required: HashSet<NodeIndex> = HashSet::new();
        let reversed = Reversed(&graph.graph);
        let mut dfs = Dfs::new(reversed, target_node);
        while let Some(node) = dfs.next(reversed) {
            required.insert(node);
        }

        let plan: Vec<&'m Migration> = order
            .into_iter()
            .filter(|m| {
                graph
                    .nodes
                    .get(&m.key())
                    .is_some_and(|node| required.contains(node))
            })
            .collect();

        debug!("Plan for {} contains {} migrations", target, plan.len());
        Ok(plan)
    }

    fn build_graph<'m>(&self, migrations: &'m [Migration]) -> Result<DependencyGraph<'m>, ResolveError> {
        let mut by_key: BTreeMap<MigrationKey, &'m Migration> = BTreeMap::new();
        for migration in migrations {
            let key = migration.key();
            if by_key.insert(key.clone(), migration).is_some() {
                return Err(ResolveError::DuplicateMigration(key));
            }
        }

        let mut graph = DiGraph::new();
        let nodes: BTreeMap<MigrationKey, NodeIndex> = by_key
            .keys()
            .map(|key| (key.clone(), graph.add_node(key.clone())))
            .collect();

        for (key, migration) in &by_key {
            for dependency in &migration.dependencies {
                let dependency_key = self.dependency_key(key, dependency, &by_key)?;
                debug!("  {} depends on {}", key, dependency_key);
                graph.add_edge(nodes[&dependency_key], nodes[key], ());
            }
        }

        Ok(DependencyGraph {
            graph,
            nodes,
            migrations: by_key,
        })
    }

    /// Resolve a declared dependency to the key of an existing migration
    fn dependency_key(
        &self,
        migration: &MigrationKey,
        dependency: &Dependency,
        by_key: &BTreeMap<MigrationKey, &Migration>,
    ) -> Result<MigrationKey, ResolveError> {
        let (app, name) = match dependency {
            Dependency::Migration(app, name) => (app.as_str(), name.as_str()),
            Dependency::Swappable { swappable } => {
                let model = self.settings.swappable(swappable).ok_or_else(|| {
                    ResolveError::UnknownSetting {
                        migration: migration.clone(),
                        setting: swappable.clone(),
                    }
                })?;
                (model.app.as_str(), FIRST_MIGRATION)
            }
        };

        let missing = || ResolveError::MissingDependency {
            migration: migration.clone(),
            dependency: MigrationKey::new(app, name),
        };

        let mut app_keys = by_key.keys().filter(|k| k.app == app);
        let resolved = match name {
            FIRST_MIGRATION => app_keys.next().cloned(),
            LATEST_MIGRATION => app_keys.next_back().cloned(),
            _ => {
                let key = MigrationKey::new(app, name);
                by_key.contains_key(&key).then_some(key)
            }
        };

        resolved.ok_or_else(missing)
    }
}

impl<'m> DependencyGraph<'m> {
    /// Kahn's algorithm with a min-heap on keys for deterministic tie-breaking
    fn topological_order(&self) -> Result<Vec<&'m Migration>, ResolveError> {
        let mut in_degree: BTreeMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|node| {
                let degree = self
                    .graph
                    .neighbors_directed(node, Direction::Incoming)
                    .count();
                (node, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<(&MigrationKey, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| Reverse((&self.graph[*node], *node)))
            .collect();

        let mut ordered = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((key, node))) = ready.pop() {
            ordered.push(self.migrations[key]);

            for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((&self.graph[dependent], dependent)));
                    }
                }
            }
        }

        if ordered.len() != self.graph.node_count() {
            return Err(ResolveError::Cycle(self.find_cycle()));
        }

        Ok(ordered)
    }

    /// Members of one dependency cycle, sorted by key
    fn find_cycle(&self) -> Vec<MigrationKey> {
        let cycle = tarjan_scc(&self.graph)
            .into_iter()
            .find(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| self.graph.contains_edge(node, node))
            })
            .unwrap_or_default();

        let mut keys: Vec<MigrationKey> = cycle
            .into_iter()
            .map(|node| self.graph[node].clone())
            .collect();
        keys.sort();
        keys
    }
}
