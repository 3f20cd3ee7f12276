//! In-memory directed graph used by the local engine.
//!
//! Vertices are created from edge endpoints. Each vertex keeps its incoming
//! and outgoing edge lists so that vertex programs can inspect which side of
//! a bipartite graph it sits on.

use std::ops::AddAssign;

use crate::prelude::*;

pub type VertexId = u64;
pub type VertexIndex = usize;
pub type EdgeIndex = usize;

/// Edges a vertex program gathers or scatters along.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeDirection {
    None,
    Out,
    All,
}

pub struct Graph<V, E> {
    vertices: Vec<VertexEntry<V>>,
    edges: Vec<EdgeEntry<E>>,
}

struct VertexEntry<V> {
    id: VertexId,
    data: V,
    in_edges: Vec<EdgeIndex>,
    out_edges: Vec<EdgeIndex>,
}

struct EdgeEntry<E> {
    source: VertexIndex,
    target: VertexIndex,
    data: E,
}

/// Collects edges before the vertex set is known.
pub struct GraphBuilder<E> {
    edges: Vec<(VertexId, VertexId, E)>,
}

impl<E> Default for GraphBuilder<E> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<E> GraphBuilder<E> {
    pub fn add_edge(&mut self, source: VertexId, target: VertexId, data: E) {
        self.edges.push((source, target, data));
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Creates the vertices in ascending ID order, initializing each one with `init`.
    pub fn build<V>(self, mut init: impl FnMut(VertexId) -> V) -> Graph<V, E> {
        let mut vertices = self
            .edges
            .iter()
            .flat_map(|(source, target, _)| [*source, *target])
            .sorted()
            .dedup()
            .map(|id| VertexEntry {
                id,
                data: init(id),
                in_edges: Vec::new(),
                out_edges: Vec::new(),
            })
            .collect_vec();
        let indices: AHashMap<VertexId, VertexIndex> = vertices
            .iter()
            .enumerate()
            .map(|(index, vertex)| (vertex.id, index))
            .collect();

        let edges = self
            .edges
            .into_iter()
            .enumerate()
            .map(|(edge_index, (source_id, target_id, data))| {
                let source = indices[&source_id];
                let target = indices[&target_id];
                vertices[source].out_edges.push(edge_index);
                vertices[target].in_edges.push(edge_index);
                EdgeEntry {
                    source,
                    target,
                    data,
                }
            })
            .collect();

        Graph { vertices, edges }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GraphStatistics {
    pub n_vertices: usize,
    pub n_edges: usize,

    /// Vertices with outgoing edges only.
    pub n_left: usize,

    /// Vertices with incoming edges only.
    pub n_right: usize,

    /// Vertices with both incoming and outgoing edges, the graph is not bipartite if non-zero.
    pub n_mixed: usize,
}

impl<V, E> Graph<V, E> {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, index: VertexIndex) -> Vertex<'_, V, E> {
        debug_assert!(index < self.vertices.len());
        Vertex { graph: self, index }
    }

    pub fn vertex_mut(&mut self, index: VertexIndex) -> VertexMut<'_, V> {
        let entry = &mut self.vertices[index];
        VertexMut {
            id: entry.id,
            num_in_edges: entry.in_edges.len(),
            num_out_edges: entry.out_edges.len(),
            data: &mut entry.data,
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vertex<'_, V, E>> {
        (0..self.vertices.len()).map(|index| Vertex { graph: self, index })
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge<'_, V, E>> {
        (0..self.edges.len()).map(|index| Edge { graph: self, index })
    }

    pub fn map_reduce_edges<T: Default + AddAssign>(
        &self,
        mut map: impl FnMut(Edge<'_, V, E>) -> T,
    ) -> T {
        self.edges().fold(T::default(), |mut accumulator, edge| {
            accumulator += map(edge);
            accumulator
        })
    }

    pub fn map_reduce_vertices<T: Default + AddAssign>(
        &self,
        mut map: impl FnMut(Vertex<'_, V, E>) -> T,
    ) -> T {
        self.vertices().fold(T::default(), |mut accumulator, vertex| {
            accumulator += map(vertex);
            accumulator
        })
    }

    pub fn statistics(&self) -> GraphStatistics {
        let mut statistics = GraphStatistics {
            n_vertices: self.num_vertices(),
            n_edges: self.num_edges(),
            ..Default::default()
        };
        for vertex in &self.vertices {
            match (vertex.in_edges.is_empty(), vertex.out_edges.is_empty()) {
                (true, false) => statistics.n_left += 1,
                (false, true) => statistics.n_right += 1,
                (false, false) => statistics.n_mixed += 1,
                (true, true) => unreachable!("vertices are created from edge endpoints"),
            }
        }
        statistics
    }
}

/// Read-only view of a vertex.
pub struct Vertex<'a, V, E> {
    graph: &'a Graph<V, E>,
    index: VertexIndex,
}

impl<'a, V, E> Clone for Vertex<'a, V, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, V, E> Copy for Vertex<'a, V, E> {}

impl<'a, V, E> Vertex<'a, V, E> {
    fn entry(&self) -> &'a VertexEntry<V> {
        &self.graph.vertices[self.index]
    }

    pub fn id(&self) -> VertexId {
        self.entry().id
    }

    pub fn index(&self) -> VertexIndex {
        self.index
    }

    pub fn data(&self) -> &'a V {
        &self.entry().data
    }

    pub fn num_in_edges(&self) -> usize {
        self.entry().in_edges.len()
    }

    pub fn num_out_edges(&self) -> usize {
        self.entry().out_edges.len()
    }

    /// Incident edges along the direction, incoming ones first.
    pub fn edges(&self, direction: EdgeDirection) -> impl Iterator<Item = Edge<'a, V, E>> {
        let entry = self.entry();
        let graph = self.graph;
        let none: &[EdgeIndex] = &[];
        let (in_edges, out_edges) = match direction {
            EdgeDirection::None => (none, none),
            EdgeDirection::Out => (none, entry.out_edges.as_slice()),
            EdgeDirection::All => (entry.in_edges.as_slice(), entry.out_edges.as_slice()),
        };
        in_edges
            .iter()
            .chain(out_edges)
            .map(move |index| Edge { graph, index: *index })
    }
}

/// Read-only view of an edge and its endpoints.
pub struct Edge<'a, V, E> {
    graph: &'a Graph<V, E>,
    index: EdgeIndex,
}

impl<'a, V, E> Clone for Edge<'a, V, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, V, E> Copy for Edge<'a, V, E> {}

impl<'a, V, E> Edge<'a, V, E> {
    fn entry(&self) -> &'a EdgeEntry<E> {
        &self.graph.edges[self.index]
    }

    pub fn data(&self) -> &'a E {
        &self.entry().data
    }

    pub fn source(&self) -> Vertex<'a, V, E> {
        self.graph.vertex(self.entry().source)
    }

    pub fn target(&self) -> Vertex<'a, V, E> {
        self.graph.vertex(self.entry().target)
    }

    /// Returns the endpoint opposite to `vertex`.
    pub fn other(&self, vertex: &Vertex<'_, V, E>) -> Vertex<'a, V, E> {
        let entry = self.entry();
        if entry.source == vertex.index {
            self.graph.vertex(entry.target)
        } else {
            self.graph.vertex(entry.source)
        }
    }
}

/// Mutable access to a vertex's data, handed to `apply`.
pub struct VertexMut<'a, V> {
    pub id: VertexId,
    pub num_in_edges: usize,
    pub num_out_edges: usize,
    pub data: &'a mut V,
}
