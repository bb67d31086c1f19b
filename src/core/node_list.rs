//! Punktliste mit 1:1 gekoppelten Node-Handles.

use glam::Vec2;

use super::geometry::{nearest_edge, nearest_point_within};

/// Darstellungszustand eines Node-Handles (Außenring + Innenpunkt).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeHandle {
    /// Node ist zum Ziehen ausgewählt
    pub selected: bool,
    /// Pointer schwebt über dem Node
    pub hovered: bool,
}

/// Bearbeitbare Form: Punkte und Nodes wachsen und schrumpfen immer gemeinsam.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableShape {
    points: Vec<Vec2>,
    nodes: Vec<NodeHandle>,
}

impl EditableShape {
    /// Leere Form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Form aus vorhandenen Punkten (ein Node pro Punkt).
    pub fn from_points(points: Vec<Vec2>) -> Self {
        let nodes = vec![NodeHandle::default(); points.len()];
        Self { points, nodes }
    }

    /// Punkte
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Nodes
    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    /// Anzahl Punkte (= Anzahl Nodes).
    pub fn len(&self) -> usize {
        self.check_lockstep();
        self.points.len()
    }

    /// Ist die Form leer?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Hängt Punkt + Node an.
    pub fn push(&mut self, point: Vec2) {
        self.points.push(point);
        self.nodes.push(NodeHandle::default());
        self.check_lockstep();
    }

    /// Fügt Punkt + Node an `index` ein. `false` bei ungültigem Index.
    pub fn insert(&mut self, index: usize, point: Vec2) -> bool {
        if index > self.points.len() {
            return false;
        }
        self.points.insert(index, point);
        self.nodes.insert(index, NodeHandle::default());
        self.check_lockstep();
        true
    }

    /// Entfernt Punkt + Node an `index`.
    pub fn remove(&mut self, index: usize) -> Option<Vec2> {
        if index >= self.points.len() {
            return None;
        }
        self.nodes.remove(index);
        let point = self.points.remove(index);
        self.check_lockstep();
        Some(point)
    }

    /// Verschiebt den Punkt an `index`.
    pub fn set(&mut self, index: usize, point: Vec2) -> bool {
        match self.points.get_mut(index) {
            Some(p) => {
                *p = point;
                true
            }
            None => false,
        }
    }

    /// Leert Punkte und Nodes.
    pub fn clear(&mut self) {
        self.points.clear();
        self.nodes.clear();
    }

    /// Nächster Node innerhalb von `radius`.
    pub fn nearest_node(&self, world: Vec2, radius: f32) -> Option<usize> {
        nearest_point_within(world, &self.points, radius)
    }

    /// Nächste Kante: (Startindex, Abstand).
    pub fn nearest_edge(&self, world: Vec2, closed: bool) -> Option<(usize, f32)> {
        nearest_edge(world, &self.points, closed)
    }

    /// Markiert genau einen Node als ausgewählt (`None` = keinen).
    pub fn select_node(&mut self, index: Option<usize>) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.selected = Some(i) == index;
        }
    }

    /// Index des ausgewählten Nodes.
    pub fn selected_node(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.selected)
    }

    /// Markiert genau einen Node als gehovert (`None` = keinen).
    pub fn hover_node(&mut self, index: Option<usize>) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.hovered = Some(i) == index;
        }
    }

    /// Konsumiert die Form und liefert die Punkte.
    pub fn into_points(self) -> Vec<Vec2> {
        self.points
    }

    fn check_lockstep(&self) {
        debug_assert_eq!(
            self.points.len(),
            self.nodes.len(),
            "Punkte und Nodes laufen auseinander"
        );
    }
}
