//! The session-scoped family graph and its invariant-preserving mutations.
//!
//! Persons and relationships live in two flat vectors in insertion order;
//! edges reference endpoints by id. Two auxiliary maps turn ids into vector
//! slots and a third lists the edges incident to each person. The incident
//! map is extended in place on `connect` and rebuilt after removals.
//!
//! Every mutation validates first and writes second, so a returned error
//! always means the graph is unchanged.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::ancestry::{self, Lineage};
use super::error::GraphError;
use crate::model::{
    Biography, Connection, Person, PersonId, Position, Relationship, RelationshipId,
    RelationshipKind, Role,
};
use crate::snapshot::Snapshot;

const PERSON_PREFIX: &str = "p";
const RELATIONSHIP_PREFIX: &str = "r";

/// Canonical node/edge collections for one editing session.
#[derive(Debug, Clone, Default)]
pub struct FamilyGraph {
    persons: Vec<Person>,
    relationships: Vec<Relationship>,
    person_slots: HashMap<PersonId, usize>,
    relationship_slots: HashMap<RelationshipId, usize>,
    /// person → incident edge ids, in edge insertion order.
    incident: HashMap<PersonId, Vec<RelationshipId>>,
    next_person: u64,
    next_relationship: u64,
}

impl FamilyGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a session from a snapshot, re-checking every invariant.
    ///
    /// Persons are inserted first, then each relationship is replayed through
    /// the same checks as [`connect`](Self::connect), so a malformed snapshot
    /// is rejected with the error `connect` would have raised.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] encountered.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        for person in snapshot.persons {
            validate_biography(&person.data)?;
            validate_position(&person.id, person.position)?;
            if graph.person_slots.contains_key(&person.id) {
                return Err(GraphError::DuplicateIdentifier {
                    what: "person",
                    id: person.id.to_string(),
                });
            }
            graph.next_person = graph
                .next_person
                .max(counter_of(person.id.as_str(), PERSON_PREFIX));
            graph.push_person(person);
        }

        for rel in snapshot.relationships {
            if graph.relationship_slots.contains_key(&rel.id) {
                return Err(GraphError::DuplicateIdentifier {
                    what: "relationship",
                    id: rel.id.to_string(),
                });
            }
            graph.check_connect(&rel.source, &rel.target, rel.kind)?;
            graph.next_relationship = graph
                .next_relationship
                .max(counter_of(rel.id.as_str(), RELATIONSHIP_PREFIX));
            graph.push_relationship(rel);
        }

        debug!(
            persons = graph.persons.len(),
            relationships = graph.relationships.len(),
            "restored family graph"
        );
        Ok(graph)
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.persons.clone(), self.relationships.clone())
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    #[must_use]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.person_slots.get(id).map(|&slot| &self.persons[slot])
    }

    #[must_use]
    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationship_slots
            .get(id)
            .map(|&slot| &self.relationships[slot])
    }

    #[must_use]
    pub fn contains(&self, id: &PersonId) -> bool {
        self.person_slots.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.persons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    fn incident_edges(&self, id: &PersonId) -> impl Iterator<Item = &Relationship> {
        self.incident
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|rel_id| self.relationship(rel_id))
    }

    /// Every edge touching `id`, annotated with the role of the other endpoint.
    ///
    /// Unknown persons have no relationships.
    #[must_use]
    pub fn relationships_of(&self, id: &PersonId) -> Vec<Connection> {
        self.incident_edges(id)
            .filter_map(|rel| {
                let other = rel.other_endpoint(id)?.clone();
                let role = rel.role_for(id)?;
                Some(Connection {
                    relationship: rel.clone(),
                    other,
                    role,
                })
            })
            .collect()
    }

    fn related_by(&self, id: &PersonId, role: Role) -> Vec<&PersonId> {
        self.incident_edges(id)
            .filter(|rel| rel.role_for(id) == Some(role))
            .filter_map(|rel| rel.other_endpoint(id))
            .collect()
    }

    #[must_use]
    pub fn parents_of(&self, id: &PersonId) -> Vec<&PersonId> {
        self.related_by(id, Role::Parent)
    }

    #[must_use]
    pub fn children_of(&self, id: &PersonId) -> Vec<&PersonId> {
        self.related_by(id, Role::Child)
    }

    #[must_use]
    pub fn spouses_of(&self, id: &PersonId) -> Vec<&PersonId> {
        self.related_by(id, Role::Spouse)
    }

    /// Every ancestor of `id`, nearest generation first, without repeats.
    #[must_use]
    pub fn ancestors_of(&self, id: &PersonId) -> Vec<&PersonId> {
        let mut seen: HashSet<&PersonId> = HashSet::new();
        let mut out = Vec::new();
        let mut frontier = self.parents_of(id);
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for parent in frontier {
                if seen.insert(parent) {
                    out.push(parent);
                    next.extend(self.parents_of(parent));
                }
            }
            frontier = next;
        }
        out
    }

    /// Persons that may be newly connected to `id` with `kind`.
    ///
    /// Always excludes `id` itself. For `Spouse`, excludes current spouses;
    /// for `ParentChild`, excludes anyone already connected to `id` in any
    /// way.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPerson`] if `id` is not in the graph.
    pub fn available_candidates(
        &self,
        id: &PersonId,
        kind: RelationshipKind,
    ) -> Result<Vec<&Person>, GraphError> {
        if !self.contains(id) {
            return Err(GraphError::UnknownPerson(id.clone()));
        }

        let excluded: HashSet<&PersonId> = match kind {
            RelationshipKind::Spouse => self.spouses_of(id).into_iter().collect(),
            RelationshipKind::ParentChild => self
                .incident_edges(id)
                .filter_map(|rel| rel.other_endpoint(id))
                .collect(),
        };

        Ok(self
            .persons
            .iter()
            .filter(|p| &p.id != id && !excluded.contains(&p.id))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert a new person with a fresh id and a placeholder position.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidPerson`] if the preferred name is empty.
    pub fn add_person(&mut self, data: Biography) -> Result<Person, GraphError> {
        validate_biography(&data)?;

        let person = Person {
            id: self.fresh_person_id(),
            position: Position::placeholder(self.persons.len()),
            data,
        };
        self.push_person(person.clone());
        debug!(person = %person.id, name = person.display_name(), "added person");
        Ok(person)
    }

    /// Replace a person's biographical payload. Id and position are kept.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPerson`] or [`GraphError::InvalidPerson`].
    pub fn update_person(&mut self, id: &PersonId, data: Biography) -> Result<Person, GraphError> {
        let slot = self.slot_of(id)?;
        validate_biography(&data)?;
        self.persons[slot].data = data;
        debug!(person = %id, "updated person");
        Ok(self.persons[slot].clone())
    }

    /// Move one person (manual drag). Relationships are untouched.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPerson`] if `id` is not in the graph, or
    /// [`GraphError::InvalidPosition`] for a NaN or infinite coordinate.
    pub fn set_position(&mut self, id: &PersonId, position: Position) -> Result<(), GraphError> {
        let slot = self.slot_of(id)?;
        validate_position(id, position)?;
        self.persons[slot].position = position;
        Ok(())
    }

    /// Apply a batch of positions, e.g. a layout result.
    ///
    /// All ids and coordinates are checked before any position is written.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPerson`] for the first id not in the graph, or
    /// [`GraphError::InvalidPosition`] for the first non-finite position.
    pub fn apply_positions<'a, I>(&mut self, positions: I) -> Result<usize, GraphError>
    where
        I: IntoIterator<Item = (&'a PersonId, Position)>,
    {
        let resolved = positions
            .into_iter()
            .map(|(id, pos)| {
                let slot = self.slot_of(id)?;
                validate_position(id, pos)?;
                Ok::<_, GraphError>((slot, pos))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for &(slot, pos) in &resolved {
            self.persons[slot].position = pos;
        }
        Ok(resolved.len())
    }

    /// Create a relationship after checking every structural invariant.
    ///
    /// Checks run in order: both endpoints exist, endpoints differ, no
    /// equivalent edge exists, and for `ParentChild` the target is not
    /// already an ancestor of the source.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPerson`], [`GraphError::SelfRelationship`],
    /// [`GraphError::DuplicateRelationship`] or [`GraphError::Cycle`].
    pub fn connect(
        &mut self,
        source: &PersonId,
        target: &PersonId,
        kind: RelationshipKind,
    ) -> Result<Relationship, GraphError> {
        self.check_connect(source, target, kind)?;

        let rel = Relationship {
            id: self.fresh_relationship_id(),
            source: source.clone(),
            target: target.clone(),
            kind,
        };
        self.push_relationship(rel.clone());
        debug!(relationship = %rel.id, %source, %target, %kind, "connected");
        Ok(rel)
    }

    /// Remove a relationship. Absent ids are a no-op.
    pub fn disconnect(&mut self, id: &RelationshipId) -> Option<Relationship> {
        let slot = *self.relationship_slots.get(id)?;
        let removed = self.relationships.remove(slot);
        self.reindex();
        debug!(relationship = %id, "disconnected");
        Some(removed)
    }

    /// Remove a person and every edge touching them. Absent ids are a no-op.
    pub fn remove_person(&mut self, id: &PersonId) -> Option<Person> {
        let slot = *self.person_slots.get(id)?;
        let removed = self.persons.remove(slot);
        let before = self.relationships.len();
        self.relationships.retain(|rel| !rel.touches(id));
        self.reindex();
        debug!(
            person = %id,
            cascaded = before - self.relationships.len(),
            "removed person"
        );
        Some(removed)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_connect(
        &self,
        source: &PersonId,
        target: &PersonId,
        kind: RelationshipKind,
    ) -> Result<(), GraphError> {
        for endpoint in [source, target] {
            if !self.contains(endpoint) {
                return Err(GraphError::UnknownPerson(endpoint.clone()));
            }
        }

        if source == target {
            return Err(GraphError::SelfRelationship {
                person: source.clone(),
                kind,
            });
        }

        if let Some(existing) = self
            .incident_edges(source)
            .find(|rel| rel.is_equivalent(source, target, kind))
        {
            return Err(GraphError::DuplicateRelationship {
                from: source.clone(),
                to: target.clone(),
                kind,
                existing: existing.id.clone(),
            });
        }

        if kind == RelationshipKind::ParentChild {
            if let Some(path) = ancestry::would_create_cycle(self, source, target) {
                return Err(GraphError::Cycle {
                    parent: source.clone(),
                    child: target.clone(),
                    path,
                });
            }
        }

        Ok(())
    }

    fn slot_of(&self, id: &PersonId) -> Result<usize, GraphError> {
        self.person_slots
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownPerson(id.clone()))
    }

    fn push_person(&mut self, person: Person) {
        self.person_slots
            .insert(person.id.clone(), self.persons.len());
        self.persons.push(person);
    }

    fn push_relationship(&mut self, rel: Relationship) {
        for endpoint in [&rel.source, &rel.target] {
            self.incident
                .entry(endpoint.clone())
                .or_default()
                .push(rel.id.clone());
        }
        self.relationship_slots
            .insert(rel.id.clone(), self.relationships.len());
        self.relationships.push(rel);
    }

    fn reindex(&mut self) {
        self.person_slots = self
            .persons
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.id.clone(), slot))
            .collect();
        self.relationship_slots = self
            .relationships
            .iter()
            .enumerate()
            .map(|(slot, r)| (r.id.clone(), slot))
            .collect();
        self.incident.clear();
        for rel in &self.relationships {
            for endpoint in [&rel.source, &rel.target] {
                self.incident
                    .entry(endpoint.clone())
                    .or_default()
                    .push(rel.id.clone());
            }
        }
    }

    fn fresh_person_id(&mut self) -> PersonId {
        loop {
            self.next_person = advance(self.next_person);
            let id = PersonId::new(format!("{PERSON_PREFIX}{}", self.next_person));
            if !self.person_slots.contains_key(&id) {
                return id;
            }
        }
    }

    fn fresh_relationship_id(&mut self) -> RelationshipId {
        loop {
            self.next_relationship = advance(self.next_relationship);
            let id = RelationshipId::new(format!("{RELATIONSHIP_PREFIX}{}", self.next_relationship));
            if !self.relationship_slots.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Lineage for FamilyGraph {
    fn children_of(&self, person: &PersonId) -> Vec<&PersonId> {
        Self::children_of(self, person)
    }
}

/// Enforce the only biographical invariant: a usable preferred name.
///
/// # Errors
///
/// [`GraphError::InvalidPerson`] if `goes_by` is empty or whitespace.
pub fn validate_biography(data: &Biography) -> Result<(), GraphError> {
    if data.has_display_name() {
        Ok(())
    } else {
        Err(GraphError::InvalidPerson {
            reason: "preferred display name (goesBy) is required",
        })
    }
}

/// Reject coordinates that cannot be stored.
fn validate_position(person: &PersonId, position: Position) -> Result<(), GraphError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(GraphError::InvalidPosition {
            person: person.clone(),
            x: position.x,
            y: position.y,
        })
    }
}

/// Next counter value. An exhausted counter wraps to 1 and the caller's
/// probe for a free id walks forward from there.
const fn advance(counter: u64) -> u64 {
    match counter.checked_add(1) {
        Some(next) => next,
        None => 1,
    }
}

/// Numeric suffix of a generated id (`p12` → 12), 0 for foreign ids.
fn counter_of(id: &str, prefix: &str) -> u64 {
    id.strip_prefix(prefix)
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}
